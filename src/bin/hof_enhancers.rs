use anyhow::anyhow;
use eframe::{egui, NativeOptions};
use hall_of_fame_enhancers::{about, app, config::DashboardConfig, init_tracing};
use std::env;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{}", about::version_cli_text());
        return Ok(());
    }
    init_tracing();
    let (config, _rest) = DashboardConfig::from_args(&args)?;

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(about::APP_TITLE)
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([480.0, 320.0]),

        ..Default::default()
    };

    eframe::run_native(
        about::APP_TITLE,
        options,
        Box::new(move |_cc| Ok(Box::new(app::DashboardApp::new(config)))),
    )
    .map_err(|e| anyhow!("Could not start the dashboard window: {e}"))
}
