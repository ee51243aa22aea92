pub const HOF_DISPLAY_VERSION: &str = env!("HOF_DISPLAY_VERSION");
pub const HOF_BUILD_N: &str = env!("HOF_BUILD_N");
pub const APP_TITLE: &str = "Hall of Fame Enhancers";

pub fn version_cli_text() -> String {
    format!(
        "{APP_TITLE} {HOF_DISPLAY_VERSION}\nBuild {HOF_BUILD_N}\nCurated enhancer accessibility dashboard"
    )
}
