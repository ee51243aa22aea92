use std::time::{SystemTime, UNIX_EPOCH};

fn emit_build_version() {
    let n = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    println!("cargo:rustc-env=HOF_BUILD_N={n}");
    println!(
        "cargo:rustc-env=HOF_DISPLAY_VERSION={}",
        std::env::var("CARGO_PKG_VERSION").unwrap_or_default()
    );
}

fn main() {
    emit_build_version();
}
