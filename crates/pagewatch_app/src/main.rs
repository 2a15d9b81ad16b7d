use std::path::PathBuf;

mod platform;

/// `pagewatch [SETTINGS_FILE]`
fn main() -> anyhow::Result<()> {
    let settings_path = std::env::args_os().nth(1).map(PathBuf::from);
    platform::run_app(settings_path)
}
