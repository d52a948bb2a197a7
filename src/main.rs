mod commands;
mod config;
mod console;

use std::path::PathBuf;

use console::Console;

pub(crate) const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let app_config = config::AppConfig::load_or_create();
    let session_file = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| app_config.session_file.clone());
    if let Some(path) = &session_file {
        log::info!("using session file {}", path.display());
    }

    let workspace = console::load_workspace(&app_config, session_file.as_deref())?;
    let driver = Console::new(&app_config, workspace, session_file);
    let lines = console::spawn_stdin_reader();

    smol::block_on(console::run(driver, lines))
}
