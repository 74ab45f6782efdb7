use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tokio::runtime::Runtime;
use tracing::info;

mod config;
mod logging;
mod notes_app;

use config::Config;
use notes_app::{App, NotesRepository, SessionController};

fn main() -> Result<()> {
    color_eyre::install()?;
    let config = Config::parse();
    let api_url = config.api_url()?;
    let _log_guard = logging::init(&config.log_file())?;
    let runtime = Runtime::new().wrap_err("Failed to start async runtime")?;
    let repo = NotesRepository::new(&api_url);

    if config.check {
        return check(&runtime, &repo);
    }

    info!(api_url = %api_url, "starting");
    let mut terminal = ratatui::init();
    let mut app = App::new(
        SessionController::new(repo),
        config.accounts(),
        runtime.handle().clone(),
    );
    let app_result = app.run(&mut terminal);
    ratatui::restore();
    app_result?;
    Ok(())
}

fn check(runtime: &Runtime, repo: &NotesRepository) -> Result<()> {
    let status = runtime
        .block_on(repo.health())
        .wrap_err_with(|| format!("{} is not reachable", repo.base_url()))?;
    println!("{} is reachable (status: {status})", repo.base_url());
    Ok(())
}
