mod advisors;
mod app;
mod cli;
mod config;
mod datasources;
mod db;
mod error;
mod logic;
mod models;
mod ui;

use anyhow::{bail, Context};
use app::{App, CropSelection, Screen};
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use datasources::{Mailer, OpenWeatherMapClient, RemoteAdvisor};
use db::Database;
use logic::{DataSyncService, ReportJob, RulesEngine};
use models::{AdvisoryReport, CropRegistry};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use ui::screens::{AdvisoryScreen, CropScreen, DashboardScreen, ForecastScreen, HistoryScreen};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init) => {
            init_logging(cli.verbose, None)?;
            Config::setup_interactive().context("Setup failed")?;
            Ok(())
        }
        Some(Commands::Check) => {
            init_logging(cli.verbose, None)?;
            let config = load_config(cli.config.as_ref())?;
            run_check(&config, cli.data_dir.as_ref()).await
        }
        Some(Commands::Report { ref note, no_email }) => {
            init_logging(cli.verbose, None)?;
            let config = load_config(cli.config.as_ref())?;
            run_report(
                &config,
                cli.data_dir.as_ref(),
                note.as_deref().unwrap_or(""),
                no_email,
            )
            .await
        }
        None => {
            // Logs go to a file so they don't corrupt the screen
            let log_path = Config::log_path(cli.data_dir.as_ref())?;
            init_logging(cli.verbose, Some(log_path))?;

            let config = if cli.config.is_none() && !Config::exists(None) {
                Config::setup_interactive().context("Setup failed")?.0
            } else {
                load_config(cli.config.as_ref())?
            };
            run_dashboard(&config, cli.data_dir.as_ref()).await
        }
    }
}

/// `warn` by default, `-v` debug, `-vv` trace; `RUST_LOG` wins when set
fn init_logging(verbose: u8, log_file: Option<PathBuf>) -> anyhow::Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Cannot open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let config = Config::load(path).context("Configuration error")?;
    let registry = CropRegistry::builtin()?;
    config
        .validate(&registry)
        .context("Invalid configuration, run `cropops init` to regenerate it")?;
    Ok(config)
}

fn open_database(data_dir: Option<&PathBuf>) -> anyhow::Result<Database> {
    let db_path = Config::db_path(data_dir)?;
    Database::open(&db_path).with_context(|| format!("Cannot open database {}", db_path.display()))
}

async fn run_report(
    config: &Config,
    data_dir: Option<&PathBuf>,
    note: &str,
    no_email: bool,
) -> anyhow::Result<()> {
    let db = open_database(data_dir)?;
    let service = DataSyncService::new(config, db)?;

    let mailer = match config.smtp {
        Some(ref smtp) if !no_email => Some(Mailer::new(smtp.clone()).context("SMTP settings")?),
        _ => None,
    };
    let wants_mail = mailer.is_some();

    let mut job = ReportJob::new(service, mailer);
    let outcome = job.run(note).await.context("Failed to build the advisory")?;

    println!("{}", outcome.text);

    if wants_mail && !outcome.mailed {
        eprintln!("Warning: report was not mailed, see the log for details");
    }
    if !outcome.logged {
        eprintln!("Warning: run log was not updated, see the log for details");
    }
    Ok(())
}

async fn run_check(config: &Config, data_dir: Option<&PathBuf>) -> anyhow::Result<()> {
    let mut failures = 0;

    println!("Configuration: OK");
    println!(
        "  Farm: {} ({}, reference date {})",
        config.farm.name, config.farm.crop, config.farm.reference_date
    );
    for line in catalogue_lines(&CropRegistry::builtin()?, &RulesEngine::new()) {
        println!("{}", line);
    }

    match open_database(data_dir) {
        Ok(db) => println!("Database: OK ({})", db.path().display()),
        Err(e) => {
            println!("Database: FAILED ({:#})", e);
            failures += 1;
        }
    }

    match config.openweathermap {
        Some(ref owm) if owm.enabled => {
            let result = match OpenWeatherMapClient::new(owm.clone()) {
                Ok(client) => client.test_connection().await,
                Err(e) => Err(e),
            };
            failures += report_probe("OpenWeatherMap", result);
        }
        _ => println!("OpenWeatherMap: not configured (advisories will lack weather)"),
    }

    match config.advisor {
        Some(ref advisor) if advisor.enabled && advisor.has_credentials() => {
            let result = match RemoteAdvisor::new(advisor.clone()) {
                Ok(client) => client.test_connection().await,
                Err(e) => Err(e),
            };
            failures += report_probe("Advisor", result);
        }
        _ => println!("Advisor: offline keyword advisor"),
    }

    match config.smtp {
        Some(ref smtp) => {
            let result = match Mailer::new(smtp.clone()) {
                Ok(mailer) => mailer.test_connection().await,
                Err(e) => Err(e),
            };
            failures += report_probe("SMTP", result);
        }
        None => println!("SMTP: not configured (reports are printed only)"),
    }

    if failures > 0 {
        bail!("{} check(s) failed", failures);
    }
    Ok(())
}

/// Built-in crops and the rules every advisory runs
fn catalogue_lines(registry: &CropRegistry, engine: &RulesEngine) -> Vec<String> {
    let mut lines = vec!["Crops:".to_string()];
    for id in registry.ids() {
        if let Ok(crop) = registry.get(id) {
            lines.push(format!(
                "  {} ({} cultivars, {} stages)",
                id,
                crop.cultivars.len(),
                crop.stages.len()
            ));
        }
    }
    lines.push("Rules:".to_string());
    for (id, name) in engine.list_rules() {
        lines.push(format!("  {} - {}", id, name));
    }
    lines
}

fn report_probe(name: &str, result: error::Result<bool>) -> u32 {
    match result {
        Ok(true) => {
            println!("{}: OK", name);
            0
        }
        Ok(false) => {
            println!("{}: FAILED (service rejected the request)", name);
            1
        }
        Err(e) => {
            println!("{}: FAILED ({})", name, e);
            1
        }
    }
}

async fn run_dashboard(config: &Config, data_dir: Option<&PathBuf>) -> anyhow::Result<()> {
    let db = open_database(data_dir)?;
    let mut service = DataSyncService::new(config, db.clone())?;
    let mut app = App::new(db, &service)?;
    app.request_refresh();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &mut service).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    service: &mut DataSyncService,
) -> anyhow::Result<()> {
    loop {
        terminal.draw(|f| draw(f, app))?;

        // Handle input with timeout so queued work runs promptly
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                let editing = app.advisory_state.editing;
                match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        app.quit();
                    }
                    KeyCode::Char('q') if !editing => {
                        app.quit();
                    }
                    KeyCode::Esc if !editing => {
                        app.switch_screen(Screen::Dashboard);
                    }
                    KeyCode::Char(c) if !editing => match Screen::from_key(c) {
                        Some(screen) => app.switch_screen(screen),
                        None => handle_screen_input(app, key.code),
                    },
                    _ => handle_screen_input(app, key.code),
                }
            }
        }

        if let Some(selection) = app.pending_selection.take() {
            apply_selection(app, service, selection);
        }

        if app.needs_refresh {
            app.needs_refresh = false;
            app.needs_reconsult = false;
            app.refreshing = true;
            let note = app.note.clone();
            match service.refresh(&note).await.cloned() {
                Ok(report) => {
                    let status = refresh_status(&report, service.has_forecast_source());
                    app.update_report(report);
                    app.set_status(&status);
                }
                Err(e) => app.set_status(&format!("Refresh failed: {}", e)),
            }
            app.refreshing = false;
        }

        if app.needs_reconsult {
            app.needs_reconsult = false;
            let note = app.note.clone();
            match service.reconsult(&note).await.cloned() {
                Ok(report) => {
                    let status = format!("Advisory updated ({})", report.consultation.source);
                    app.update_report(report);
                    app.set_status(&status);
                }
                Err(e) => app.set_status(&format!("Consultation failed: {}", e)),
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn draw(f: &mut ratatui::Frame, app: &App) {
    let area = f.area();
    let report = app.report.as_ref();

    match app.screen {
        Screen::Dashboard => {
            let screen = DashboardScreen::new(&app.farm_name, report)
                .with_status(app.status_message.as_deref());
            f.render_widget(screen, area);
        }
        Screen::Forecast => {
            let screen = ForecastScreen::new(report.and_then(|r| r.weather.as_ref()))
                .with_selection(app.forecast_state.selected_index);
            f.render_widget(screen, area);
        }
        Screen::Advisory => {
            let screen = AdvisoryScreen::new(report, &app.note)
                .with_selection(app.advisory_state.selected_index)
                .editing(app.advisory_state.editing, &app.advisory_state.edit_buffer);
            f.render_widget(screen, area);
        }
        Screen::Crop => {
            let screen = CropScreen::new(&app.crop, &app.cultivar)
                .with_stages(
                    app.reported_stage.as_deref(),
                    report.map(|r| r.expected_stage.as_str()),
                )
                .with_selection(
                    app.crop_state.pane,
                    app.crop_state.stage_index,
                    app.crop_state.cultivar_index,
                );
            f.render_widget(screen, area);
        }
        Screen::History => {
            let screen = HistoryScreen::new(&app.run_logs)
                .with_selection(app.history_state.selected_index);
            f.render_widget(screen, area);
        }
    }
}

fn refresh_status(report: &AdvisoryReport, has_forecast_source: bool) -> String {
    match report.weather {
        Some(_) => format!("Updated: {}", report.headline()),
        None if has_forecast_source => "Forecast unavailable, see log for details".to_string(),
        None => "Forecast unavailable: OpenWeatherMap not configured".to_string(),
    }
}

fn apply_selection(app: &mut App, service: &mut DataSyncService, selection: CropSelection) {
    let result = match selection {
        CropSelection::Cultivar(ref name) => service.set_cultivar(name),
        CropSelection::Stage(ref name) => service.set_stage(name.as_deref()),
    };

    match result {
        Ok(()) => {
            app.sync_selection(service);
            match selection {
                // The crop coefficient changes ETc, so the forecast is resampled
                CropSelection::Cultivar(_) => app.request_refresh(),
                CropSelection::Stage(_) => app.request_reconsult(),
            }
        }
        Err(e) => app.set_status(&format!("Selection failed: {}", e)),
    }
}

fn handle_screen_input(app: &mut App, code: KeyCode) {
    match app.screen {
        Screen::Dashboard => handle_dashboard_input(app, code),
        Screen::Forecast => handle_forecast_input(app, code),
        Screen::Advisory => handle_advisory_input(app, code),
        Screen::Crop => handle_crop_input(app, code),
        Screen::History => handle_history_input(app, code),
    }
}

fn handle_dashboard_input(app: &mut App, code: KeyCode) {
    if let KeyCode::Char('r') = code {
        app.request_refresh();
    }
}

fn handle_forecast_input(app: &mut App, code: KeyCode) {
    let count = app.forecast_days();
    match code {
        KeyCode::Up => app.forecast_state.prev(),
        KeyCode::Down => app.forecast_state.next(count),
        KeyCode::Char('r') => app.request_refresh(),
        _ => {}
    }
}

fn handle_advisory_input(app: &mut App, code: KeyCode) {
    if app.advisory_state.editing {
        match code {
            KeyCode::Esc => app.advisory_state.cancel_editing(),
            KeyCode::Enter => {
                let note = app.advisory_state.finish_editing();
                if let Err(e) = app.save_note(note) {
                    app.set_status(&format!("Failed to save note: {}", e));
                }
            }
            KeyCode::Backspace => {
                app.advisory_state.edit_buffer.pop();
            }
            KeyCode::Char(c) => app.advisory_state.edit_buffer.push(c),
            _ => {}
        }
        return;
    }

    let count = app.active_recommendations().len();
    match code {
        KeyCode::Up => app.advisory_state.prev(),
        KeyCode::Down => app.advisory_state.next(count),
        KeyCode::Enter => app.acknowledge_selected(),
        KeyCode::Char('n') => {
            let note = app.note.clone();
            app.advisory_state.start_editing(&note);
        }
        KeyCode::Char('c') => app.request_reconsult(),
        KeyCode::Char('r') => app.request_refresh(),
        _ => {}
    }
}

fn handle_crop_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Up => app.crop_state.prev(),
        KeyCode::Down => app.crop_state.next(&app.crop),
        KeyCode::Tab => app.crop_state.toggle_pane(),
        KeyCode::Enter => app.select_highlighted(),
        KeyCode::Char('a') => app.clear_reported_stage(),
        _ => {}
    }
}

fn handle_history_input(app: &mut App, code: KeyCode) {
    let count = app.run_logs.len();
    match code {
        KeyCode::Up => app.history_state.prev(),
        KeyCode::Down => app.history_state.next(count),
        KeyCode::Char('l') => match app.reload_history() {
            Ok(()) => app.set_status("Run log reloaded"),
            Err(e) => app.set_status(&format!("Failed to load run log: {}", e)),
        },
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_lists_crops_and_rules() {
        let lines = catalogue_lines(&CropRegistry::builtin().unwrap(), &RulesEngine::new());
        assert_eq!(lines[0], "Crops:");
        assert!(lines[1].starts_with("  Grape ("));
        let rules_at = lines.iter().position(|l| l == "Rules:").unwrap();
        assert_eq!(rules_at, 5);
        assert!(lines[rules_at + 1].starts_with("  transpiration - "));
        assert_eq!(lines.len(), rules_at + 7);
    }
}
