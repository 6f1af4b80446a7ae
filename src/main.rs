mod app_service;
mod app_state;
mod catalog;
mod commands;
mod compare;
mod config;
mod remote;
mod storage;
mod ui;

use chrono::Local;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::app_service::{handle_command, restore_session, AppServices};
use crate::app_state::{App, AppEvent};
use crate::commands::AppCommand;
use crate::compare::{ComparisonStore, SessionComparisonStore};
use crate::config::AppConfig;
use crate::remote::{PdfClient, PdfRenderer, QuoteClient, QuoteSource, RequestTracker};
use crate::ui::draw;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> io::Result<()> {
    let ts = Local::now().format("%Y%m%d-%H%M%S").to_string();
    let log_dir = std::path::PathBuf::from("logs");
    std::fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join(format!("app-{}.log", ts));
    let log_file = std::fs::File::create(log_path)?;
    // la terminal es de la TUI: el log va a archivo
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter_level(log::LevelFilter::Warn)
        .filter_module("prepaga_compare", log::LevelFilter::Info)
        .filter_module("sqlx", log::LevelFilter::Error)
        .filter_module("sea_orm", log::LevelFilter::Error)
        .init();

    let mut startup_info = Vec::new();
    match dotenv::dotenv() {
        Ok(path) => startup_info.push(format!("✓ .env cargado: {}", path.display())),
        Err(_) => startup_info.push("⚠ sin .env, se usan las variables del entorno".to_string()),
    }

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("configuración inválida: {}", e);
            return Err(io::Error::new(io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    let db = match storage::establish_connection(&config.database_url).await {
        Ok(connection) => {
            startup_info.push("✓ base de datos lista".to_string());
            Arc::new(connection)
        }
        Err(e) => {
            eprintln!("no se pudo abrir la base: {}", e);
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("no se pudo abrir la base: {}", e),
            ));
        }
    };

    let quote: Option<Arc<dyn QuoteSource>> = match QuoteClient::from_config(&config) {
        Ok(client) => {
            startup_info.push(format!("✓ cotizador: {}", client));
            Some(Arc::new(client))
        }
        Err(e) => {
            startup_info.push(format!("⚠ cotizador deshabilitado: {}", e));
            None
        }
    };
    let pdf: Option<Arc<dyn PdfRenderer>> = match PdfClient::from_config(&config) {
        Ok(client) => {
            startup_info.push(format!("✓ servicio de PDF: {}", client));
            Some(Arc::new(client))
        }
        Err(e) => {
            startup_info.push(format!("⚠ exportación deshabilitada: {}", e));
            None
        }
    };

    let tracker = RequestTracker::new();
    let store: Arc<dyn ComparisonStore> = Arc::new(SessionComparisonStore::new(db.clone()));
    let services = AppServices {
        db,
        store,
        quote,
        pdf,
        tracker: tracker.clone(),
        pdf_output_dir: config.pdf_output_dir.clone(),
    };

    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<AppCommand>();
    let (evt_tx, evt_rx) = mpsc::unbounded_channel::<AppEvent>();

    // actor de fondo: red y persistencia
    tokio::spawn(async move {
        restore_session(&services, &evt_tx).await;
        app_service::refresh_history(&services.db, &evt_tx).await;

        while let Some(cmd) = cmd_rx.recv().await {
            handle_command(&services, cmd, &evt_tx).await;
        }
    });

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(startup_info, tracker, cmd_tx, evt_rx);
    let res = match app.evt_rx.take() {
        Some(rx) => run_app_loop(&mut terminal, &mut app, rx).await,
        None => Ok(()),
    };

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = &res {
        log::error!("ui loop ended with error: {}", e);
    }
    res
}

async fn run_app_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut evt_rx: mpsc::UnboundedReceiver<AppEvent>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, app))?;

        while let Ok(event) = evt_rx.try_recv() {
            app.handle_event(event);
        }

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key_event(key.code) {
                    return Ok(());
                }
            }
        }
    }
}
