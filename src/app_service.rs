use crate::app_state::AppEvent;
use crate::commands::{export, quote, AppCommand, QuoteContext};
use crate::compare::store::restore;
use crate::compare::ComparisonStore;
use crate::remote::{PdfRenderer, QuoteSource, RequestTracker};
use crate::storage::StoreError;
use crate::storage::repository::{QuoteRepository, QuoteSummary, SessionRepository, KEY_QUOTE_CODE};
use chrono::{Local, TimeZone};
use log::{info, warn};
use sea_orm::DatabaseConnection;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

const HISTORY_LIMIT: u64 = 20;

/// Dependencias del actor de fondo. Los clientes remotos son opcionales:
/// sin URL configurada la app arranca igual y el comando informa el error.
#[derive(Clone)]
pub struct AppServices {
    pub db: Arc<DatabaseConnection>,
    pub store: Arc<dyn ComparisonStore>,
    pub quote: Option<Arc<dyn QuoteSource>>,
    pub pdf: Option<Arc<dyn PdfRenderer>>,
    pub tracker: RequestTracker,
    pub pdf_output_dir: PathBuf,
}

impl AppServices {
    fn quote_context(&self) -> Option<QuoteContext> {
        self.quote.as_ref().map(|source| QuoteContext {
            db: self.db.clone(),
            source: source.clone(),
            store: self.store.clone(),
            tracker: self.tracker.clone(),
        })
    }
}

/// Restaura repositorio, selección y último código al arrancar
pub async fn restore_session(services: &AppServices, tx: &mpsc::UnboundedSender<AppEvent>) {
    let comparison = restore(services.store.as_ref()).await;
    let code = match SessionRepository::get_json::<String>(&services.db, KEY_QUOTE_CODE).await {
        Ok(code) => code,
        Err(e) => {
            warn!("restore_session: cannot read quote code: {}", e);
            None
        }
    };
    let _ = tx.send(AppEvent::Restored { comparison, code });
}

pub async fn refresh_history(db: &Arc<DatabaseConnection>, tx: &mpsc::UnboundedSender<AppEvent>) {
    match QuoteRepository::list_recent(db, HISTORY_LIMIT).await {
        Ok(rows) => {
            let _ = tx.send(AppEvent::History(rows));
        }
        Err(e) => {
            let _ = tx.send(AppEvent::Error(format!("no se pudo leer el historial: {}", e)));
        }
    }
}

/// Descarta la sesión: invalida las cotizaciones en curso y borra
/// selección, repositorio, formulario y código guardados.
pub async fn new_session(services: &AppServices) -> Result<u64, StoreError> {
    services.tracker.begin();
    let _commit = services.tracker.commit().await;
    services.store.clear().await?;
    let removed = SessionRepository::clear_all(&services.db).await?;
    info!("session reset, {} entries removed", removed);
    Ok(removed)
}

fn describe_quote(summary: &QuoteSummary) -> String {
    let when = Local
        .timestamp_opt(summary.created_at, 0)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    let who = match &summary.form {
        Some(form) => format!("{:?}, {} años, {}", form.group, form.age, form.contact.email),
        None => "formulario ilegible".to_string(),
    };
    format!(
        "cotización {} del {}: {} planes ({})",
        summary.code, when, summary.plan_count, who
    )
}

/// Un comando del actor. Las cotizaciones y el PDF corren en su propia
/// tarea para que dos pedidos puedan solaparse.
pub async fn handle_command(
    services: &AppServices,
    cmd: AppCommand,
    tx: &mpsc::UnboundedSender<AppEvent>,
) {
    match cmd {
        AppCommand::QuoteFile { path } => {
            let Some(ctx) = services.quote_context() else {
                let _ = tx.send(AppEvent::Error(
                    "no se puede cotizar: falta QUOTE_API_URL".to_string(),
                ));
                return;
            };
            match quote::read_form(&path).await {
                Ok(form) => {
                    let txc = tx.clone();
                    tokio::spawn(async move { quote::submit(&ctx, form, &txc).await });
                }
                Err(e) => {
                    let _ = tx.send(AppEvent::Error(format!("{:#}", e)));
                }
            }
        }
        AppCommand::QuoteRecover => {
            let Some(ctx) = services.quote_context() else {
                let _ = tx.send(AppEvent::Error(
                    "no se puede cotizar: falta QUOTE_API_URL".to_string(),
                ));
                return;
            };
            match quote::last_form(&services.db).await {
                Ok(form) => {
                    let _ = tx.send(AppEvent::Message("recuperando última cotización".to_string()));
                    let txc = tx.clone();
                    tokio::spawn(async move { quote::submit(&ctx, form, &txc).await });
                }
                Err(e) => {
                    let _ = tx.send(AppEvent::Error(format!("{:#}", e)));
                }
            }
        }
        AppCommand::PersistSelection(ids) => {
            if let Err(e) = services.store.save(&ids).await {
                let _ = tx.send(AppEvent::Error(format!("no se pudo guardar la selección: {}", e)));
            }
        }
        AppCommand::RenderPdf { html, path } => {
            let Some(pdf) = services.pdf.clone() else {
                let _ = tx.send(AppEvent::Error(
                    "no se puede exportar: falta PDF_API_URL".to_string(),
                ));
                return;
            };
            let path = export::output_path(&services.pdf_output_dir, path);
            let txc = tx.clone();
            tokio::spawn(async move { export::run(pdf.as_ref(), html, path, &txc).await });
        }
        AppCommand::History => refresh_history(&services.db, tx).await,
        AppCommand::HistoryShow(code) => match QuoteRepository::find(&services.db, &code).await {
            Ok(Some(summary)) => {
                let _ = tx.send(AppEvent::Message(describe_quote(&summary)));
            }
            Ok(None) => {
                let _ = tx.send(AppEvent::Error(format!("no existe la cotización {}", code)));
            }
            Err(e) => {
                let _ = tx.send(AppEvent::Error(format!("no se pudo leer el historial: {}", e)));
            }
        },
        AppCommand::SessionNew => match new_session(services).await {
            Ok(_) => {
                let _ = tx.send(AppEvent::Message("sesión nueva".to_string()));
                refresh_history(&services.db, tx).await;
            }
            Err(e) => {
                let _ = tx.send(AppEvent::Error(format!("no se pudo limpiar la sesión: {}", e)));
            }
        },
        AppCommand::Unknown(msg) => {
            let _ = tx.send(AppEvent::Error(msg));
        }
        other => {
            warn!("handle_command: {:?} is handled by the UI", other);
        }
    }
}
