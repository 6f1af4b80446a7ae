use crate::app_state::AppEvent;
use crate::catalog::model::QuoteRequest;
use crate::compare::ComparisonStore;
use crate::remote::{QuoteSource, RequestTracker};
use crate::storage::repository::{QuoteRepository, SessionRepository, KEY_QUOTE_CODE, KEY_QUOTE_FORM};
use anyhow::{anyhow, Context};
use log::{error, info};
use sea_orm::DatabaseConnection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Lo que necesita una cotización para correr en segundo plano
#[derive(Clone)]
pub struct QuoteContext {
    pub db: Arc<DatabaseConnection>,
    pub source: Arc<dyn QuoteSource>,
    pub store: Arc<dyn ComparisonStore>,
    pub tracker: RequestTracker,
}

pub async fn read_form(path: &Path) -> anyhow::Result<QuoteRequest> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("no se pudo leer {}", path.display()))?;
    let form: QuoteRequest = serde_json::from_str(&raw)
        .with_context(|| format!("formulario inválido en {}", path.display()))?;
    Ok(form)
}

/// Último formulario enviado, para "recuperar cotización"
pub async fn last_form(db: &DatabaseConnection) -> anyhow::Result<QuoteRequest> {
    SessionRepository::get_json::<QuoteRequest>(db, KEY_QUOTE_FORM)
        .await?
        .ok_or_else(|| anyhow!("no hay una cotización guardada para recuperar"))
}

/// Envía el formulario y publica los planes como `AppEvent::Plans`.
///
/// Si mientras tanto se pidió otra cotización, la respuesta se descarta:
/// sólo la última generación reemplaza el repositorio.
pub async fn submit(ctx: &QuoteContext, form: QuoteRequest, evt_tx: &mpsc::UnboundedSender<AppEvent>) {
    if let Err(msg) = form.validate() {
        let _ = evt_tx.send(AppEvent::Error(format!("formulario inválido: {}", msg)));
        return;
    }

    let generation = ctx.tracker.begin();
    let _ = evt_tx.send(AppEvent::Log(format!("cotizando (pedido #{})...", generation)));

    match run(ctx, &form, generation).await {
        Ok(Some(event)) => {
            let _ = evt_tx.send(event);
        }
        Ok(None) => {
            info!("quote #{} superseded, response dropped", generation);
        }
        Err(e) => {
            error!("quote #{} failed: {:#}", generation, e);
            let _ = evt_tx.send(AppEvent::Error(format!("✗ cotización fallida: {:#}", e)));
        }
    }
}

async fn run(
    ctx: &QuoteContext,
    form: &QuoteRequest,
    generation: u64,
) -> anyhow::Result<Option<AppEvent>> {
    // el formulario se guarda antes de enviar: si falla, se puede recuperar
    SessionRepository::set_json(&ctx.db, KEY_QUOTE_FORM, form).await?;

    let outcome = ctx.source.submit(form).await?;

    // una respuesta vieja no escribe nada, aunque otra esté guardando
    let _commit = ctx.tracker.commit().await;
    if !ctx.tracker.is_current(generation) {
        return Ok(None);
    }
    let code = QuoteRepository::record(&ctx.db, form, outcome.plans.len()).await?;
    if !ctx.tracker.is_current(generation) {
        return Ok(None);
    }
    SessionRepository::set_json(&ctx.db, KEY_QUOTE_CODE, &code).await?;
    if !ctx.tracker.is_current(generation) {
        return Ok(None);
    }
    ctx.store.save_plans(&outcome.plans).await?;
    if !ctx.tracker.is_current(generation) {
        return Ok(None);
    }
    info!(
        "quote #{} stored as {} with {} plans",
        generation,
        code,
        outcome.plans.len()
    );

    Ok(Some(AppEvent::Plans {
        generation,
        plans: outcome.plans,
        code: Some(code),
        message: outcome.message,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::{Contacto, GrupoFamiliar, Plan};
    use crate::compare::MemoryComparisonStore;
    use crate::remote::{QuoteOutcome, RemoteError};
    use crate::storage::{establish_connection, StoreError};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Responde en orden, cada respuesta con su demora
    struct ScriptedSource {
        replies: Mutex<VecDeque<(Duration, Result<Vec<Plan>, RemoteError>)>>,
    }

    impl ScriptedSource {
        fn new(replies: Vec<(u64, Result<Vec<Plan>, RemoteError>)>) -> Self {
            Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .map(|(ms, r)| (Duration::from_millis(ms), r))
                        .collect(),
                ),
            }
        }
    }

    #[async_trait]
    impl QuoteSource for ScriptedSource {
        async fn submit(&self, _req: &QuoteRequest) -> Result<QuoteOutcome, RemoteError> {
            let next = self.replies.lock().unwrap().pop_front();
            let (delay, reply) = next.expect("unexpected submit");
            tokio::time::sleep(delay).await;
            reply.map(|plans| QuoteOutcome { plans, message: None })
        }
    }

    /// La primera escritura del repositorio tarda; las siguientes no
    #[derive(Default)]
    struct SlowStore {
        inner: MemoryComparisonStore,
        waited: AtomicBool,
    }

    #[async_trait]
    impl ComparisonStore for SlowStore {
        async fn load(&self) -> Result<Option<Vec<String>>, StoreError> {
            self.inner.load().await
        }
        async fn save(&self, ids: &[String]) -> Result<(), StoreError> {
            self.inner.save(ids).await
        }
        async fn load_plans(&self) -> Result<Option<Vec<Plan>>, StoreError> {
            self.inner.load_plans().await
        }
        async fn save_plans(&self, plans: &[Plan]) -> Result<(), StoreError> {
            if !self.waited.swap(true, Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(150)).await;
            }
            self.inner.save_plans(plans).await
        }
        async fn clear(&self) -> Result<(), StoreError> {
            self.inner.clear().await
        }
    }

    fn form() -> QuoteRequest {
        QuoteRequest {
            group: GrupoFamiliar::Individual,
            age: 40,
            partner_age: None,
            children: Vec::new(),
            income: None,
            contact: Contacto {
                name: "Lucía".to_string(),
                email: "lucia@example.com".to_string(),
                phone: String::new(),
            },
            region: None,
        }
    }

    async fn context(source: ScriptedSource) -> QuoteContext {
        QuoteContext {
            db: Arc::new(establish_connection("sqlite::memory:").await.unwrap()),
            source: Arc::new(source),
            store: Arc::new(MemoryComparisonStore::default()),
            tracker: RequestTracker::new(),
        }
    }

    #[tokio::test]
    async fn successful_quote_is_recorded_and_recoverable() {
        let ctx = context(ScriptedSource::new(vec![(
            0,
            Ok(vec![Plan::new("A", "OSDE", 1000.0, 4.5)]),
        )]))
        .await;
        let (tx, mut rx) = mpsc::unbounded_channel();

        submit(&ctx, form(), &tx).await;
        let _log = rx.recv().await.unwrap();
        match rx.recv().await.unwrap() {
            AppEvent::Plans { plans, code, .. } => {
                assert_eq!(plans.len(), 1);
                let code = code.unwrap();
                assert!(QuoteRepository::find(&ctx.db, &code).await.unwrap().is_some());
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(last_form(&ctx.db).await.unwrap(), form());
        assert_eq!(ctx.store.load_plans().await.unwrap().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stale_response_is_dropped() {
        let ctx = context(ScriptedSource::new(vec![
            (150, Ok(vec![Plan::new("OLD", "Galeno", 1.0, 1.0)])),
            (10, Ok(vec![Plan::new("NEW", "OSDE", 2.0, 2.0)])),
        ]))
        .await;
        let (tx, mut rx) = mpsc::unbounded_channel();

        let (c1, t1) = (ctx.clone(), tx.clone());
        let slow = tokio::spawn(async move { submit(&c1, form(), &t1).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        submit(&ctx, form(), &tx).await;
        slow.await.unwrap();
        drop(tx);

        let mut delivered = Vec::new();
        while let Some(evt) = rx.recv().await {
            if let AppEvent::Plans { plans, .. } = evt {
                delivered.push(plans[0].id.clone());
            }
        }
        assert_eq!(delivered, vec!["NEW".to_string()]);
        let stored = ctx.store.load_plans().await.unwrap().unwrap();
        assert_eq!(stored[0].id, "NEW");
    }

    #[tokio::test]
    async fn failures_leave_state_alone() {
        let ctx = context(ScriptedSource::new(vec![(0, Err(RemoteError::Status(502)))])).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        submit(&ctx, form(), &tx).await;
        let _log = rx.recv().await.unwrap();
        assert!(matches!(rx.recv().await.unwrap(), AppEvent::Error(_)));
        assert!(ctx.store.load_plans().await.unwrap().is_none());
        // el formulario igual queda para recuperar
        assert!(last_form(&ctx.db).await.is_ok());
    }

    #[tokio::test]
    async fn invalid_form_never_reaches_the_source() {
        let ctx = context(ScriptedSource::new(Vec::new())).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut bad = form();
        bad.age = 0;
        submit(&ctx, bad, &tx).await;
        assert!(matches!(rx.recv().await.unwrap(), AppEvent::Error(_)));
        assert!(last_form(&ctx.db).await.is_err());
    }

    #[tokio::test]
    async fn newer_quote_wins_while_older_one_is_saving() {
        let mut ctx = context(ScriptedSource::new(vec![
            (0, Ok(vec![Plan::new("OLD", "Galeno", 1.0, 1.0)])),
            (0, Ok(vec![Plan::new("NEW", "OSDE", 2.0, 2.0)])),
        ]))
        .await;
        ctx.store = Arc::new(SlowStore::default());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let (c1, t1) = (ctx.clone(), tx.clone());
        let older = tokio::spawn(async move { submit(&c1, form(), &t1).await });
        // la vieja ya pasó el chequeo y está guardando
        tokio::time::sleep(Duration::from_millis(40)).await;
        submit(&ctx, form(), &tx).await;
        older.await.unwrap();
        drop(tx);

        let mut delivered = Vec::new();
        let mut codes = Vec::new();
        while let Some(evt) = rx.recv().await {
            if let AppEvent::Plans { plans, code, .. } = evt {
                delivered.push(plans[0].id.clone());
                codes.extend(code);
            }
        }
        assert_eq!(delivered, vec!["NEW".to_string()]);
        let stored = ctx.store.load_plans().await.unwrap().unwrap();
        assert_eq!(stored[0].id, "NEW");
        let saved_code: Option<String> =
            SessionRepository::get_json(&ctx.db, KEY_QUOTE_CODE).await.unwrap();
        assert_eq!(saved_code, codes.first().cloned());
    }
}
