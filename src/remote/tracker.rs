use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Contador de generación de pedidos de cotización.
///
/// Cada pedido toma una generación nueva con `begin`; cuando llega la
/// respuesta sólo se aplica si sigue siendo la última pedida. Así dos
/// recuperaciones seguidas no dependen del orden en que resuelven.
///
/// La escritura de una respuesta se hace con `commit` tomado: dos
/// respuestas nunca persisten intercaladas.
#[derive(Clone, Debug, Default)]
pub struct RequestTracker {
    latest: Arc<AtomicU64>,
    commit: Arc<Mutex<()>>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.current()
    }

    pub async fn commit(&self) -> MutexGuard<'_, ()> {
        self.commit.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_latest_generation_is_current() {
        let tracker = RequestTracker::new();
        let first = tracker.begin();
        let second = tracker.begin();
        assert!(second > first);
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
    }

    #[test]
    fn clones_share_the_counter() {
        let tracker = RequestTracker::new();
        let other = tracker.clone();
        let gen = other.begin();
        assert!(tracker.is_current(gen));
    }

    #[tokio::test]
    async fn commit_is_exclusive_across_clones() {
        let tracker = RequestTracker::new();
        let other = tracker.clone();
        let guard = tracker.commit().await;
        assert!(other.commit.try_lock().is_err());
        drop(guard);
        assert!(other.commit.try_lock().is_ok());
    }
}
