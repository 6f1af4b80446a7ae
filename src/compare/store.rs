use crate::catalog::model::Plan;
use crate::compare::set::ComparisonSet;
use crate::storage::repository::{SessionRepository, KEY_COMPARE_PLANS, KEY_COMPARE_SELECTION};
use crate::storage::StoreError;
use async_trait::async_trait;
use log::warn;
use sea_orm::DatabaseConnection;
use std::sync::{Arc, Mutex};

/// Persistencia de la comparación (selección + repositorio de planes).
///
/// Toda pantalla que necesite la selección pasa por acá; las claves de
/// almacenamiento no se repiten en ningún otro lado.
#[async_trait]
pub trait ComparisonStore: Send + Sync {
    async fn load(&self) -> Result<Option<Vec<String>>, StoreError>;
    async fn save(&self, ids: &[String]) -> Result<(), StoreError>;
    async fn load_plans(&self) -> Result<Option<Vec<Plan>>, StoreError>;
    async fn save_plans(&self, plans: &[Plan]) -> Result<(), StoreError>;
    async fn clear(&self) -> Result<(), StoreError>;
}

pub struct SessionComparisonStore {
    db: Arc<DatabaseConnection>,
}

impl SessionComparisonStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ComparisonStore for SessionComparisonStore {
    async fn load(&self) -> Result<Option<Vec<String>>, StoreError> {
        SessionRepository::get_json(&self.db, KEY_COMPARE_SELECTION).await
    }

    async fn save(&self, ids: &[String]) -> Result<(), StoreError> {
        SessionRepository::set_json(&self.db, KEY_COMPARE_SELECTION, ids).await
    }

    async fn load_plans(&self) -> Result<Option<Vec<Plan>>, StoreError> {
        SessionRepository::get_json(&self.db, KEY_COMPARE_PLANS).await
    }

    async fn save_plans(&self, plans: &[Plan]) -> Result<(), StoreError> {
        SessionRepository::set_json(&self.db, KEY_COMPARE_PLANS, plans).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        SessionRepository::remove(&self.db, KEY_COMPARE_SELECTION).await?;
        SessionRepository::remove(&self.db, KEY_COMPARE_PLANS).await?;
        Ok(())
    }
}

/// Implementación en memoria, para tests y para correr sin base
#[derive(Default)]
pub struct MemoryComparisonStore {
    ids: Mutex<Option<Vec<String>>>,
    plans: Mutex<Option<Vec<Plan>>>,
}

#[async_trait]
impl ComparisonStore for MemoryComparisonStore {
    async fn load(&self) -> Result<Option<Vec<String>>, StoreError> {
        Ok(self.ids.lock().map(|g| g.clone()).unwrap_or_default())
    }

    async fn save(&self, ids: &[String]) -> Result<(), StoreError> {
        if let Ok(mut g) = self.ids.lock() {
            *g = Some(ids.to_vec());
        }
        Ok(())
    }

    async fn load_plans(&self) -> Result<Option<Vec<Plan>>, StoreError> {
        Ok(self.plans.lock().map(|g| g.clone()).unwrap_or_default())
    }

    async fn save_plans(&self, plans: &[Plan]) -> Result<(), StoreError> {
        if let Ok(mut g) = self.plans.lock() {
            *g = Some(plans.to_vec());
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        if let Ok(mut g) = self.ids.lock() {
            *g = None;
        }
        if let Ok(mut g) = self.plans.lock() {
            *g = None;
        }
        Ok(())
    }
}

/// Estado restaurado al arrancar: repositorio y selección
#[derive(Debug, Clone, Default)]
pub struct RestoredComparison {
    pub plans: Vec<Plan>,
    pub selection: ComparisonSet,
}

/// Restaura lo guardado. Los errores degradan a vacío; los ids que ya no
/// están en el repositorio se descartan y se vuelve a guardar la selección.
pub async fn restore(store: &dyn ComparisonStore) -> RestoredComparison {
    let plans = match store.load_plans().await {
        Ok(p) => p.unwrap_or_default(),
        Err(e) => {
            warn!("restore: cannot load plans: {}", e);
            Vec::new()
        }
    };
    let ids = match store.load().await {
        Ok(ids) => ids.unwrap_or_default(),
        Err(e) => {
            warn!("restore: cannot load selection: {}", e);
            Vec::new()
        }
    };

    let mut selection = ComparisonSet::from_ids(ids);
    if selection.retain_known(&plans) {
        if let Err(e) = store.save(selection.ids()).await {
            warn!("restore: cannot save pruned selection: {}", e);
        }
    }

    RestoredComparison { plans, selection }
}
