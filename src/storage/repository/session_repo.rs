use crate::storage::entity::session_entry::{
    self, ActiveModel as SessionEntryActiveModel, Entity as SessionEntry,
};
use crate::storage::StoreError;
use chrono::Utc;
use log::warn;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Claves del almacenamiento de sesión. Se definen una sola vez acá.
pub const KEY_QUOTE_FORM: &str = "cotizacion.formulario";
pub const KEY_QUOTE_CODE: &str = "cotizacion.codigo";
pub const KEY_COMPARE_SELECTION: &str = "comparar.seleccion";
pub const KEY_COMPARE_PLANS: &str = "comparar.planes";

pub struct SessionRepository;

impl SessionRepository {
    pub async fn get_raw(
        db: &DatabaseConnection,
        key: &str,
    ) -> Result<Option<String>, sea_orm::DbErr> {
        let model = SessionEntry::find_by_id(key.to_string()).one(db).await?;
        Ok(model.map(|m| m.value))
    }

    /// Lee y deserializa una clave. Si el JSON guardado no parsea, se
    /// registra, se borra la entrada y se devuelve `None`.
    pub async fn get_json<T: DeserializeOwned>(
        db: &DatabaseConnection,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        let Some(raw) = Self::get_raw(db, key).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<T>(&raw) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                warn!("session entry {} is malformed, discarding: {}", key, e);
                Self::remove(db, key).await?;
                Ok(None)
            }
        }
    }

    pub async fn set_raw(
        db: &DatabaseConnection,
        key: &str,
        value: String,
    ) -> Result<(), sea_orm::DbErr> {
        let now = Utc::now().timestamp();
        let active_model = SessionEntryActiveModel {
            key: Set(key.to_string()),
            value: Set(value),
            updated_at: Set(now),
        };

        SessionEntry::insert(active_model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(session_entry::Column::Key)
                    .update_columns([session_entry::Column::Value, session_entry::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec(db)
            .await?;
        Ok(())
    }

    pub async fn set_json<T: Serialize + ?Sized>(
        db: &DatabaseConnection,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)?;
        Self::set_raw(db, key, raw).await?;
        Ok(())
    }

    pub async fn remove(db: &DatabaseConnection, key: &str) -> Result<bool, sea_orm::DbErr> {
        let res = SessionEntry::delete_many()
            .filter(session_entry::Column::Key.eq(key))
            .exec(db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    /// "Nueva sesión": descarta todo lo guardado
    pub async fn clear_all(db: &DatabaseConnection) -> Result<u64, sea_orm::DbErr> {
        let res = SessionEntry::delete_many().exec(db).await?;
        Ok(res.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::establish_connection;

    #[tokio::test]
    async fn json_roundtrip_and_overwrite() {
        let db = establish_connection("sqlite::memory:").await.unwrap();
        SessionRepository::set_json(&db, KEY_COMPARE_SELECTION, &vec!["A", "B"])
            .await
            .unwrap();
        SessionRepository::set_json(&db, KEY_COMPARE_SELECTION, &vec!["C"])
            .await
            .unwrap();
        let ids: Option<Vec<String>> = SessionRepository::get_json(&db, KEY_COMPARE_SELECTION)
            .await
            .unwrap();
        assert_eq!(ids, Some(vec!["C".to_string()]));
        assert_eq!(
            SessionRepository::get_raw(&db, KEY_COMPARE_SELECTION).await.unwrap(),
            Some(r#"["C"]"#.to_string())
        );
    }

    #[tokio::test]
    async fn malformed_entry_is_discarded() {
        let db = establish_connection("sqlite::memory:").await.unwrap();
        SessionRepository::set_raw(&db, KEY_QUOTE_FORM, "{no es json".to_string())
            .await
            .unwrap();
        let form: Option<serde_json::Value> =
            SessionRepository::get_json(&db, KEY_QUOTE_FORM).await.unwrap();
        assert!(form.is_none());
        assert!(SessionRepository::get_raw(&db, KEY_QUOTE_FORM)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn remove_and_clear() {
        let db = establish_connection("sqlite::memory:").await.unwrap();
        SessionRepository::set_json(&db, KEY_QUOTE_CODE, "AB12CD34").await.unwrap();
        SessionRepository::set_json(&db, KEY_COMPARE_PLANS, &Vec::<String>::new())
            .await
            .unwrap();
        assert!(SessionRepository::remove(&db, KEY_QUOTE_CODE).await.unwrap());
        assert!(!SessionRepository::remove(&db, KEY_QUOTE_CODE).await.unwrap());
        assert_eq!(SessionRepository::clear_all(&db).await.unwrap(), 1);
    }
}
