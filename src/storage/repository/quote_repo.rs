use crate::catalog::model::QuoteRequest;
use crate::storage::entity::quote_record::{
    self, ActiveModel as QuoteRecordActiveModel, Entity as QuoteRecord, Model as QuoteRecordModel,
};
use chrono::Utc;
use rand::Rng;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, QuerySelect, Set};

// sin 0/O ni 1/I para que se pueda dictar por teléfono
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct QuoteSummary {
    pub code: String,
    pub form: Option<QuoteRequest>,
    pub plan_count: i32,
    pub created_at: i64,
}

impl From<QuoteRecordModel> for QuoteSummary {
    fn from(model: QuoteRecordModel) -> Self {
        Self {
            code: model.code,
            form: serde_json::from_str(&model.form_json).ok(),
            plan_count: model.plan_count,
            created_at: model.created_at,
        }
    }
}

pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

pub struct QuoteRepository;

impl QuoteRepository {
    /// Registra una cotización enviada y devuelve su código de confirmación
    pub async fn record(
        db: &DatabaseConnection,
        form: &QuoteRequest,
        plan_count: usize,
    ) -> Result<String, crate::storage::StoreError> {
        let form_json = serde_json::to_string(form)?;
        let now = Utc::now().timestamp();

        // colisión improbable, pero el código es PK
        let mut code = generate_code();
        while QuoteRecord::find_by_id(code.clone()).one(db).await?.is_some() {
            code = generate_code();
        }

        let active_model = QuoteRecordActiveModel {
            code: Set(code.clone()),
            form_json: Set(form_json),
            plan_count: Set(plan_count.min(i32::MAX as usize) as i32),
            created_at: Set(now),
        };
        active_model.insert(db).await?;
        Ok(code)
    }

    pub async fn find(
        db: &DatabaseConnection,
        code: &str,
    ) -> Result<Option<QuoteSummary>, sea_orm::DbErr> {
        let model = QuoteRecord::find_by_id(code.to_ascii_uppercase()).one(db).await?;
        Ok(model.map(QuoteSummary::from))
    }

    pub async fn list_recent(
        db: &DatabaseConnection,
        limit: u64,
    ) -> Result<Vec<QuoteSummary>, sea_orm::DbErr> {
        let models = QuoteRecord::find()
            .order_by_desc(quote_record::Column::CreatedAt)
            .limit(limit)
            .all(db)
            .await?;
        Ok(models.into_iter().map(QuoteSummary::from).collect())
    }
}
