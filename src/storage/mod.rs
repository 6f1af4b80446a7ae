pub mod connection;
pub mod entity;
pub mod repository;

pub use connection::establish_connection;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("db error: {0}")]
    Db(#[from] sea_orm::DbErr),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}
