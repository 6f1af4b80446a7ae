use crate::catalog::model::{Plan, QuoteRequest};
use crate::config::ConfigError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

#[derive(thiserror::Error, Debug)]
pub enum RemoteError {
    #[error("http error: {0}")]
    Http(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        RemoteError::Http(e.to_string())
    }
}

/// Sobre que devuelve el endpoint de cotización
#[derive(Debug, Deserialize)]
pub struct QuoteEnvelope {
    pub success: bool,
    #[serde(default)]
    pub data: Option<QuoteData>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteData {
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct QuoteOutcome {
    pub plans: Vec<Plan>,
    pub message: Option<String>,
}

/// Respuesta JSON alternativa del servicio de PDF
#[derive(Debug, Deserialize)]
pub struct PdfEnvelope {
    #[serde(default)]
    pub pdf: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn submit(&self, req: &QuoteRequest) -> Result<QuoteOutcome, RemoteError>;
}

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, html: &str) -> Result<Vec<u8>, RemoteError>;
}
