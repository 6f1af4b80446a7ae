use crate::config::AppConfig;
use crate::remote::build_http_client;
use crate::remote::types::{PdfEnvelope, PdfRenderer, RemoteError};
use async_trait::async_trait;
use base64::Engine;
use log::info;
use serde_json::json;

const PDF_MAGIC: &[u8] = b"%PDF";

/// Cliente del proxy que renderiza HTML a PDF
#[derive(Clone)]
pub struct PdfClient {
    client: reqwest::Client,
    url: String,
}

impl PdfClient {
    pub fn from_config(config: &AppConfig) -> Result<Self, RemoteError> {
        let url = config.pdf_url()?.to_string();
        Ok(Self {
            client: build_http_client(config)?,
            url,
        })
    }
}

#[async_trait]
impl PdfRenderer for PdfClient {
    async fn render(&self, html: &str) -> Result<Vec<u8>, RemoteError> {
        let resp = self
            .client
            .post(&self.url)
            .json(&json!({ "htmlContent": html }))
            .send()
            .await?;
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let bytes = resp.bytes().await?;
        info!(
            "{} render(...) [{}] {} bytes",
            self,
            status,
            bytes.len()
        );

        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }
        decode_pdf_body(content_type.as_deref(), &bytes)
    }
}

/// El servicio responde el PDF binario o, en el camino alternativo, un JSON
/// con el PDF en base64 (`pdf` o `data`).
pub fn decode_pdf_body(content_type: Option<&str>, body: &[u8]) -> Result<Vec<u8>, RemoteError> {
    let is_json = content_type
        .map(|ct| ct.to_ascii_lowercase().contains("json"))
        .unwrap_or(false)
        || body.first() == Some(&b'{');

    let pdf = if is_json {
        let env: PdfEnvelope = serde_json::from_slice(body)
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))?;
        if let Some(err) = env.error {
            return Err(RemoteError::Rejected(err));
        }
        let encoded = env
            .pdf
            .or(env.data)
            .ok_or_else(|| RemoteError::InvalidResponse("json without pdf payload".to_string()))?;
        // a veces viene como data URL
        let encoded = encoded
            .split_once("base64,")
            .map(|(_, rest)| rest.to_string())
            .unwrap_or(encoded);
        base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| RemoteError::InvalidResponse(format!("base64: {}", e)))?
    } else {
        body.to_vec()
    };

    if !pdf.starts_with(PDF_MAGIC) {
        return Err(RemoteError::InvalidResponse("body is not a PDF".to_string()));
    }
    Ok(pdf)
}

impl std::fmt::Display for PdfClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<PdfClient [{}]>", self.url)
    }
}
