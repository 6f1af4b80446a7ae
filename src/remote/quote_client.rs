use crate::catalog::model::QuoteRequest;
use crate::catalog::normalize::normalize_plans;
use crate::config::AppConfig;
use crate::remote::build_http_client;
use crate::remote::types::{QuoteEnvelope, QuoteOutcome, QuoteSource, RemoteError};
use async_trait::async_trait;
use log::{info, warn};

/// Cliente del endpoint de cotización. Sin reintentos: un fallo se informa
/// y el estado anterior queda como estaba.
#[derive(Clone)]
pub struct QuoteClient {
    client: reqwest::Client,
    url: String,
}

impl QuoteClient {
    pub fn from_config(config: &AppConfig) -> Result<Self, RemoteError> {
        let url = config.quote_url()?.to_string();
        Ok(Self {
            client: build_http_client(config)?,
            url,
        })
    }
}

#[async_trait]
impl QuoteSource for QuoteClient {
    async fn submit(&self, req: &QuoteRequest) -> Result<QuoteOutcome, RemoteError> {
        let resp = self.client.post(&self.url).json(req).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        info!("{} submit(...) [{}] {} bytes", self, status, text.len());

        if !status.is_success() {
            // el endpoint a veces manda el motivo en el mismo sobre
            if let Ok(env) = serde_json::from_str::<QuoteEnvelope>(&text) {
                if let Some(err) = env.error {
                    return Err(RemoteError::Rejected(err));
                }
            }
            return Err(RemoteError::Status(status.as_u16()));
        }

        parse_envelope(&text)
    }
}

/// Interpreta `{ success, data: { data: [...], message, success }, error }`
pub fn parse_envelope(body: &str) -> Result<QuoteOutcome, RemoteError> {
    let env: QuoteEnvelope =
        serde_json::from_str(body).map_err(|e| RemoteError::InvalidResponse(e.to_string()))?;

    if !env.success {
        return Err(RemoteError::Rejected(
            env.error.unwrap_or_else(|| "cotización rechazada".to_string()),
        ));
    }

    let Some(data) = env.data else {
        warn!("parse_envelope: success without data");
        return Ok(QuoteOutcome::default());
    };
    if data.success == Some(false) {
        return Err(RemoteError::Rejected(
            data.message.unwrap_or_else(|| "cotización rechazada".to_string()),
        ));
    }

    Ok(QuoteOutcome {
        plans: normalize_plans(&data.data),
        message: data.message,
    })
}

impl std::fmt::Display for QuoteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<QuoteClient [{}]>", self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn plans_come_from_nested_data() {
        let body = r#"{
            "success": true,
            "data": {
                "success": true,
                "message": "2 planes",
                "data": [
                    {"id": "A", "precio": 1000, "rating": 4.5, "empresa": "OSDE"},
                    {"id": "B", "precio": 5000, "rating": 3.0, "empresa": "Galeno"}
                ]
            }
        }"#;
        let out = parse_envelope(body).unwrap();
        assert_eq!(out.plans.len(), 2);
        assert_eq!(out.plans[1].provider, "Galeno");
        assert_eq!(out.message.as_deref(), Some("2 planes"));
    }

    #[test]
    fn failure_envelope_is_rejected() {
        let err = parse_envelope(r#"{"success": false, "error": "edad fuera de rango"}"#).unwrap_err();
        assert!(matches!(err, RemoteError::Rejected(m) if m == "edad fuera de rango"));

        let err = parse_envelope(r#"{"success": true, "data": {"success": false, "message": "sin cobertura"}}"#)
            .unwrap_err();
        assert!(matches!(err, RemoteError::Rejected(m) if m == "sin cobertura"));
    }

    #[test]
    fn missing_data_is_an_empty_repository() {
        let out = parse_envelope(r#"{"success": true}"#).unwrap();
        assert!(out.plans.is_empty());
    }

    #[test]
    fn missing_url_is_a_config_error() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        let err = QuoteClient::from_config(&config).err().unwrap();
        assert!(matches!(
            err,
            RemoteError::Config(ConfigError::MissingEnv("QUOTE_API_URL"))
        ));
        assert_eq!(err.to_string(), "missing env QUOTE_API_URL");
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(
            parse_envelope("<html>502</html>"),
            Err(RemoteError::InvalidResponse(_))
        ));
    }
}
