use std::path::PathBuf;
use std::time::Duration;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("missing env {0}")]
    MissingEnv(&'static str),
    #[error("invalid env {0}: {1}")]
    Invalid(&'static str, String),
}

/// Configuración leída del entorno (después de cargar `.env`)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub quote_api_url: Option<String>,
    pub pdf_api_url: Option<String>,
    pub proxy_url: Option<String>,
    pub http_timeout: Duration,
    pub pdf_output_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Igual que `from_env` pero con una función de búsqueda, para tests
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let http_timeout = match non_empty("HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw
                    .parse::<u64>()
                    .map_err(|_| ConfigError::Invalid("HTTP_TIMEOUT_SECS", raw.clone()))?;
                Duration::from_secs(secs.max(1))
            }
            None => Duration::from_secs(30),
        };

        let proxy_url = non_empty("HTTP_PROXY_URL").map(|t| {
            if t.contains("://") {
                t
            } else {
                format!("socks5h://{}", t)
            }
        });

        Ok(Self {
            database_url: non_empty("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://prepagas.db?mode=rwc".to_string()),
            quote_api_url: non_empty("QUOTE_API_URL"),
            pdf_api_url: non_empty("PDF_API_URL"),
            proxy_url,
            http_timeout,
            pdf_output_dir: non_empty("PDF_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("exports")),
        })
    }

    pub fn quote_url(&self) -> Result<&str, ConfigError> {
        self.quote_api_url
            .as_deref()
            .ok_or(ConfigError::MissingEnv("QUOTE_API_URL"))
    }

    pub fn pdf_url(&self) -> Result<&str, ConfigError> {
        self.pdf_api_url
            .as_deref()
            .ok_or(ConfigError::MissingEnv("PDF_API_URL"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.database_url, "sqlite://prepagas.db?mode=rwc");
        assert_eq!(cfg.http_timeout, Duration::from_secs(30));
        assert_eq!(cfg.quote_url(), Err(ConfigError::MissingEnv("QUOTE_API_URL")));
        assert_eq!(cfg.pdf_output_dir, PathBuf::from("exports"));
    }

    #[test]
    fn proxy_without_scheme_gets_socks() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("HTTP_PROXY_URL", "127.0.0.1:1080"),
            ("QUOTE_API_URL", " https://cotizador.example/api/quote "),
        ]))
        .unwrap();
        assert_eq!(cfg.proxy_url.as_deref(), Some("socks5h://127.0.0.1:1080"));
        assert_eq!(cfg.quote_url(), Ok("https://cotizador.example/api/quote"));
    }

    #[test]
    fn bad_timeout_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[("HTTP_TIMEOUT_SECS", "mucho")])).unwrap_err();
        assert_eq!(err, ConfigError::Invalid("HTTP_TIMEOUT_SECS", "mucho".to_string()));
    }
}
