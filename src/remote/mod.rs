pub mod pdf_client;
pub mod quote_client;
pub mod tracker;
pub mod types;

pub use pdf_client::PdfClient;
pub use quote_client::QuoteClient;
pub use tracker::RequestTracker;
pub use types::{PdfRenderer, QuoteOutcome, QuoteSource, RemoteError};

use crate::config::AppConfig;

pub(crate) fn build_http_client(config: &AppConfig) -> Result<reqwest::Client, RemoteError> {
    let mut builder = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .user_agent(concat!("prepaga-compare/", env!("CARGO_PKG_VERSION")));

    if let Some(url) = &config.proxy_url {
        let proxy = reqwest::Proxy::all(url).map_err(|e| RemoteError::Http(e.to_string()))?;
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(|e| RemoteError::Http(e.to_string()))
}
