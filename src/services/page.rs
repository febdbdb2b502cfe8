// src/services/page.rs

//! Listing page source.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;

use crate::error::{AppError, Result};
use crate::models::SourceConfig;
use crate::services::parse_selector;
use crate::utils::http::create_async_client;

/// Provides the raw markup of a page.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch `url`, failing with [`AppError::Fetch`] on any problem.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Fetches pages over HTTP and insists that the listing table is present.
pub struct HttpPageSource {
    client: Client,
    timeout: Duration,
    required_selector: String,
}

impl HttpPageSource {
    /// Create a page source with the given client.
    pub fn new(client: Client, timeout: Duration, required_selector: impl Into<String>) -> Self {
        Self {
            client,
            timeout,
            required_selector: required_selector.into(),
        }
    }

    /// Create a page source from the source section of the configuration.
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        Ok(Self::new(
            create_async_client(config)?,
            Duration::from_secs(config.timeout_secs),
            config.table_selector.clone(),
        ))
    }

    fn has_required_element(&self, markup: &str) -> Result<bool> {
        let selector = parse_selector(&self.required_selector)?;
        let document = Html::parse_document(markup);
        Ok(document.select(&selector).next().is_some())
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self, url: &str) -> Result<String> {
        log::debug!("GET {} (timeout {}s)", url, self.timeout.as_secs());

        let request = async {
            let response = self.client.get(url).send().await?.error_for_status()?;
            response.text().await
        };

        let markup = match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(markup)) => markup,
            Ok(Err(e)) => return Err(AppError::fetch(url, e)),
            Err(_) => {
                return Err(AppError::fetch(
                    url,
                    format!("no response within {}s", self.timeout.as_secs()),
                ));
            }
        };

        if !self.has_required_element(&markup)? {
            return Err(AppError::fetch(
                url,
                format!("element '{}' not found on page", self.required_selector),
            ));
        }

        log::debug!("Fetched {} bytes from {}", markup.len(), url);
        Ok(markup)
    }
}
