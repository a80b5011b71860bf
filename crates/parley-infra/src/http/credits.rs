//! HttpCreditService -- concrete [`CreditService`] over HTTP.
//!
//! GETs the balance endpoint and reads `{"balance": <number>}`.

use parley_core::credit::service::CreditService;
use parley_types::credit::{BalanceError, CreditBalance};

/// Credit service reached at a single endpoint URL.
#[derive(Debug, Clone)]
pub struct HttpCreditService {
    client: reqwest::Client,
    url: String,
}

impl HttpCreditService {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl CreditService for HttpCreditService {
    async fn fetch_balance(&self) -> Result<f64, BalanceError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| BalanceError::Network(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BalanceError::Status {
                status: status.as_u16(),
            });
        }

        let body: CreditBalance = response
            .json()
            .await
            .map_err(|e| BalanceError::Malformed(format!("failed to parse response: {e}")))?;

        tracing::debug!(balance = body.balance, "Fetched credit balance");
        Ok(body.balance)
    }
}
