//! Banking lookup service client and wire types
//!
//! One POST per question, JSON in and out:
//! `{"parameters": {"account_number": "..."}}` → `{"response": "..."}`.
//! A single bounded wait per call, no retries.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8085";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const ACCOUNT_NOT_FOUND: &str = "Account not found.";
pub const LOAN_NOT_FOUND: &str = "Loan ID not found.";

/// The three lookups the service answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    BalanceEnquiry,
    LoanBalance,
    LoanStatus,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Self::BalanceEnquiry => "/balance_enquiry",
            Self::LoanBalance => "/loan_balance",
            Self::LoanStatus => "/loan_status",
        }
    }

    /// Name of the single parameter the endpoint is keyed by
    pub fn param_key(&self) -> &'static str {
        match self {
            Self::BalanceEnquiry | Self::LoanBalance => "account_number",
            Self::LoanStatus => "loan_id",
        }
    }

    /// Body the service sends back when the key matches no record
    pub fn not_found_message(&self) -> &'static str {
        match self {
            Self::BalanceEnquiry | Self::LoanBalance => ACCOUNT_NOT_FOUND,
            Self::LoanStatus => LOAN_NOT_FOUND,
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path().trim_start_matches('/'))
    }
}

/// Request body. `user_text` and `sentiment` are accepted but unused.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LookupRequest {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_text: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sentiment: String,
}

impl LookupRequest {
    pub fn for_endpoint(endpoint: Endpoint, value: &str) -> Self {
        let mut parameters = BTreeMap::new();
        parameters.insert(
            endpoint.param_key().to_string(),
            serde_json::Value::String(value.to_string()),
        );
        Self {
            parameters,
            ..Default::default()
        }
    }

    /// A string parameter by name; anything else counts as absent
    pub fn param(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(|v| v.as_str())
    }
}

/// Response body, for both success and not-found replies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResponse {
    pub response: String,
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("no record found ({status}): {message}")]
    NotFound { status: u16, message: String },
    #[error("lookup service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to reach lookup service: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("malformed lookup response: {0}")]
    Malformed(String),
}

impl LookupError {
    /// The service answered but had nothing for us, as opposed to the
    /// request never completing
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Status { .. })
    }
}

/// Anything that can answer a banking lookup
#[async_trait]
pub trait BankingApi: Send + Sync {
    /// Query `endpoint` keyed by `value`; `Ok` carries the `response` text verbatim
    async fn query(&self, endpoint: Endpoint, value: &str) -> Result<String, LookupError>;
}

/// HTTP client for the lookup service
#[derive(Clone)]
pub struct HttpBankingApi {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl std::fmt::Debug for HttpBankingApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBankingApi")
            .field("client", &"<reqwest::Client>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpBankingApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl BankingApi for HttpBankingApi {
    async fn query(&self, endpoint: Endpoint, value: &str) -> Result<String, LookupError> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        info!("Calling {} for {}: {}", endpoint, endpoint.param_key(), value);

        let response = self
            .client
            .post(&url)
            .json(&LookupRequest::for_endpoint(endpoint, value))
            .send()
            .await
            .map_err(|e| {
                error!("Lookup request to {} failed: {}", url, e);
                LookupError::Transport(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(LookupError::Transport)?;
        debug!("Lookup response status: {}, body: {}", status, body);

        if !status.is_success() {
            error!("Lookup request failed with status {}", status);
            if status == reqwest::StatusCode::NOT_FOUND {
                let message = serde_json::from_str::<LookupResponse>(&body)
                    .map(|r| r.response)
                    .unwrap_or(body);
                return Err(LookupError::NotFound {
                    status: status.as_u16(),
                    message,
                });
            }
            return Err(LookupError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: LookupResponse = serde_json::from_str(&body)
            .map_err(|e| LookupError::Malformed(format!("{} in body {:?}", e, body)))?;
        Ok(parsed.response)
    }
}
