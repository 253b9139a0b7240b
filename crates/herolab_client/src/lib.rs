use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_BASE_URL: &str = "https://api.herolab.online";

const ACQUIRE_ACCESS_TOKEN_ROUTE: &str = "/v1/access/acquire-access-token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallResult {
    Success,
    Failure,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AcquireAccessTokenRequest {
    refresh_token: String,
    tool_name: String,
    caller_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AcquireAccessTokenResponse {
    severity: Severity,
    result: CallResult,
    caller_id: i64,
    access_token: String,
}

/// Protocol sanity violations are fatal: there is no retry path, the caller
/// surfaces the failure and stops.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("response severity was {0:?}, expected Success")]
    Severity(Severity),
    #[error("response result was {0:?}, expected Success")]
    Result(CallResult),
    #[error("caller id mismatch: sent {sent}, response echoed {echoed}")]
    CallerIdMismatch { sent: i64, echoed: i64 },
}

/// Client for the Hero Lab Online access API. Holds no token state; each
/// call is a single request/response exchange.
pub struct HeroLabClient {
    http: Client,
    base_url: String,
    tool_name: String,
    caller_seq: AtomicI64,
}

impl HeroLabClient {
    pub fn new(base_url: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            tool_name: tool_name.into(),
            caller_seq: AtomicI64::new(1),
        }
    }

    /// Exchanges a refresh token for a short-lived access token. The
    /// response must report success at both levels and echo our caller id
    /// before the token is trusted.
    pub async fn acquire_access_token(&self, refresh_token: &str) -> Result<String> {
        let caller_id = self.caller_seq.fetch_add(1, Ordering::Relaxed);
        let request = AcquireAccessTokenRequest {
            refresh_token: refresh_token.to_string(),
            tool_name: self.tool_name.clone(),
            caller_id,
        };

        let response: AcquireAccessTokenResponse = self
            .http
            .post(format!("{}{ACQUIRE_ACCESS_TOKEN_ROUTE}", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("malformed acquire-access-token response body")?;

        if response.severity != Severity::Success {
            return Err(ProtocolError::Severity(response.severity).into());
        }
        if response.result != CallResult::Success {
            return Err(ProtocolError::Result(response.result).into());
        }
        if response.caller_id != caller_id {
            return Err(ProtocolError::CallerIdMismatch {
                sent: caller_id,
                echoed: response.caller_id,
            }
            .into());
        }

        info!(caller_id, "acquired Hero Lab access token");
        Ok(response.access_token)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
