//! Shared JSON-RPC plumbing for both chain backends.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};

/// Per-request timeout. Confirmation polling loops above this layer place
/// their own deadlines.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Create an HTTP client configured for JSON-RPC requests.
pub fn create_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(Error::from)
}

/// Make a JSON-RPC 2.0 call and deserialize the `result` field.
///
/// Transport failures map to [`Error::Rpc`] with the source attached; an
/// `error` object in the response body becomes an [`Error::Rpc`] carrying the
/// backend's message; a body that is not a JSON-RPC envelope, or a `result`
/// that does not deserialize as `T`, is an [`Error::Protocol`].
pub async fn json_rpc_call<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &Url,
    method: &str,
    params: Vec<Value>,
) -> Result<T> {
    let response = client
        .post(url.clone())
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .send()
        .await?;

    let body: Value = response
        .json()
        .await
        .map_err(|err| Error::Protocol(format!("{method}: response is not JSON: {err}")))?;

    if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown backend error");
        return Err(Error::rpc(format!("{method}: {message}")));
    }

    let result = body
        .get("result")
        .cloned()
        .ok_or_else(|| Error::Protocol(format!("{method}: no result in response")))?;

    serde_json::from_value(result)
        .map_err(|err| Error::Protocol(format!("{method}: unexpected result shape: {err}")))
}

/// Parse a `0x`-prefixed hex quantity as u64.
pub fn parse_hex_u64(value: &str) -> Result<u64> {
    u64::from_str_radix(value.trim_start_matches("0x"), 16)
        .map_err(|err| Error::Protocol(format!("invalid hex quantity {value}: {err}")))
}
