//! HTTP provider clients
//!
//! Every upstream data source is reached through the [`Provider`] trait so
//! feature code can be driven by stubs in tests. The concrete
//! [`HttpProvider`] wraps a reqwest client with a base URL, default headers,
//! and an envelope policy describing how the source signals failure inside
//! an HTTP 200 body.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// How a provider wraps its payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// Body is the payload itself
    Bare,
    /// Body carries a `code`/`success` field; non-success codes are errors
    /// even under HTTP 200
    CodeField,
}

/// Errors from a provider call
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("http status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("provider error code {code}")]
    ProviderCode { code: String, body: Value },

    #[error("malformed response body: {0}")]
    MalformedBody(String),
}

pub type ProviderResult = Result<Value, ProviderError>;

/// A JSON-over-HTTP data source
#[async_trait]
pub trait Provider: Send + Sync {
    /// GET `path` relative to the provider base URL with query parameters
    async fn get(&self, path: &str, params: &[(&str, &str)]) -> ProviderResult;
}

/// Concrete provider backed by reqwest
pub struct HttpProvider {
    client: reqwest::Client,
    base_url: String,
    headers: Vec<(String, String)>,
    envelope: Envelope,
}

impl HttpProvider {
    pub fn new(
        base_url: impl Into<String>,
        headers: Vec<(String, String)>,
        envelope: Envelope,
        timeout_ms: u64,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            headers,
            envelope,
        })
    }
}

/// Whether an envelope `code` value counts as success
fn code_is_ok(code: &Value) -> bool {
    match code {
        Value::String(s) => s == "0" || s == "200",
        Value::Number(n) => n.as_i64() == Some(0) || n.as_i64() == Some(200),
        _ => false,
    }
}

/// Apply the envelope policy to a decoded body
pub fn check_envelope(body: Value, envelope: Envelope) -> ProviderResult {
    if envelope == Envelope::Bare {
        return Ok(body);
    }

    let ok = match (body.get("code"), body.get("success")) {
        (Some(code), _) => {
            code_is_ok(code) || body.get("success").and_then(Value::as_bool) == Some(true)
        }
        (None, Some(success)) => success.as_bool() == Some(true),
        // No status field at all reads as a bare payload
        (None, None) => true,
    };

    if ok {
        Ok(body)
    } else {
        let code = body
            .get("code")
            .map(|c| match c {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| "unknown".to_string());
        Err(ProviderError::ProviderCode { code, body })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() <= MAX {
        body.to_string()
    } else {
        body.chars().take(MAX).collect()
    }
}

#[async_trait]
impl Provider for HttpProvider {
    async fn get(&self, path: &str, params: &[(&str, &str)]) -> ProviderResult {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(&url).query(params);
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ProviderError::HttpStatus {
                status: status.as_u16(),
                body: truncate_body(&text),
            });
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| ProviderError::MalformedBody(e.to_string()))?;

        check_envelope(body, self.envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_envelope_passes_anything() {
        let body = json!({"code": "1", "msg": "rate limited"});
        assert!(check_envelope(body, Envelope::Bare).is_ok());
    }

    #[test]
    fn test_code_field_success_variants() {
        for code in [json!("0"), json!(0), json!(200), json!("200")] {
            let body = json!({"code": code, "data": []});
            assert!(check_envelope(body, Envelope::CodeField).is_ok());
        }
    }

    #[test]
    fn test_code_field_failure() {
        let body = json!({"code": "40001", "msg": "invalid key"});
        let err = check_envelope(body, Envelope::CodeField).unwrap_err();
        match err {
            ProviderError::ProviderCode { code, .. } => assert_eq!(code, "40001"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_success_flag_rescues_odd_code() {
        let body = json!({"code": "1", "success": true, "data": []});
        assert!(check_envelope(body, Envelope::CodeField).is_ok());
    }

    #[test]
    fn test_missing_code_field_is_ok() {
        let body = json!({"data": [1, 2, 3]});
        assert!(check_envelope(body, Envelope::CodeField).is_ok());
    }

    #[test]
    fn test_success_false_without_code() {
        let body = json!({"success": false, "msg": "nope"});
        assert!(check_envelope(body, Envelope::CodeField).is_err());
    }

    #[test]
    fn test_truncate_body_caps_length() {
        let long = "x".repeat(500);
        assert_eq!(truncate_body(&long).len(), 200);
        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn test_http_provider_construction() {
        let provider = HttpProvider::new(
            "https://example.com/",
            vec![("CG-API-KEY".to_string(), "k".to_string())],
            Envelope::CodeField,
            5_000,
        )
        .unwrap();
        assert_eq!(provider.base_url, "https://example.com");
    }
}
