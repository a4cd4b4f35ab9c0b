//! Test doubles shared by unit and integration tests

use crate::deliver::Delivery;
use crate::provider::{Provider, ProviderError, ProviderResult};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;

/// One canned route: a path, the query parameters that must be present
/// (a subset match), and the response to return.
pub struct StubRoute {
    pub path: String,
    pub params: Vec<(String, String)>,
    pub response: ProviderResult,
}

/// Provider stub serving canned responses and recording every call
#[derive(Default)]
pub struct StubProvider {
    routes: Vec<StubRoute>,
    calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, path: &str, body: Value) -> Self {
        self.routes.push(StubRoute {
            path: path.to_string(),
            params: Vec::new(),
            response: Ok(body),
        });
        self
    }

    /// Route matched only when the listed query parameters are present
    pub fn with_param_response(mut self, path: &str, params: &[(&str, &str)], body: Value) -> Self {
        self.routes.push(StubRoute {
            path: path.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            response: Ok(body),
        });
        self
    }

    pub fn with_error(mut self, path: &str, error: ProviderError) -> Self {
        self.routes.push(StubRoute {
            path: path.to_string(),
            params: Vec::new(),
            response: Err(error),
        });
        self
    }

    /// Like `with_error` but only for calls carrying the given parameters
    pub fn with_param_error(
        mut self,
        path: &str,
        params: &[(&str, &str)],
        error: ProviderError,
    ) -> Self {
        self.routes.push(StubRoute {
            path: path.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            response: Err(error),
        });
        self
    }

    pub fn calls(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for StubProvider {
    async fn get(&self, path: &str, params: &[(&str, &str)]) -> ProviderResult {
        self.calls.lock().unwrap().push((
            path.to_string(),
            params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ));

        // most specific route first: param routes beat bare path routes
        let mut candidates: Vec<&StubRoute> =
            self.routes.iter().filter(|r| r.path == path).collect();
        candidates.sort_by_key(|r| std::cmp::Reverse(r.params.len()));

        for route in candidates {
            let matches = route
                .params
                .iter()
                .all(|(k, v)| params.iter().any(|(pk, pv)| pk == k && pv == v));
            if matches {
                return route.response.clone();
            }
        }

        Err(ProviderError::Transport(format!("no stub route for {path}")))
    }
}

/// Delivery double recording every message, optionally failing
#[derive(Default)]
pub struct RecordingDelivery {
    pub fail: bool,
    sent: Mutex<Vec<(String, i64)>>,
}

impl RecordingDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<(String, i64)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Delivery for RecordingDelivery {
    async fn deliver(&self, text: &str, topic_id: i64) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("delivery configured to fail");
        }
        self.sent.lock().unwrap().push((text.to_string(), topic_id));
        Ok(())
    }
}
