//! Mock transport for tests and the host binaries
//!
//! Routes are matched on method and full URL. Each route either returns a
//! fixed JSON payload, echoes the request body or fails with a
//! [`TransportError`]. Latency and call counters make it usable for
//! dedup and race tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::time::sleep;

use super::transport::{HttpRequest, Method, Transport};
use crate::error::{MicroError, Result, TransportError};

#[derive(Debug, Clone)]
enum Reply {
    Json(Value),
    Echo,
    Fail(TransportError),
}

#[derive(Debug, Default)]
struct MockState {
    routes: HashMap<(Method, String), Reply>,
    requests: Vec<HttpRequest>,
}

#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    delay: Duration,
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulated latency applied to every exchange
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Answer `method url` with `response`, replacing any previous route
    pub fn route(&self, method: Method, url: &str, response: Value) -> &Self {
        self.set(method, url, Reply::Json(response))
    }

    /// Answer `method url` with the request body
    pub fn echo(&self, method: Method, url: &str) -> &Self {
        self.set(method, url, Reply::Echo)
    }

    /// Fail `method url` with `error`
    pub fn fail(&self, method: Method, url: &str, error: TransportError) -> &Self {
        self.set(method, url, Reply::Fail(error))
    }

    fn set(&self, method: Method, url: &str, reply: Reply) -> &Self {
        lock(&self.state).routes.insert((method, url.to_string()), reply);
        self
    }

    /// Number of exchanges made against `method url`
    pub fn calls(&self, method: Method, url: &str) -> usize {
        lock(&self.state)
            .requests
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        lock(&self.state).requests.len()
    }

    /// Every request received so far, oldest first
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.state).requests.clone()
    }

    /// Load routes from a JSON fixtures file
    ///
    /// ```json
    /// {
    ///   "delayMs": 10,
    ///   "routes": [
    ///     { "method": "GET", "url": "/api/support/tickets", "response": [] },
    ///     { "method": "POST", "url": "/api/support/tickets", "echo": true },
    ///     { "method": "GET", "url": "/api/user/me", "status": 401, "message": "Unauthorized" },
    ///     { "method": "GET", "url": "/api/payments/transactions", "networkError": "offline" }
    ///   ]
    /// }
    /// ```
    pub fn from_fixtures(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MicroError::InvalidInput(format!("Failed to read fixtures {}: {}", path.display(), e))
        })?;
        Self::from_fixtures_str(&content)
    }

    pub fn from_fixtures_str(content: &str) -> Result<Self> {
        let file: FixtureFile = serde_json::from_str(content)
            .map_err(|e| MicroError::InvalidInput(format!("Invalid fixtures: {}", e)))?;

        let transport = MockTransport::new().with_delay(Duration::from_millis(file.delay_ms));
        for route in file.routes {
            let (method, url) = (route.method, route.url.clone());
            transport.set(method, &url, route.reply()?);
        }

        Ok(transport)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> std::result::Result<Value, TransportError> {
        let reply = {
            let mut state = lock(&self.state);
            state.requests.push(request.clone());
            state.routes.get(&(request.method, request.url.clone())).cloned()
        };

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match reply {
            Some(Reply::Json(value)) => Ok(value),
            Some(Reply::Echo) => Ok(request.body.unwrap_or(Value::Null)),
            Some(Reply::Fail(error)) => Err(error),
            None => Err(TransportError::NoRoute {
                method: request.method.to_string(),
                url: request.url,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FixtureFile {
    #[serde(default)]
    delay_ms: u64,
    #[serde(default)]
    routes: Vec<FixtureRoute>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FixtureRoute {
    method: Method,
    url: String,
    response: Option<Value>,
    #[serde(default)]
    echo: bool,
    status: Option<u16>,
    message: Option<String>,
    network_error: Option<String>,
}

impl FixtureRoute {
    fn reply(self) -> Result<Reply> {
        if let Some(error) = self.network_error {
            return Ok(Reply::Fail(TransportError::Network(error)));
        }
        if let Some(code) = self.status {
            return Ok(Reply::Fail(TransportError::Status {
                code,
                message: self.message.unwrap_or_default(),
            }));
        }
        if self.echo {
            return Ok(Reply::Echo);
        }
        let (method, url) = (self.method, self.url);
        self.response.map(Reply::Json).ok_or_else(|| {
            let message = format!("Fixture route {} {} has no reply", method, url);
            MicroError::InvalidInput(message)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_routes_and_counters() {
        let mock = MockTransport::new();
        mock.route(Method::Get, "/api/support/tickets", json!([]));

        let response = mock
            .send(HttpRequest::new(Method::Get, "/api/support/tickets", None))
            .await
            .unwrap();
        assert_eq!(response, json!([]));
        assert_eq!(mock.calls(Method::Get, "/api/support/tickets"), 1);
        assert_eq!(mock.calls(Method::Post, "/api/support/tickets"), 0);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let mock = MockTransport::new();
        let error = mock
            .send(HttpRequest::new(Method::Delete, "/api/nothing", None))
            .await
            .unwrap_err();
        assert_eq!(
            error,
            TransportError::NoRoute {
                method: "DELETE".to_string(),
                url: "/api/nothing".to_string(),
            }
        );
        assert_eq!(mock.total_calls(), 1);
    }

    #[tokio::test]
    async fn test_echo_and_failure() {
        let mock = MockTransport::new();
        mock.echo(Method::Post, "/api/payments/transactions")
            .fail(
                Method::Get,
                "/api/payments/transactions",
                TransportError::Network("offline".to_string()),
            );

        let body = json!({ "amount": 10 });
        let echoed = mock
            .send(HttpRequest::new(Method::Post, "/api/payments/transactions", Some(body.clone())))
            .await
            .unwrap();
        assert_eq!(echoed, body);

        let error = mock
            .send(HttpRequest::new(Method::Get, "/api/payments/transactions", None))
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "Network error: offline");
    }

    #[tokio::test]
    async fn test_fixtures() {
        let mock = MockTransport::from_fixtures_str(
            r#"{
                "delayMs": 5,
                "routes": [
                    { "method": "GET", "url": "/api/support/tickets", "response": [{ "id": "1" }] },
                    {
                        "method": "GET",
                        "url": "/api/user/me",
                        "status": 401,
                        "message": "Unauthorized"
                    }
                ]
            }"#,
        )
        .unwrap();

        let tickets = mock
            .send(HttpRequest::new(Method::Get, "/api/support/tickets", None))
            .await
            .unwrap();
        assert_eq!(tickets, json!([{ "id": "1" }]));

        let error = mock
            .send(HttpRequest::new(Method::Get, "/api/user/me", None))
            .await
            .unwrap_err();
        assert!(matches!(error, TransportError::Status { code: 401, .. }));
    }

    #[test]
    fn test_fixture_route_without_reply() {
        let fixtures = r#"{ "routes": [{ "method": "GET", "url": "/api/x" }] }"#;
        let result = MockTransport::from_fixtures_str(fixtures);
        assert!(matches!(result, Err(MicroError::InvalidInput(_))));
    }

    #[test]
    fn test_fixtures_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, br#"{ "routes": [] }"#).unwrap();

        let mock = MockTransport::from_fixtures(file.path()).unwrap();
        assert_eq!(mock.total_calls(), 0);
        assert!(MockTransport::from_fixtures(Path::new("/nonexistent/fixtures.json")).is_err());
    }
}
