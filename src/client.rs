use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::client_logger::ClientLogger;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::navigator::Navigator;
use crate::observability::{
    CLIENT_NETWORK_FAILURES, CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS,
};
use crate::request::{Method, OutgoingRequest, authenticate};
use crate::response::ResponseUnwrapper;
use crate::session::SessionStore;
use crate::transport::{ReqwestTransport, Transport};

/// Session-aware client for the shop API gateway.
///
/// Every request issued through the client carries the current session's
/// credentials and every outcome is normalized into a payload or an
/// [`Error`](crate::Error).  Clones share the session, transport and logger.
#[derive(Clone)]
pub struct HttpClient {
    config: ClientConfig,
    session: SessionStore,
    transport: Arc<dyn Transport>,
    unwrapper: ResponseUnwrapper,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl HttpClient {
    /// Create a new client that talks to the gateway over HTTP.
    pub fn new(
        config: ClientConfig,
        session: SessionStore,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout)?;
        Ok(Self::with_transport(
            config,
            session,
            navigator,
            Arc::new(transport),
        ))
    }

    /// Create a new client over a custom transport.
    pub fn with_transport(
        config: ClientConfig,
        session: SessionStore,
        navigator: Arc<dyn Navigator>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let unwrapper = ResponseUnwrapper::new(session.clone(), navigator, &config.login_path);
        Self {
            config,
            session,
            transport,
            unwrapper,
            logger: None,
        }
    }

    /// Attach a logger that sees every request and outcome.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The client's configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The session this client authenticates with.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Send a request and return the gateway's payload unchanged.
    pub async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        self.dispatch(OutgoingRequest::new(method, path, body), Expiry::Enforce)
            .await
    }

    /// Like [`send`](Self::send), but gives up after `timeout`.
    pub async fn send_with_timeout(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        timeout: Duration,
    ) -> Result<Value> {
        self.dispatch(
            OutgoingRequest::new(method, path, body).with_timeout(timeout),
            Expiry::Enforce,
        )
        .await
    }

    /// Send a GET request.
    pub async fn get(&self, path: &str) -> Result<Value> {
        self.send(Method::Get, path, None).await
    }

    /// Send a POST request with a JSON body.
    pub async fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.send(Method::Post, path, Some(body)).await
    }

    /// Send a PUT request with a JSON body.
    pub async fn put(&self, path: &str, body: Value) -> Result<Value> {
        self.send(Method::Put, path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> Result<Value> {
        self.send(Method::Delete, path, None).await
    }

    /// Post credentials.  A 401/403 answer is returned as an auth failure
    /// but does not expire the session or redirect to login.
    pub(crate) async fn post_credentials(&self, path: &str, body: Value) -> Result<Value> {
        self.dispatch(
            OutgoingRequest::new(Method::Post, path, Some(body)),
            Expiry::Ignore,
        )
        .await
    }

    async fn dispatch(&self, request: OutgoingRequest, expiry: Expiry) -> Result<Value> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let url = self.config.endpoint(&request.path)?;
        let request = authenticate(request, &self.session.get());
        tracing::debug!(method = %request.method, path = %request.path, "sending request");
        if let Some(logger) = &self.logger {
            logger.log_request(&request);
        }

        let outcome = self.transport.execute(&url, &request).await;
        let result = match expiry {
            Expiry::Enforce => self.unwrapper.process(outcome),
            Expiry::Ignore => ResponseUnwrapper::normalize(outcome),
        };
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        if let Err(err) = &result {
            CLIENT_REQUEST_ERRORS.click();
            if err.is_network_failure() {
                CLIENT_NETWORK_FAILURES.click();
            }
            tracing::debug!(
                method = %request.method,
                path = %request.path,
                kind = %err.kind(),
                status = ?err.status_code(),
                "request failed"
            );
        }
        if let Some(logger) = &self.logger {
            logger.log_outcome(&request, &result);
        }
        result
    }
}

/// Whether an auth failure on a request ends the current session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Expiry {
    Enforce,
    Ignore,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("session", &self.session)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use futures::future::join_all;
    use serde_json::json;
    use url::Url;

    use crate::navigator::RecordingNavigator;
    use crate::request::AUTHORIZATION;
    use crate::response::TransportOutcome;
    use crate::session::Session;

    /// Replays scripted responses and remembers what it was asked to send.
    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<VecDeque<(u16, Value)>>,
        seen: Mutex<Vec<(Url, OutgoingRequest)>>,
        delay: Option<Duration>,
    }

    impl ScriptedTransport {
        fn replying(replies: impl IntoIterator<Item = (u16, Value)>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().collect()),
                ..Self::default()
            }
        }

        fn seen(&self) -> Vec<(Url, OutgoingRequest)> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Transport for ScriptedTransport {
        async fn execute(&self, url: &Url, request: &OutgoingRequest) -> TransportOutcome {
            self.seen
                .lock()
                .unwrap()
                .push((url.clone(), request.clone()));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match self.replies.lock().unwrap().pop_front() {
                Some((status, body)) => TransportOutcome::response(status, body),
                None => TransportOutcome::failure("connection reset"),
            }
        }
    }

    fn fixture(
        transport: Arc<ScriptedTransport>,
    ) -> (HttpClient, SessionStore, Arc<RecordingNavigator>) {
        let session = SessionStore::in_memory();
        let navigator = Arc::new(RecordingNavigator::new());
        let config = ClientConfig::new()
            .with_base_url("https://gateway.example.com/dev")
            .unwrap();
        let client =
            HttpClient::with_transport(config, session.clone(), navigator.clone(), transport);
        (client, session, navigator)
    }

    #[tokio::test]
    async fn authenticated_requests_carry_bearer_token() {
        let transport = Arc::new(ScriptedTransport::replying([(200, json!([]))]));
        let (client, session, _) = fixture(transport.clone());
        session.set("tok-9", None);

        client.get("/api/v1/orders/history").await.unwrap();

        let seen = transport.seen();
        assert_eq!(
            seen[0].0.as_str(),
            "https://gateway.example.com/dev/api/v1/orders/history"
        );
        assert_eq!(seen[0].1.header(AUTHORIZATION), Some("Bearer tok-9"));
        assert_eq!(seen[0].1.method, Method::Get);
    }

    #[tokio::test]
    async fn anonymous_requests_carry_no_authorization() {
        let transport = Arc::new(ScriptedTransport::replying([(200, json!({}))]));
        let (client, _, _) = fixture(transport.clone());

        client
            .post("/api/v1/reviews/submit", json!({"rating": 5}))
            .await
            .unwrap();

        let seen = transport.seen();
        assert_eq!(seen[0].1.header(AUTHORIZATION), None);
        assert_eq!(seen[0].1.body, Some(json!({"rating": 5})));
    }

    #[tokio::test]
    async fn success_payload_is_unchanged() {
        let body = json!({"data": {"orderId": 4}, "message": "created", "status": 201});
        let transport = Arc::new(ScriptedTransport::replying([(201, body.clone())]));
        let (client, _, _) = fixture(transport);

        let payload = client
            .send(Method::Post, "/api/v1/orders", Some(json!({"items": []})))
            .await
            .unwrap();
        assert_eq!(payload, body);
    }

    #[tokio::test]
    async fn timeout_is_attached_to_request() {
        let transport = Arc::new(ScriptedTransport::replying([(200, json!("ok"))]));
        let (client, _, _) = fixture(transport.clone());

        client
            .send_with_timeout(Method::Post, "chatbot", None, Duration::from_secs(20))
            .await
            .unwrap();
        assert_eq!(transport.seen()[0].1.timeout, Some(Duration::from_secs(20)));
    }

    #[tokio::test]
    async fn unauthorized_clears_session_and_redirects() {
        let transport = Arc::new(ScriptedTransport::replying([(401, json!({"error": "expired"}))]));
        let (client, session, navigator) = fixture(transport);
        session.set("stale", Some(json!({"id": 1})));

        let err = client.get("/api/v1/profile").await.unwrap_err();
        assert!(err.is_auth_failure());
        assert_eq!(err.status_code(), Some(401));
        assert_eq!(err.payload(), Some(&json!({"error": "expired"})));
        assert_eq!(session.get(), Session::empty());
        assert_eq!(navigator.visits(), vec!["/login"]);
    }

    #[tokio::test]
    async fn concurrent_auth_failures_redirect_once() {
        let transport = Arc::new(ScriptedTransport {
            replies: Mutex::new((0..8).map(|_| (403, Value::Null)).collect()),
            delay: Some(Duration::from_millis(5)),
            ..ScriptedTransport::default()
        });
        let (client, session, navigator) = fixture(transport);
        session.set("stale", None);

        let results = join_all((0..8).map(|i| {
            let client = client.clone();
            async move { client.get(&format!("/api/v1/products/{i}")).await }
        }))
        .await;

        assert!(results.iter().all(|r| r.as_ref().unwrap_err().is_auth_failure()));
        assert_eq!(session.get(), Session::empty());
        assert_eq!(navigator.count(), 1);
    }

    #[tokio::test]
    async fn transport_failure_is_network_failure() {
        let transport = Arc::new(ScriptedTransport::default());
        let (client, session, navigator) = fixture(transport);
        session.set("tok", None);

        let err = client.delete("/api/v1/cart/3").await.unwrap_err();
        assert!(err.is_network_failure());
        assert_eq!(err.status_code(), None);
        assert!(session.get().is_authenticated());
        assert_eq!(navigator.count(), 0);
    }

    #[tokio::test]
    async fn paths_outside_the_base_are_never_sent() {
        let transport = Arc::new(ScriptedTransport::replying([(200, json!({}))]));
        let (client, session, _) = fixture(transport.clone());
        session.set("secret", None);

        for path in ["https://attacker.example/steal", "../../other"] {
            let err = client.get(path).await.unwrap_err();
            assert!(err.is_client_error());
        }
        assert!(transport.seen().is_empty());
        assert!(session.get().is_authenticated());
    }

    #[tokio::test]
    async fn rejected_credentials_keep_session_and_do_not_redirect() {
        let transport = Arc::new(ScriptedTransport::replying([(401, json!({}))]));
        let (client, session, navigator) = fixture(transport.clone());
        session.set("earlier", None);

        let err = client
            .post_credentials("api/auth/login", json!({"username": "linh"}))
            .await
            .unwrap_err();
        assert!(err.is_auth_failure());
        assert_eq!(navigator.count(), 0);
        assert_eq!(session.get().token(), Some("earlier"));
    }

    #[tokio::test]
    async fn logger_sees_request_and_outcome() {
        #[derive(Default)]
        struct Captured {
            requests: Mutex<Vec<String>>,
            outcomes: Mutex<Vec<Option<u16>>>,
        }

        impl ClientLogger for Captured {
            fn log_request(&self, request: &OutgoingRequest) {
                self.requests
                    .lock()
                    .unwrap()
                    .push(format!("{} {}", request.method, request.path));
            }

            fn log_outcome(&self, _: &OutgoingRequest, outcome: &Result<Value>) {
                self.outcomes
                    .lock()
                    .unwrap()
                    .push(outcome.as_ref().err().and_then(|e| e.status_code()));
            }
        }

        let transport = Arc::new(ScriptedTransport::replying([
            (200, json!({})),
            (500, json!("boom")),
        ]));
        let logger = Arc::new(Captured::default());
        let (client, _, _) = fixture(transport);
        let client = client.with_logger(logger.clone());

        client.put("/api/v1/profile", json!({})).await.unwrap();
        assert!(client.get("/api/v1/dashboard").await.is_err());

        assert_eq!(
            *logger.requests.lock().unwrap(),
            vec!["PUT /api/v1/profile", "GET /api/v1/dashboard"]
        );
        assert_eq!(*logger.outcomes.lock().unwrap(), vec![None, Some(500)]);
    }

    #[test]
    fn client_creation() {
        let client = HttpClient::new(
            ClientConfig::new(),
            SessionStore::in_memory(),
            Arc::new(RecordingNavigator::new()),
        )
        .unwrap();
        assert_eq!(client.config().login_path, "/login");
        assert!(!client.session().get().is_authenticated());
    }
}
