//! Request/response observers installed around a transport.
//!
//! Interceptors receive shared references, so they can record traffic but
//! never change it. The tracing pair is only installed while the
//! process-wide debug flag is on; with the flag off the transport is used
//! unwrapped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::LazyLock;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{AsyncTransport, Transport};

/// Environment variable that seeds the debug flag.
pub const DEBUG_ENV: &str = "ENVELOPE_CLIENT_DEBUG";

static DEBUG: LazyLock<AtomicBool> = LazyLock::new(|| {
    let enabled = std::env::var(DEBUG_ENV)
        .map(|value| parse_flag(&value))
        .unwrap_or(false);
    AtomicBool::new(enabled)
});

/// Whether debug tracing is enabled for this process.
pub fn debug_enabled() -> bool {
    DEBUG.load(Ordering::Relaxed)
}

/// Turn debug tracing on or off for transports constructed afterwards.
pub fn set_debug_enabled(enabled: bool) {
    DEBUG.store(enabled, Ordering::Relaxed);
}

pub(crate) fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Observer of traffic passing through a transport.
pub trait Interceptor: Send + Sync {
    fn on_request(&self, _request: &HttpRequest) {}

    fn on_response(&self, _response: &HttpResponse) {}
}

/// Records every request and response with `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingInterceptor;

impl Interceptor for TracingInterceptor {
    fn on_request(&self, request: &HttpRequest) {
        tracing::debug!(
            target: "envelope_client::request",
            method = %request.method,
            url = %request.url,
            headers = ?request.headers,
            body = request.body.as_deref().unwrap_or_default(),
            "outgoing request"
        );
    }

    fn on_response(&self, response: &HttpResponse) {
        tracing::debug!(
            target: "envelope_client::response",
            status = response.status,
            headers = ?response.headers,
            body = %response.body,
            "incoming response"
        );
    }
}

/// A transport wrapped in an interceptor chain.
pub struct Intercepted<T> {
    inner: T,
    chain: Vec<Box<dyn Interceptor>>,
}

impl<T> Intercepted<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            chain: Vec::new(),
        }
    }

    /// Chain holding the request logger and response logger.
    pub fn tracing(inner: T) -> Self {
        Self::new(inner).with(TracingInterceptor)
    }

    pub fn with(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.chain.push(Box::new(interceptor));
        self
    }

    fn before(&self, request: &HttpRequest) {
        for interceptor in &self.chain {
            interceptor.on_request(request);
        }
    }

    fn after(&self, response: &HttpResponse) {
        for interceptor in &self.chain {
            interceptor.on_response(response);
        }
    }
}

impl<T: Transport> Transport for Intercepted<T> {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.before(&request);
        let response = self.inner.send(request)?;
        self.after(&response);
        Ok(response)
    }
}

#[async_trait]
impl<T: AsyncTransport> AsyncTransport for Intercepted<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.before(&request);
        let response = self.inner.send(request).await?;
        self.after(&response);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::http::HttpMethod;

    #[derive(Default, Clone)]
    struct Recorder {
        requests: Arc<Mutex<Vec<HttpRequest>>>,
        responses: Arc<Mutex<Vec<HttpResponse>>>,
    }

    impl Interceptor for Recorder {
        fn on_request(&self, request: &HttpRequest) {
            self.requests.lock().unwrap().push(request.clone());
        }

        fn on_response(&self, response: &HttpResponse) {
            self.responses.lock().unwrap().push(response.clone());
        }
    }

    struct Echo;

    impl Transport for Echo {
        fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            Ok(HttpResponse {
                status: 201,
                headers: vec![("x-method".to_string(), request.method.to_string())],
                body: request.body.unwrap_or_default(),
            })
        }
    }

    struct Refuse;

    impl Transport for Refuse {
        fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            Err(TransportError::Connection("refused".to_string()))
        }
    }

    fn request() -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            url: "http://localhost/items".to_string(),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(r#"{"code":0}"#.to_string()),
        }
    }

    #[test]
    fn chain_observes_without_altering() {
        let recorder = Recorder::default();
        let transport = Intercepted::tracing(Echo).with(recorder.clone());

        let response = Transport::send(&transport, request()).unwrap();

        assert_eq!(response.status, 201);
        assert_eq!(response.body, r#"{"code":0}"#);
        assert_eq!(recorder.requests.lock().unwrap().as_slice(), &[request()]);
        assert_eq!(recorder.responses.lock().unwrap().as_slice(), &[response]);
    }

    #[test]
    fn transport_fault_skips_response_hooks() {
        let recorder = Recorder::default();
        let transport = Intercepted::new(Refuse).with(recorder.clone());

        let err = Transport::send(&transport, request()).unwrap_err();

        assert!(matches!(err, TransportError::Connection(_)));
        assert_eq!(recorder.requests.lock().unwrap().len(), 1);
        assert!(recorder.responses.lock().unwrap().is_empty());
    }

    #[test]
    fn debug_flag_values() {
        assert!(parse_flag("1"));
        assert!(parse_flag(" TRUE "));
        assert!(parse_flag("on"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
        assert!(!parse_flag("debug"));
    }
}
