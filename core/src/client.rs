//! `RequestClient`: HTTP verbs that always answer with a `ResponseEnvelope`.
//!
//! # Design
//! Every verb, blocking or async, funnels into one `execute` helper which
//! resets the last response, resolves the URI against the base URI, sends
//! the request, and normalizes the body. The normalized envelope is both
//! returned to the caller and kept as the client's last response for the
//! accessor methods.
//!
//! Transports are built lazily on first use unless one was supplied.
//! Interleaved calls on a shared client overwrite the last response; use the
//! returned envelope when a client is shared.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use serde_json::Value;
use url::Url;

use crate::config::ClientConfig;
use crate::envelope::{Code, ResponseEnvelope};
use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::interceptor::Intercepted;
use crate::options::RequestOptions;
use crate::transport::{AsyncTransport, ReqwestTransport, Transport, UreqTransport};

/// HTTP client returning normalized `{code, message, data}` envelopes.
pub struct RequestClient {
    config: ClientConfig,
    base_uri: Option<String>,
    transport: OnceLock<Arc<dyn Transport>>,
    async_transport: OnceLock<Arc<dyn AsyncTransport>>,
    last: Mutex<Option<ResponseEnvelope>>,
}

impl fmt::Debug for RequestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestClient")
            .field("base_uri", &self.base_uri)
            .field("transport_ready", &self.transport.get().is_some())
            .field("async_transport_ready", &self.async_transport.get().is_some())
            .field("last", &*self.last_slot())
            .finish()
    }
}

impl RequestClient {
    pub fn new(config: ClientConfig) -> Self {
        let base_uri = config.normalized_base_uri();
        Self {
            config,
            base_uri,
            transport: OnceLock::new(),
            async_transport: OnceLock::new(),
            last: Mutex::new(None),
        }
    }

    /// Use `transport` for blocking verbs instead of building one.
    ///
    /// The transport is not wrapped in debug interceptors and does not get
    /// the transport-level `timeout_secs`. Default headers and the user
    /// agent from `client_options` are part of each request, so they still
    /// reach it.
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        let transport: Arc<dyn Transport> = Arc::new(transport);
        self.transport = OnceLock::from(transport);
        self
    }

    /// Use `transport` for async verbs instead of building one.
    ///
    /// Same rules as [`RequestClient::with_transport`].
    pub fn with_async_transport(mut self, transport: impl AsyncTransport + 'static) -> Self {
        let transport: Arc<dyn AsyncTransport> = Arc::new(transport);
        self.async_transport = OnceLock::from(transport);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Base URI with its trailing slash normalized.
    pub fn base_uri(&self) -> Option<&str> {
        self.base_uri.as_deref()
    }

    // --- blocking verbs ---

    pub fn get(&self, uri: &str, options: RequestOptions) -> Result<ResponseEnvelope, TransportError> {
        self.execute(HttpMethod::Get, uri, options)
    }

    pub fn head(&self, uri: &str, options: RequestOptions) -> Result<ResponseEnvelope, TransportError> {
        self.execute(HttpMethod::Head, uri, options)
    }

    pub fn put(&self, uri: &str, options: RequestOptions) -> Result<ResponseEnvelope, TransportError> {
        self.execute(HttpMethod::Put, uri, options)
    }

    pub fn post(&self, uri: &str, options: RequestOptions) -> Result<ResponseEnvelope, TransportError> {
        self.execute(HttpMethod::Post, uri, options)
    }

    pub fn patch(&self, uri: &str, options: RequestOptions) -> Result<ResponseEnvelope, TransportError> {
        self.execute(HttpMethod::Patch, uri, options)
    }

    pub fn delete(&self, uri: &str, options: RequestOptions) -> Result<ResponseEnvelope, TransportError> {
        self.execute(HttpMethod::Delete, uri, options)
    }

    /// Blocking call with an explicit method.
    pub fn request(
        &self,
        method: HttpMethod,
        uri: &str,
        options: RequestOptions,
    ) -> Result<ResponseEnvelope, TransportError> {
        self.execute(method, uri, options)
    }

    // --- async verbs ---

    pub async fn get_async(&self, uri: &str, options: RequestOptions) -> Result<ResponseEnvelope, TransportError> {
        self.execute_async(HttpMethod::Get, uri, options).await
    }

    pub async fn head_async(&self, uri: &str, options: RequestOptions) -> Result<ResponseEnvelope, TransportError> {
        self.execute_async(HttpMethod::Head, uri, options).await
    }

    pub async fn put_async(&self, uri: &str, options: RequestOptions) -> Result<ResponseEnvelope, TransportError> {
        self.execute_async(HttpMethod::Put, uri, options).await
    }

    pub async fn post_async(&self, uri: &str, options: RequestOptions) -> Result<ResponseEnvelope, TransportError> {
        self.execute_async(HttpMethod::Post, uri, options).await
    }

    pub async fn patch_async(&self, uri: &str, options: RequestOptions) -> Result<ResponseEnvelope, TransportError> {
        self.execute_async(HttpMethod::Patch, uri, options).await
    }

    pub async fn delete_async(&self, uri: &str, options: RequestOptions) -> Result<ResponseEnvelope, TransportError> {
        self.execute_async(HttpMethod::Delete, uri, options).await
    }

    /// Async call with an explicit method.
    pub async fn request_async(
        &self,
        method: HttpMethod,
        uri: &str,
        options: RequestOptions,
    ) -> Result<ResponseEnvelope, TransportError> {
        self.execute_async(method, uri, options).await
    }

    // --- last response accessors ---

    /// Clear the last response.
    pub fn reset(&self) {
        *self.last_slot() = None;
    }

    /// Code of the last response, `Failure` when there is none.
    pub fn code(&self) -> Code {
        self.last_slot()
            .as_ref()
            .map(ResponseEnvelope::code)
            .unwrap_or_default()
    }

    pub fn has_error(&self) -> bool {
        self.code() != Code::Success
    }

    /// Message of the last response.
    pub fn error(&self) -> Option<String> {
        self.last_slot().as_ref().and_then(|env| env.message.clone())
    }

    /// Payload of the last response.
    pub fn data(&self) -> Option<Value> {
        self.last_slot().as_ref().and_then(|env| env.data().cloned())
    }

    /// The whole last response.
    pub fn response(&self) -> Option<ResponseEnvelope> {
        self.last_slot().clone()
    }

    // --- internals ---

    fn execute(
        &self,
        method: HttpMethod,
        uri: &str,
        options: RequestOptions,
    ) -> Result<ResponseEnvelope, TransportError> {
        self.reset();
        let request = self.prepare(method, uri, options)?;
        let response = self.transport().send(request).inspect_err(|e| {
            tracing::warn!(%method, uri, error = %e, "transport fault");
        })?;
        Ok(self.finish(method, uri, &response))
    }

    async fn execute_async(
        &self,
        method: HttpMethod,
        uri: &str,
        options: RequestOptions,
    ) -> Result<ResponseEnvelope, TransportError> {
        self.reset();
        let request = self.prepare(method, uri, options)?;
        let response = self.async_transport()?.send(request).await.inspect_err(|e| {
            tracing::warn!(%method, uri, error = %e, "transport fault");
        })?;
        Ok(self.finish(method, uri, &response))
    }

    fn prepare(
        &self,
        method: HttpMethod,
        uri: &str,
        options: RequestOptions,
    ) -> Result<HttpRequest, TransportError> {
        let url = self.resolve(uri)?;
        tracing::debug!(%method, %url, "dispatching request");
        Ok(options.into_request(method, url, &self.config.client_options))
    }

    fn finish(&self, method: HttpMethod, uri: &str, response: &HttpResponse) -> ResponseEnvelope {
        let envelope = match ResponseEnvelope::parse(&response.body) {
            Some(envelope) => {
                if envelope.has_error() {
                    tracing::debug!(
                        %method,
                        uri,
                        status = response.status,
                        remote_message = envelope.error().unwrap_or_default(),
                        "remote reported failure"
                    );
                }
                envelope
            }
            None => {
                tracing::warn!(
                    %method,
                    uri,
                    status = response.status,
                    body_len = response.body.len(),
                    "response body is not an envelope"
                );
                ResponseEnvelope::malformed(&response.body)
            }
        };
        *self.last_slot() = Some(envelope.clone());
        envelope
    }

    /// Resolve `uri` against the base URI. Absolute URIs pass through.
    fn resolve(&self, uri: &str) -> Result<Url, TransportError> {
        match &self.base_uri {
            Some(base) => Ok(Url::parse(base)?.join(uri)?),
            None => Ok(Url::parse(uri)?),
        }
    }

    fn transport(&self) -> &dyn Transport {
        self.transport
            .get_or_init(|| {
                let options = self.config.client_options.merged();
                let transport = UreqTransport::new(&options);
                let transport: Arc<dyn Transport> = if self.config.debug_enabled() {
                    Arc::new(Intercepted::tracing(transport))
                } else {
                    Arc::new(transport)
                };
                transport
            })
            .as_ref()
    }

    fn async_transport(&self) -> Result<&dyn AsyncTransport, TransportError> {
        if let Some(transport) = self.async_transport.get() {
            return Ok(transport.as_ref());
        }
        let options = self.config.client_options.merged();
        let transport = ReqwestTransport::new(&options)?;
        let transport: Arc<dyn AsyncTransport> = if self.config.debug_enabled() {
            Arc::new(Intercepted::tracing(transport))
        } else {
            Arc::new(transport)
        };
        Ok(self.async_transport.get_or_init(|| transport).as_ref())
    }

    fn last_slot(&self) -> MutexGuard<'_, Option<ResponseEnvelope>> {
        self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
