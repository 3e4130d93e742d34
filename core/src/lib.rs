//! HTTP client wrapper that normalizes every response into a
//! `{code, message, data}` envelope.
//!
//! # Overview
//! `RequestClient` forwards `get`/`head`/`put`/`post`/`patch`/`delete` (and
//! their `_async` variants) to a transport, parses the body as a JSON object,
//! and coerces `code` to `Code::Success` (0) or `Code::Failure` (1). Callers
//! branch on `ResponseEnvelope::is_success` and read `error()` / `data()`
//! for detail; only transport faults come back as `Err`.
//!
//! # Design
//! - Transports sit behind the `Transport` / `AsyncTransport` traits. The
//!   default ones (ureq, reqwest) are built lazily and never raise on HTTP
//!   error statuses.
//! - Debug tracing is an interceptor pair installed only when the debug flag
//!   is on.
//! - Each call returns its own envelope; the client also keeps the last one
//!   for the accessor methods.

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod naming;
pub mod options;
pub mod transport;

pub use client::RequestClient;
pub use config::{normalize_base_uri, ClientConfig};
pub use envelope::{Code, ResponseEnvelope};
pub use error::{ConfigError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use interceptor::{debug_enabled, set_debug_enabled, Intercepted, Interceptor, TracingInterceptor};
pub use naming::{component_name, component_name_of};
pub use options::{Body, ClientOptions, RequestOptions};
pub use transport::{AsyncTransport, ReqwestTransport, Transport, UreqTransport};
