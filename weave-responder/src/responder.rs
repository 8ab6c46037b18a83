//! The `Responder` trait — the sole non-trivial external boundary (§6.1).
//!
//! [`Responder`] uses RPITIT (return-position `impl Trait` in traits) and is
//! intentionally NOT object-safe, the same design the teacher's `Provider`
//! trait uses. The object-safe boundary agents actually store behind
//! `Arc<dyn ...>` is [`DynResponder`], erased via `async-trait` the same way
//! the teacher erases its object-safe protocol traits.

use crate::types::{ProviderRequest, ProviderResponse, StreamEvent};
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use tokio_stream::Stream;

/// Errors from LLM responders.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ResponderError {
    /// HTTP or network request failed.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// The transport rate-limited the request.
    #[error("rate limited")]
    RateLimited,

    /// The transport returned a bad status / auth failure.
    #[error("bad status: {0}")]
    BadStatus(String),

    /// Could not parse the transport's response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ResponderError {
    /// Whether retrying this request might succeed (teacher's
    /// `ProviderError::is_retryable` convention).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ResponderError::RateLimited | ResponderError::RequestFailed(_)
        )
    }
}

/// A pinned, boxed stream of responder events (§6.1: "a lazy finite
/// sequence... single-pass").
pub type ResponderStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// LLM transport interface (§6.1).
///
/// Each concrete backend (a test mock, or a vendor HTTP client built outside
/// this workspace) implements this trait. This trait uses RPITIT and is NOT
/// object-safe — that's intentional, matching the teacher's `Provider` trait.
/// The object-safe boundary the turn loop actually depends on is
/// [`DynResponder`].
pub trait Responder: Send + Sync {
    /// Non-streaming completion (§6.1 `respond`).
    fn respond(
        &self,
        request: ProviderRequest,
    ) -> impl Future<Output = Result<ProviderResponse, ResponderError>> + Send;

    /// Streaming completion (§6.1 `stream`). Default: synthesize a
    /// single-event stream from `respond`, for responders that don't support
    /// incremental deltas.
    fn stream(
        &self,
        request: ProviderRequest,
    ) -> impl Future<Output = Result<ResponderStream, ResponderError>> + Send {
        async move {
            let response = self.respond(request).await?;
            let events = tokio_stream::once(StreamEvent::Done(Box::new(response)));
            Ok(Box::pin(events) as ResponderStream)
        }
    }
}

/// Object-safe erasure of [`Responder`], so agents can hold heterogeneous
/// responders behind one `Arc<dyn DynResponder>` (§3.1, §9's identity note).
/// Any `Responder` gets this for free via the blanket impl below.
#[async_trait]
pub trait DynResponder: Send + Sync {
    /// Object-safe `respond`.
    async fn respond(&self, request: ProviderRequest) -> Result<ProviderResponse, ResponderError>;

    /// Object-safe `stream`.
    async fn stream(&self, request: ProviderRequest) -> Result<ResponderStream, ResponderError>;
}

#[async_trait]
impl<T: Responder> DynResponder for T {
    async fn respond(&self, request: ProviderRequest) -> Result<ProviderResponse, ResponderError> {
        Responder::respond(self, request).await
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ResponderStream, ResponderError> {
        Responder::stream(self, request).await
    }
}
