//! Request ID middleware.
//!
//! Assigns every request a UUID v7 so log lines emitted while processing it
//! (including parameter rejections) can be correlated. The ID is echoed in
//! the `X-Request-ID` response header.

use crate::context::{MiddlewareContext, RequestId};
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use http::HeaderValue;
use uuid::Uuid;

/// The header name for request ID propagation.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Middleware that generates or propagates request IDs.
///
/// By default incoming `X-Request-ID` headers are ignored; use
/// [`RequestIdMiddleware::trust_incoming`] behind a trusted proxy.
#[derive(Debug, Clone, Default)]
pub struct RequestIdMiddleware {
    trust_incoming: bool,
}

impl RequestIdMiddleware {
    /// Creates a middleware that always generates a fresh ID.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a middleware that reuses a valid incoming `X-Request-ID`.
    #[must_use]
    pub fn trust_incoming() -> Self {
        Self { trust_incoming: true }
    }

    fn incoming(&self, request: &Request) -> Option<RequestId> {
        if !self.trust_incoming {
            return None;
        }

        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .map(RequestId::from_uuid)
    }
}

impl Middleware for RequestIdMiddleware {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let request_id = self.incoming(&request).unwrap_or_else(RequestId::new);
            ctx.set_request_id(request_id);

            let mut response = next.run(ctx, request).await;

            if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseExt;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;

    fn request_with_id(id: Option<&str>) -> Request {
        let mut builder = http::Request::builder().uri("/test");
        if let Some(id) = id {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    async fn run(middleware: &RequestIdMiddleware, id: Option<&str>) -> (MiddlewareContext, String) {
        let mut ctx = MiddlewareContext::new();
        let next = Next::handler(|_ctx, _req| Box::pin(async { Response::json(StatusCode::OK, "ok") }));
        let response = middleware.process(&mut ctx, request_with_id(id), next).await;
        let header = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        (ctx, header)
    }

    #[tokio::test]
    async fn test_generates_id() {
        let (ctx, header) = run(&RequestIdMiddleware::new(), None).await;
        assert_eq!(ctx.request_id().to_string(), header);
    }

    #[tokio::test]
    async fn test_ignores_incoming_unless_trusted() {
        let incoming = "01234567-89ab-7def-8123-456789abcdef";

        let (_, header) = run(&RequestIdMiddleware::new(), Some(incoming)).await;
        assert_ne!(header, incoming);

        let (ctx, header) = run(&RequestIdMiddleware::trust_incoming(), Some(incoming)).await;
        assert_eq!(header, incoming);
        assert_eq!(ctx.request_id().to_string(), incoming);
    }

    #[tokio::test]
    async fn test_invalid_incoming_is_replaced() {
        let (_, header) = run(&RequestIdMiddleware::trust_incoming(), Some("not-a-uuid")).await;
        assert!(Uuid::parse_str(&header).is_ok());
    }
}
