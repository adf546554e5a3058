//! Response Headers Middleware
//!
//! Every view is a public, read-only mirror page, so successful responses
//! are marked cacheable for crawlers and shared proxies, while errors
//! (which are retryable) are never cached. Baseline hardening headers are
//! added to everything.

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, Response},
};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tower::{Layer, Service};

/// Response header configuration
#[derive(Clone, Debug)]
pub struct ViewHeadersConfig {
    /// `max-age` for successful responses, in seconds
    pub cache_max_age: u64,
    /// Referrer-Policy value
    pub referrer_policy: &'static str,
}

impl Default for ViewHeadersConfig {
    fn default() -> Self {
        Self {
            // Matches the forward sync period, so a cached page is at most
            // one sync behind.
            cache_max_age: 60,
            referrer_policy: "strict-origin-when-cross-origin",
        }
    }
}

/// Layer that adds view headers to responses
#[derive(Clone, Default)]
pub struct ViewHeadersLayer {
    config: ViewHeadersConfig,
}

impl ViewHeadersLayer {
    pub fn with_config(config: ViewHeadersConfig) -> Self {
        Self { config }
    }
}

impl<S> Layer<S> for ViewHeadersLayer {
    type Service = ViewHeadersMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ViewHeadersMiddleware {
            inner,
            config: self.config.clone(),
        }
    }
}

/// Middleware service that adds view headers
#[derive(Clone)]
pub struct ViewHeadersMiddleware<S> {
    inner: S,
    config: ViewHeadersConfig,
}

impl<S> Service<Request<Body>> for ViewHeadersMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let config = self.config.clone();

        Box::pin(async move {
            let mut response = inner.call(request).await?;
            let cacheable = response.status().is_success();
            let headers = response.headers_mut();

            headers.insert(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            );
            headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
            headers.insert(
                header::REFERRER_POLICY,
                HeaderValue::from_static(config.referrer_policy),
            );

            if !headers.contains_key(header::CACHE_CONTROL) {
                let value = if cacheable {
                    HeaderValue::from_str(&format!("public, max-age={}", config.cache_max_age))
                        .unwrap_or_else(|_| HeaderValue::from_static("no-cache"))
                } else {
                    HeaderValue::from_static("no-store")
                };
                headers.insert(header::CACHE_CONTROL, value);
            }

            Ok(response)
        })
    }
}

/// Create the view headers layer, caching successful pages for `cache_max_age` seconds
pub fn create_view_headers_layer(cache_max_age: u64) -> ViewHeadersLayer {
    ViewHeadersLayer::with_config(ViewHeadersConfig {
        cache_max_age,
        ..Default::default()
    })
}
