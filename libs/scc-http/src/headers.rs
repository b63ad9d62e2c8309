use crate::error::HttpError;
use http::header::{HeaderName, HeaderValue};
use http::{Request, Response};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower layer that fills in headers the caller did not set
///
/// Used for `User-Agent` and `Accept`. A header already present on the
/// request always wins.
#[derive(Clone)]
pub struct DefaultHeadersLayer {
    defaults: Arc<[(HeaderName, HeaderValue)]>,
}

impl DefaultHeadersLayer {
    /// Create a layer from `(name, value)` pairs
    ///
    /// # Errors
    /// Returns `HttpError::InvalidHeaderName` or `HttpError::InvalidHeaderValue`
    /// if any pair is not a valid header.
    pub fn try_new<'a, I>(defaults: I) -> Result<Self, HttpError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let defaults = defaults
            .into_iter()
            .map(|(name, value)| {
                Ok((
                    HeaderName::try_from(name)?,
                    HeaderValue::try_from(value)?,
                ))
            })
            .collect::<Result<Vec<_>, HttpError>>()?;
        Ok(Self {
            defaults: defaults.into(),
        })
    }
}

impl<S> Layer<S> for DefaultHeadersLayer {
    type Service = DefaultHeadersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DefaultHeadersService {
            inner,
            defaults: Arc::clone(&self.defaults),
        }
    }
}

/// Service produced by [`DefaultHeadersLayer`]
#[derive(Clone)]
pub struct DefaultHeadersService<S> {
    inner: S,
    defaults: Arc<[(HeaderName, HeaderValue)]>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for DefaultHeadersService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        for (name, value) in self.defaults.iter() {
            if !req.headers().contains_key(name) {
                req.headers_mut().insert(name.clone(), value.clone());
            }
        }
        self.inner.call(req)
    }
}
