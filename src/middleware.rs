//! Tower middleware that meters requests through a [`QuotaGuard`].
//!
//! Every request passes through [`QuotaGuard::api_call_with_token`] before it
//! reaches the wrapped service. Rejections never touch the inner service.
//!
//! ```rust
//! use std::convert::Infallible;
//! use tierguard::{Authorization, CallerIdentity, InMemoryQuotaStore, QuotaGuard, QuotaLayer, QuotaRequest};
//! use tower::{service_fn, Layer, ServiceExt};
//!
//! struct Analyze {
//!     caller: CallerIdentity,
//!     token: String,
//! }
//!
//! impl QuotaRequest for Analyze {
//!     fn caller(&self) -> CallerIdentity {
//!         self.caller.clone()
//!     }
//!     fn anonymous_token(&self) -> &str {
//!         &self.token
//!     }
//!     fn operation(&self) -> &str {
//!         "analyze"
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let guard = QuotaGuard::new(InMemoryQuotaStore::new());
//! let svc = QuotaLayer::new(guard)
//!     .layer(service_fn(|_req: Analyze| async { Ok::<_, Infallible>("done") }));
//!
//! let req = Analyze { caller: CallerIdentity::anonymous(), token: "tok12345".into() };
//! assert_eq!(svc.oneshot(req).await.unwrap(), "done");
//! # }
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tower_layer::Layer;
use tower_service::Service;

use crate::error::QuotaError;
use crate::guard::QuotaGuard;
use crate::identity::CallerIdentity;
use crate::model::Authorization;
use crate::store::QuotaStore;
use crate::telemetry::{NullSink, QuotaEvent, QuotaSink};

/// What the middleware needs to know about a request.
pub trait QuotaRequest {
    /// Who is calling. Use [`CallerIdentity::anonymous`] for callers without
    /// a stable identity.
    fn caller(&self) -> CallerIdentity;

    /// Client token counted against the anonymous lifetime cap. Ignored for
    /// identified callers.
    fn anonymous_token(&self) -> &str;

    /// Name of the metered operation.
    fn operation(&self) -> &str;

    /// Called with the decision before the request is forwarded.
    fn on_authorized(&mut self, _auth: &Authorization) {}
}

/// Error returned by [`QuotaService`].
#[derive(Debug)]
pub enum GuardError<E> {
    /// The guard refused the request; the inner service was not called.
    Rejected(QuotaError),
    /// The inner service failed.
    Inner(E),
}

impl<E> GuardError<E> {
    /// The guard's refusal, if that is what this is.
    pub fn rejection(&self) -> Option<&QuotaError> {
        match self {
            Self::Rejected(err) => Some(err),
            Self::Inner(_) => None,
        }
    }

    /// Unwrap the inner service error, if any.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Inner(err) => Some(err),
            Self::Rejected(_) => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for GuardError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(err) => write!(f, "request rejected [{}]: {}", err.code(), err),
            Self::Inner(err) => write!(f, "{}", err),
        }
    }
}

impl<E> std::error::Error for GuardError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Rejected(err) => Some(err),
            Self::Inner(err) => Some(err),
        }
    }
}

/// Layer that wraps a service in a [`QuotaService`].
pub struct QuotaLayer<S, K = NullSink> {
    guard: QuotaGuard<S, K>,
}

impl<S, K: Clone> Clone for QuotaLayer<S, K> {
    fn clone(&self) -> Self {
        Self { guard: self.guard.clone() }
    }
}

impl<S, K> fmt::Debug for QuotaLayer<S, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuotaLayer").field("guard", &self.guard).finish()
    }
}

impl<S, K> QuotaLayer<S, K> {
    pub fn new(guard: QuotaGuard<S, K>) -> Self {
        Self { guard }
    }
}

impl<Inner, S, K: Clone> Layer<Inner> for QuotaLayer<S, K> {
    type Service = QuotaService<Inner, S, K>;

    fn layer(&self, inner: Inner) -> Self::Service {
        QuotaService { inner, guard: self.guard.clone() }
    }
}

/// Middleware service that consults the guard before forwarding.
pub struct QuotaService<Inner, S, K = NullSink> {
    inner: Inner,
    guard: QuotaGuard<S, K>,
}

impl<Inner: Clone, S, K: Clone> Clone for QuotaService<Inner, S, K> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone(), guard: self.guard.clone() }
    }
}

impl<Inner: fmt::Debug, S, K> fmt::Debug for QuotaService<Inner, S, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuotaService")
            .field("inner", &self.inner)
            .field("guard", &self.guard)
            .finish()
    }
}

impl<Inner, S, K, Req> Service<Req> for QuotaService<Inner, S, K>
where
    Inner: Service<Req> + Clone + Send + 'static,
    Inner::Future: Send + 'static,
    S: QuotaStore + 'static,
    K: QuotaSink + Sync,
    <K as Service<QuotaEvent>>::Future: Send + 'static,
    Req: QuotaRequest + Send + 'static,
{
    type Response = Inner::Response;
    type Error = GuardError<Inner::Error>;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(GuardError::Inner)
    }

    fn call(&mut self, mut req: Req) -> Self::Future {
        // Keep the instance that was driven to readiness.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let guard = self.guard.clone();

        Box::pin(async move {
            let caller = req.caller();
            let token = req.anonymous_token().to_owned();
            let operation = req.operation().to_owned();
            let auth = guard
                .api_call_with_token(&caller, &token, &operation)
                .await
                .map_err(GuardError::Rejected)?;
            req.on_authorized(&auth);
            inner.call(req).await.map_err(GuardError::Inner)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryQuotaStore;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::{service_fn, ServiceExt};

    struct Req {
        caller: CallerIdentity,
        token: &'static str,
        seen: Option<Authorization>,
    }

    impl QuotaRequest for Req {
        fn caller(&self) -> CallerIdentity {
            self.caller.clone()
        }
        fn anonymous_token(&self) -> &str {
            self.token
        }
        fn operation(&self) -> &str {
            "summarize"
        }
        fn on_authorized(&mut self, auth: &Authorization) {
            self.seen = Some(auth.clone());
        }
    }

    fn anon(token: &'static str) -> Req {
        Req { caller: CallerIdentity::anonymous(), token, seen: None }
    }

    #[tokio::test]
    async fn rejection_short_circuits_inner() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let inner = service_fn(move |req: Req| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, Infallible>(req.seen) }
        });
        let svc = QuotaLayer::new(QuotaGuard::new(InMemoryQuotaStore::new())).layer(inner);

        for n in 1..=3 {
            let seen = svc.clone().oneshot(anon("tokZZZZZ")).await.unwrap();
            assert_eq!(seen, Some(Authorization::Anonymous { usage: n, cap: 3 }));
        }
        let err = svc.clone().oneshot(anon("tokZZZZZ")).await.unwrap_err();
        assert!(err.rejection().unwrap().is_quota_exceeded());
        assert!(err.to_string().contains("QUOTA_EXCEEDED"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn inner_errors_pass_through() {
        let guard = QuotaGuard::new(InMemoryQuotaStore::new());
        guard.login(&"alice".into()).await.unwrap();
        let inner = service_fn(|_req: Req| async {
            Err::<(), _>(std::io::Error::new(std::io::ErrorKind::Other, "backend down"))
        });
        let svc = QuotaLayer::new(guard.clone()).layer(inner);

        let req = Req { caller: "alice".into(), token: "", seen: None };
        let err = svc.oneshot(req).await.unwrap_err();
        assert!(err.rejection().is_none());
        assert_eq!(err.into_inner().unwrap().to_string(), "backend down");
        // The call was still counted: the guard authorized it.
        assert_eq!(guard.get_quota_status(&"alice".into()).await.unwrap().daily_usage, 1);
    }
}
