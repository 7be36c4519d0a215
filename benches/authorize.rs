use criterion::{black_box, criterion_group, criterion_main, Criterion};
use futures::future::Ready;
use std::convert::Infallible;
use tierguard::{CallerIdentity, InMemoryQuotaStore, QuotaGuard, QuotaLayer, QuotaRequest, Tier};
use tower::{Service, ServiceBuilder};

// A request carrying just enough to be metered.
struct Call {
    caller: CallerIdentity,
    token: &'static str,
}

impl QuotaRequest for Call {
    fn caller(&self) -> CallerIdentity {
        self.caller.clone()
    }
    fn anonymous_token(&self) -> &str {
        self.token
    }
    fn operation(&self) -> &str {
        "bench"
    }
}

#[derive(Clone)]
struct EchoService;

impl Service<Call> for EchoService {
    type Response = ();
    type Error = Infallible;
    type Future = Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, _req: Call) -> Self::Future {
        futures::future::ready(Ok(()))
    }
}

fn premium_guard(rt: &tokio::runtime::Runtime) -> QuotaGuard<InMemoryQuotaStore> {
    let guard = QuotaGuard::new(InMemoryQuotaStore::new());
    rt.block_on(async {
        let id = CallerIdentity::from("bench-user");
        guard.login(&id).await.unwrap();
        guard.upgrade_tier(&id, Tier::Premium).await.unwrap();
    });
    guard
}

fn authorize_identified(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let guard = premium_guard(&rt);
    let id = CallerIdentity::from("bench-user");

    c.bench_function("authorize_identified_premium", |b| {
        b.to_async(&rt).iter(|| async {
            let _ = black_box(guard.api_call_with_token(&id, "", black_box("bench")).await);
        });
    });
}

fn authorize_rejected_anonymous(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let guard = QuotaGuard::new(InMemoryQuotaStore::new());
    let anon = CallerIdentity::anonymous();
    rt.block_on(async {
        for _ in 0..3 {
            guard.api_call_with_token(&anon, "exhausted", "bench").await.unwrap();
        }
    });

    c.bench_function("authorize_anonymous_exhausted", |b| {
        b.to_async(&rt).iter(|| async {
            let _ = black_box(guard.api_call_with_token(&anon, "exhausted", "bench").await);
        });
    });
}

fn middleware_overhead(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let guard = premium_guard(&rt);
    let svc = ServiceBuilder::new().layer(QuotaLayer::new(guard)).service(EchoService);

    c.bench_function("quota_layer_premium_call", |b| {
        b.to_async(&rt).iter(|| async {
            let mut local_svc = svc.clone();
            let req = Call { caller: CallerIdentity::from("bench-user"), token: "" };
            let _ = black_box(local_svc.call(black_box(req))).await;
        });
    });
}

criterion_group!(benches, authorize_identified, authorize_rejected_anonymous, middleware_overhead);
criterion_main!(benches);
