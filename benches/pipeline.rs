use axum::{Router, body::Body, http::Request, routing::post};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use ledgergate::finance::contracts;
use ledgergate::organizations::MembershipResolver;
use ledgergate::pipeline::{Ctx, Gate, Pipeline, RawRequest};
use ledgergate::testing::{OrgFixture, TestTokens};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

struct Setup {
    fixture: OrgFixture,
    token: String,
    pipeline: Pipeline,
}

fn setup() -> Setup {
    let fixture = OrgFixture::seeded();
    let tokens = TestTokens::default();
    let token = tokens.for_user(&fixture.owner);
    let resolver = MembershipResolver::new(
        Arc::new(fixture.store.clone()),
        Arc::new(fixture.store.clone()),
    );
    let pipeline = Pipeline::new(Arc::new(tokens.verifier()), resolver);
    Setup {
        fixture,
        token,
        pipeline,
    }
}

// Plain handler, no checks
fn unguarded() -> Router {
    Router::new().route(
        "/organizations/{orgId}/accounts",
        post(|| async { "ok" }),
    )
}

// Same route behind the full pipeline
fn guarded(setup: &Setup) -> Router {
    let gate = Gate::new(setup.pipeline.clone());
    Router::new().route(
        "/organizations/{orgId}/accounts",
        gate.guard(post(|Ctx(_ctx): Ctx| async { "ok" }), contracts::create_account()),
    )
}

async fn make_request(router: &Router, path: &str, token: &str) {
    let req = Request::builder()
        .method("POST")
        .uri(path)
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from(r#"{"name":"Checking","currency":"EUR"}"#))
        .unwrap();

    let _response = router.clone().oneshot(req).await.unwrap();
}

fn benchmark_guard_overhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("guard_overhead");
    let setup = setup();
    let path = setup.fixture.path("/accounts");

    let raw_router = unguarded();
    let guarded_router = guarded(&setup);

    let rt = tokio::runtime::Runtime::new().unwrap();

    group.bench_function("unguarded", |b| {
        b.to_async(&rt)
            .iter(|| make_request(black_box(&raw_router), &path, &setup.token));
    });

    group.bench_function("guarded", |b| {
        b.to_async(&rt)
            .iter(|| make_request(black_box(&guarded_router), &path, &setup.token));
    });

    group.finish();
}

fn benchmark_pipeline_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_run");
    let setup = setup();
    let contract = contracts::create_account();
    let rt = tokio::runtime::Runtime::new().unwrap();

    let request = RawRequest::new()
        .bearer(&setup.token)
        .path_param("orgId", setup.fixture.org.id.to_string())
        .json(json!({"name": "Checking", "type": "SAVINGS", "currency": "EUR"}));

    group.bench_function("create_account_pass", |b| {
        b.to_async(&rt).iter(|| async {
            let ctx = setup.pipeline.run(&contract, black_box(request.clone())).await;
            black_box(ctx.is_ok())
        });
    });

    let outsider = TestTokens::default().for_user(&setup.fixture.outsider);
    let refused = RawRequest::new()
        .bearer(&outsider)
        .path_param("orgId", setup.fixture.org.id.to_string());

    group.bench_function("non_member_refusal", |b| {
        b.to_async(&rt).iter(|| async {
            let ctx = setup.pipeline.run(&contract, black_box(refused.clone())).await;
            black_box(ctx.is_err())
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_guard_overhead, benchmark_pipeline_run);
criterion_main!(benches);
