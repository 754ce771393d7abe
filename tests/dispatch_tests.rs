//! Dispatch semantics: matching, ordering, error recovery and after-middleware.

use axum::body::Bytes;
use axum::http::{header, Method, Request, StatusCode};
use hyper::ext::ReasonPhrase;
use futures_util::future::BoxFuture;
use microroute::http::{Handle, MatchedRoute};
use microroute::middleware::BoxedMiddleware;
use microroute::{
    ErrorKind, ErrorMatch, Middleware, Next, RequestContext, RouteError, RouteResult, Router, RouterBuilder,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

mod common;

use common::{body_text, request};

type Log = Arc<Mutex<Vec<String>>>;

/// Append a middleware that logs `name:enter` and `name:exit` around `next`.
fn traced(builder: RouterBuilder, log: &Log, name: &'static str) -> RouterBuilder {
    let log = log.clone();
    builder.with(move |ctx, next| {
        let log = log.clone();
        Box::pin(async move {
            log.lock().unwrap().push(format!("{}:enter", name));
            let result = next.run(ctx).await;
            log.lock().unwrap().push(format!("{}:exit", name));
            result
        })
    })
}

/// Struct middleware that records its name and a response header before continuing.
struct Tag {
    name: &'static str,
    log: Log,
}

impl Middleware for Tag {
    fn call<'a>(&'a self, ctx: &'a mut RequestContext, next: Next<'a>) -> BoxFuture<'a, RouteResult<()>> {
        Box::pin(async move {
            self.log.lock().unwrap().push(self.name.to_string());
            ctx.header("x-last-tag", self.name)?;
            next.run(ctx).await
        })
    }
}

fn tag(log: &Log, name: &'static str) -> Tag {
    Tag {
        name,
        log: log.clone(),
    }
}

fn counting(builder: RouterBuilder, counter: &Arc<AtomicUsize>) -> RouterBuilder {
    let counter = counter.clone();
    builder.with(move |ctx, next| {
        counter.fetch_add(1, Ordering::SeqCst);
        next.run(ctx)
    })
}

fn failing(builder: RouterBuilder, kind: ErrorKind) -> RouterBuilder {
    builder.with(move |_ctx, _next| Box::pin(async move { Err(RouteError::new(kind, "boom")) }))
}

#[tokio::test]
async fn test_end_to_end_ping() {
    let router = Router::builder()
        .group("/api")
        .on(Method::GET, "/ping")
        .with(|ctx, next| {
            Box::pin(async move {
                ctx.text("pong");
                next.run(ctx).await
            })
        })
        .build()
        .unwrap();

    let response = router.handle(request(Method::GET, "/api/ping")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");
    assert_eq!(
        response.extensions().get::<MatchedRoute>(),
        Some(&MatchedRoute("/api/ping".into()))
    );
    assert_eq!(body_text(response).await, "pong");
}

#[tokio::test]
async fn test_structured_body_is_json() {
    let router = Router::builder()
        .get("/users/:id/posts/:postId")
        .with(|ctx, next| {
            Box::pin(async move {
                let body = serde_json::json!({
                    "id": ctx.param("id"),
                    "postId": ctx.param("postId"),
                });
                ctx.set_json(&body)?;
                next.run(ctx).await
            })
        })
        .build()
        .unwrap();

    let response = router.handle(request(Method::GET, "/users/42/posts/7")).await.unwrap();

    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body, serde_json::json!({"id": "42", "postId": "7"}));
}

#[tokio::test]
async fn test_untouched_response_is_empty_object() {
    let router = Router::builder().get("/noop").build().unwrap();

    let response = router.handle(request(Method::GET, "/noop")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "{}");
}

#[tokio::test]
async fn test_execution_order() {
    let log = Log::default();
    let builder = Router::builder().group("/g");
    let builder = traced(builder, &log, "before");
    let builder = builder.get("/r");
    let builder = traced(builder, &log, "a");
    let builder = traced(builder, &log, "b");
    let builder = traced(builder.after_all(), &log, "after");
    let router = builder.build().unwrap();

    router.handle(request(Method::GET, "/g/r")).await.unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        [
            "before:enter",
            "a:enter",
            "b:enter",
            "b:exit",
            "a:exit",
            "before:exit",
            "after:enter",
            "after:exit",
        ]
    );
}

#[tokio::test]
async fn test_short_circuit() {
    let log = Log::default();
    let builder = Router::builder().get("/stop").with(|ctx, _next| {
        Box::pin(async move {
            ctx.status(StatusCode::UNAUTHORIZED).text("denied");
            Ok(())
        })
    });
    let router = traced(builder, &log, "b").build().unwrap();

    let response = router.handle(request(Method::GET, "/stop")).await.unwrap();

    assert!(log.lock().unwrap().is_empty());
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(response).await, "denied");
}

#[tokio::test]
async fn test_no_match_returns_404_without_middleware() {
    let counter = Arc::new(AtomicUsize::new(0));
    let builder = counting(Router::builder().group("/api"), &counter).get("/ping");
    let builder = counting(builder, &counter);
    let router = counting(builder.after_all(), &counter).build().unwrap();

    for (method, path) in [
        (Method::POST, "/api/ping"),
        (Method::GET, "/api/ping/extra"),
        (Method::GET, "/api/pong"),
        (Method::GET, "/"),
    ] {
        let response = router.handle(request(method, path)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<MatchedRoute>().is_none());
        assert_eq!(body_text(response).await, "Not found");
    }
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_route_catch_recovers() {
    let after = Arc::new(AtomicUsize::new(0));
    let builder = Router::builder()
        .group("/api")
        .get("/input")
        .catch(ErrorKind::Type, StatusCode::BAD_REQUEST, "Bad Input");
    let builder = failing(builder, ErrorKind::Type);
    let router = counting(builder.after_all(), &after).build().unwrap();

    let response = router.handle(request(Method::GET, "/api/input")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.extensions().get::<ReasonPhrase>().map(|r| r.as_bytes()),
        Some(&b"Bad Input"[..])
    );
    assert!(body_text(response).await.contains("Bad Input"));
    assert_eq!(after.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_route_handlers_take_precedence_over_group() {
    let builder = Router::builder()
        .group("/api")
        .catch(ErrorKind::Validation, StatusCode::UNPROCESSABLE_ENTITY, "group")
        .get("/x")
        .catch(ErrorKind::Validation, StatusCode::CONFLICT, "route");
    let router = failing(builder, ErrorKind::Validation).build().unwrap();

    let response = router.handle(request(Method::GET, "/api/x")).await.unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_text(response).await, "route");
}

#[tokio::test]
async fn test_group_handler_catches_route_error() {
    let builder = Router::builder()
        .group("/api")
        .catch(ErrorKind::Unauthorized, StatusCode::UNAUTHORIZED, "Login required")
        .get("/secret")
        .catch(ErrorKind::Type, StatusCode::BAD_REQUEST, "Bad Input");
    let router = failing(builder, ErrorKind::Unauthorized).build().unwrap();

    let response = router.handle(request(Method::GET, "/api/secret")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(response).await, "Login required");
}

#[tokio::test]
async fn test_first_matching_handler_wins() {
    let builder = Router::builder()
        .get("/x")
        .catch(ErrorMatch::Any, StatusCode::IM_A_TEAPOT, "any")
        .catch(ErrorKind::Range, StatusCode::BAD_REQUEST, "range");
    let router = failing(builder, ErrorKind::Range).build().unwrap();

    let response = router.handle(request(Method::GET, "/x")).await.unwrap();

    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
}

#[tokio::test]
async fn test_custom_handler_sees_error_and_context() {
    let builder = Router::builder()
        .get("/items/:id")
        .register_error_handler(ErrorMatch::when(|e| e.message() == "boom"), |err, ctx| {
            let body = serde_json::json!({
                "error": err.kind().to_string(),
                "item": ctx.param("id"),
            });
            Box::pin(async move {
                ctx.status(StatusCode::BAD_GATEWAY).set_json(&body)?;
                Ok(())
            })
        });
    let router = failing(builder, ErrorKind::Custom("upstream")).build().unwrap();

    let response = router.handle(request(Method::GET, "/items/5")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body, serde_json::json!({"error": "upstream", "item": "5"}));
}

#[tokio::test]
async fn test_unhandled_error_propagates_after_running_after_chain() {
    let after = Arc::new(AtomicUsize::new(0));
    let builder = Router::builder()
        .group("/api")
        .get("/x")
        .catch(ErrorKind::Type, StatusCode::BAD_REQUEST, "Bad Input");
    let builder = failing(builder, ErrorKind::Range);
    let router = counting(builder.after_all(), &after).build().unwrap();

    let err = router.handle(request(Method::GET, "/api/x")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Range);
    assert_eq!(err.message(), "boom");
    assert_eq!(after.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_after_chain_runs_once_in_every_outcome() {
    let after = Arc::new(AtomicUsize::new(0));
    let builder = Router::builder()
        .group("/api")
        .catch(ErrorKind::Validation, StatusCode::BAD_REQUEST, "invalid")
        .get("/ok")
        .get("/recovered");
    let builder = failing(builder, ErrorKind::Validation).get("/unhandled");
    let builder = failing(builder, ErrorKind::Internal);
    let router = counting(builder.after_all(), &after).build().unwrap();

    assert!(router.handle(request(Method::GET, "/api/ok")).await.is_ok());
    assert_eq!(after.load(Ordering::SeqCst), 1);

    assert!(router.handle(request(Method::GET, "/api/recovered")).await.is_ok());
    assert_eq!(after.load(Ordering::SeqCst), 2);

    assert!(router.handle(request(Method::GET, "/api/unhandled")).await.is_err());
    assert_eq!(after.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_after_chain_sees_recovered_state() {
    let seen = Arc::new(Mutex::new(None));
    let probe = seen.clone();
    let builder = Router::builder()
        .group("/api")
        .get("/x")
        .catch(ErrorKind::Type, StatusCode::BAD_REQUEST, "Bad Input");
    let router = failing(builder, ErrorKind::Type)
        .after_all()
        .with(move |ctx, next| {
            *probe.lock().unwrap() = Some(ctx.response.status);
            next.run(ctx)
        })
        .build()
        .unwrap();

    router.handle(request(Method::GET, "/api/x")).await.unwrap();

    assert_eq!(*seen.lock().unwrap(), Some(StatusCode::BAD_REQUEST));
}

#[tokio::test]
async fn test_after_chain_error_propagates_when_nothing_pending() {
    let router = Router::builder()
        .group("/api")
        .get("/x")
        .after_all()
        .with(|_ctx, _next| Box::pin(async { Err(RouteError::internal("audit log down")) }))
        .build()
        .unwrap();

    let err = router.handle(request(Method::GET, "/api/x")).await.unwrap_err();

    assert_eq!(err.message(), "audit log down");
}

#[tokio::test]
async fn test_after_chain_error_is_suppressed_by_pending_error() {
    let builder = failing(Router::builder().group("/api").get("/x"), ErrorKind::Conflict);
    let router = builder
        .after_all()
        .with(|_ctx, _next| Box::pin(async { Err(RouteError::internal("audit log down")) }))
        .build()
        .unwrap();

    let err = router.handle(request(Method::GET, "/api/x")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.suppressed().len(), 1);
    assert_eq!(err.suppressed()[0].message(), "audit log down");
}

#[tokio::test]
async fn test_failing_error_handler_becomes_unhandled() {
    let builder = Router::builder()
        .get("/x")
        .catch_any(|_err, _ctx| Box::pin(async { Err(RouteError::internal("handler broke")) }));
    let router = failing(builder, ErrorKind::Type).build().unwrap();

    let err = router.handle(request(Method::GET, "/x")).await.unwrap_err();

    assert_eq!(err.message(), "handler broke");
    assert_eq!(err.suppressed()[0].kind(), ErrorKind::Type);
}

#[tokio::test]
async fn test_other_groups_middleware_does_not_run() {
    let counter = Arc::new(AtomicUsize::new(0));
    let builder = counting(Router::builder().group("/a"), &counter).get("/x");
    let builder = counting(builder.after_all(), &counter);
    let router = builder.group("/b").get("/x").build().unwrap();

    router.handle(request(Method::GET, "/b/x")).await.unwrap();

    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_requests_do_not_share_state() {
    let router = Router::builder()
        .post("/count")
        .with(|ctx, next| {
            Box::pin(async move {
                let seen = ctx.locals.get::<u32>().copied().unwrap_or(0);
                ctx.locals.insert(seen + 1);
                ctx.text(format!("{}", seen + 1));
                next.run(ctx).await
            })
        })
        .build()
        .unwrap();

    let first = router.handle(request(Method::POST, "/count")).await.unwrap();
    let second = router.handle(request(Method::POST, "/count")).await.unwrap();

    assert_eq!(body_text(first).await, "1");
    assert_eq!(body_text(second).await, "1");
}

#[tokio::test]
async fn test_serve_passes_env_through() {
    #[derive(Debug)]
    struct Bindings {
        greeting: &'static str,
    }

    let router = Router::builder()
        .get("/hello/:name")
        .with(|ctx, next| {
            Box::pin(async move {
                let greeting = ctx.env::<Bindings>().map(|b| b.greeting).unwrap_or("hi");
                let name = ctx.param("name").unwrap_or_default().to_string();
                ctx.text(format!("{}, {}", greeting, name));
                next.run(ctx).await
            })
        })
        .build()
        .unwrap();

    let env: Handle = Arc::new(Bindings { greeting: "hello" });
    let response = router
        .serve(request(Method::GET, "/hello/ada"), Some(env), None)
        .await
        .unwrap();

    assert_eq!(body_text(response).await, "hello, ada");
}

#[tokio::test]
async fn test_json_body_syntax_error_is_catchable() {
    let router = Router::builder()
        .post("/items")
        .catch(ErrorKind::Syntax, StatusCode::BAD_REQUEST, "Malformed JSON")
        .with(|ctx, next| {
            Box::pin(async move {
                let item: serde_json::Value = ctx.json()?;
                ctx.set_json(&item)?;
                next.run(ctx).await
            })
        })
        .build()
        .unwrap();

    let bad = Request::builder()
        .method(Method::POST)
        .uri("/items")
        .body(Bytes::from_static(b"{nope"))
        .unwrap();
    let response = router.handle(bad).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let good = Request::builder()
        .method(Method::POST)
        .uri("/items")
        .body(Bytes::from_static(br#"{"a":1}"#))
        .unwrap();
    let response = router.handle(good).await.unwrap();
    assert_eq!(body_text(response).await, r#"{"a":1}"#);
}

#[tokio::test]
async fn test_struct_middleware_via_layer() {
    let log = Log::default();
    let router = Router::builder()
        .group("/api")
        .layer(tag(&log, "group"))
        .get("/tagged")
        .layer(tag(&log, "route"))
        .build()
        .unwrap();

    let response = router.handle(request(Method::GET, "/api/tagged")).await.unwrap();

    assert_eq!(*log.lock().unwrap(), ["group", "route"]);
    assert_eq!(response.headers()["x-last-tag"], "route");
}

#[tokio::test]
async fn test_use_all_runs_in_given_order() {
    let log = Log::default();
    let sequence: Vec<BoxedMiddleware> = ["first", "second", "third"]
        .into_iter()
        .map(|name| Arc::new(tag(&log, name)) as BoxedMiddleware)
        .collect();
    let router = Router::builder()
        .group("/api")
        .get("/seq")
        .use_all(sequence)
        .layer(tag(&log, "last"))
        .build()
        .unwrap();

    let response = router.handle(request(Method::GET, "/api/seq")).await.unwrap();

    assert_eq!(*log.lock().unwrap(), ["first", "second", "third", "last"]);
    assert_eq!(response.headers()["x-last-tag"], "last");
}
