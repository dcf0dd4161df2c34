/// HTTP transport tests
///
/// Drives the router in-process with `tower::ServiceExt::oneshot`.

mod common;

mod transport_tests {
    use super::common::*;
    use axum::body::Body;
    use axum::http::{HeaderMap, Request, StatusCode};
    use serde_json::json;
    use std::sync::Arc;
    use tablegraph::engine::{AsyncEngine, SyncEngine};
    use tablegraph::transport::{router, AsyncService, Guard, QueryService, SyncService};
    use tower::ServiceExt;

    fn async_service() -> Arc<dyn QueryService> {
        let _ = tracing_subscriber::fmt::try_init();

        let mut engine = AsyncEngine::new();
        engine.register(sample_table(), sample_options()).unwrap();
        engine.build_schema().unwrap();
        Arc::new(AsyncService::new(Arc::new(engine), Arc::new(sample_session())))
    }

    fn sync_service() -> Arc<dyn QueryService> {
        let mut engine = SyncEngine::new();
        engine.register(sample_table(), sample_options()).unwrap();
        engine.build_schema().unwrap();
        Arc::new(SyncService::new(Arc::new(engine), Arc::new(sample_session())))
    }

    fn token_guard() -> Guard {
        Arc::new(|headers: &HeaderMap| {
            headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v == "Bearer secret")
        })
    }

    fn post(query: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/graphql")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "query": query }).to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_get_returns_schema_text() {
        let service = async_service();
        let expected = service.schema_text().unwrap();

        let response = router(service, None)
            .oneshot(Request::get("/graphql").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body, json!(expected));
        assert!(body.as_str().unwrap().contains("type sample_table"));
    }

    #[tokio::test]
    async fn test_post_runs_query() {
        let response = router(async_service(), None)
            .oneshot(post(r#"{ sample_tables(filter: {string_field: {eq: "Two"}}) { int_field } }"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"data": {"sample_tables": [{"int_field": 2}]}, "errors": null})
        );
    }

    #[tokio::test]
    async fn test_response_body_keeps_selection_order() {
        let response = router(async_service(), None)
            .oneshot(post("{ sample_tables(limit: 1) { string_field int_field } }"))
            .await
            .unwrap();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            r#"{"data":{"sample_tables":[{"string_field":"One","int_field":1}]},"errors":null}"#
        );
    }

    #[tokio::test]
    async fn test_post_with_variables_on_sync_service() {
        let request = Request::builder()
            .method("POST")
            .uri("/graphql")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({
                    "query": "query($n: Int) { sample_tables(filter: {int_field: {eq: $n}}) { string_field } }",
                    "variables": {"n": 3}
                })
                .to_string(),
            ))
            .unwrap();

        let response = router(sync_service(), None).oneshot(request).await.unwrap();
        assert_eq!(
            body_json(response).await["data"],
            json!({"sample_tables": [{"string_field": "Three"}]})
        );
    }

    #[tokio::test]
    async fn test_query_errors_are_reported_in_body() {
        let response = router(async_service(), None)
            .oneshot(post("{ sample_tables { does_not_exist } }"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["data"].is_null());
        assert!(!body["errors"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_guard_rejects_requests() {
        let app = router(async_service(), Some(token_guard()));

        let response = app
            .clone()
            .oneshot(Request::get("/graphql").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .clone()
            .oneshot(post("{ sample_tables { int_field } }"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let mut request = post("{ sample_tables(limit: 1) { int_field } }");
        request
            .headers_mut()
            .insert("authorization", "Bearer secret".parse().unwrap());
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["data"],
            json!({"sample_tables": [{"int_field": 1}]})
        );
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = router(async_service(), Some(token_guard()))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"OK");
    }
}
