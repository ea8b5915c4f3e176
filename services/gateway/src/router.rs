use crate::handlers::{api, page};
use crate::state::AppState;
use axum::{
    Router,
    response::Redirect,
    routing::get,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_redirect))
        .route("/orders", get(page::orders_page))
        .route("/api/orders/{id}", get(api::get_order))
        .route("/api/orders/", get(api::missing_order_id))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root_redirect() -> Redirect {
    Redirect::to("/orders")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use bytes::Bytes;
    use persistence::cache::OrderCache;
    use std::sync::Arc;
    use tower::ServiceExt;
    use types::ids::OrderUid;

    const PAYLOAD: &[u8] = br#"{"order_uid":"b563","delivery":{"name":"Ivan","phone":"+7","zip":"1","city":"Moscow","address":"Lenina 1","region":"MSK","email":"i@ex.com"},"payment":{"transaction":"t1","currency":"RUB","provider":"bank","amount":100,"delivery_cost":10,"goods_total":90},"items":[{"name":"Item","brand":"B","total_price":90,"status":1}]}"#;

    fn app_with_order() -> Router {
        let cache = Arc::new(OrderCache::new());
        cache.set(OrderUid::new("b563"), Bytes::from_static(PAYLOAD));
        create_router(AppState::new(cache))
    }

    async fn get(app: Router, uri: &str) -> axum::response::Response {
        app.oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response")
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf-8 body")
    }

    #[tokio::test]
    async fn test_api_returns_raw_payload_when_cached() {
        let response = get(app_with_order(), "/api/orders/b563").await;

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("application/json"));

        let body = body_string(response).await;
        assert_eq!(body.as_bytes(), PAYLOAD);
    }

    #[tokio::test]
    async fn test_api_unknown_order_is_404() {
        let response = get(app_with_order(), "/api/orders/unknown").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_string(response).await;
        assert!(body.contains("NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_api_empty_id_is_400() {
        let response = get(app_with_order(), "/api/orders/").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_page_renders_found_order() {
        let response = get(app_with_order(), "/orders?id=b563").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response).await;
        assert!(body.contains("Order: <code>b563</code>"));
        assert!(body.contains("Ivan, +7"));
    }

    #[tokio::test]
    async fn test_page_misses_still_answer_200() {
        let response = get(app_with_order(), "/orders?id=unknown").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response).await;
        assert!(body.contains("not found in cache"));
        assert!(body.contains("unknown"));
    }

    #[tokio::test]
    async fn test_page_without_id_shows_form_only() {
        let response = get(app_with_order(), "/orders").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response).await;
        assert!(body.contains("<form"));
        assert!(!body.contains("not found in cache"));
    }

    #[tokio::test]
    async fn test_page_escapes_queried_id() {
        let response = get(app_with_order(), "/orders?id=%3Cscript%3E").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response).await;
        assert!(body.contains("&lt;script&gt;"));
        assert!(!body.contains("<script>"));
    }

    #[tokio::test]
    async fn test_root_redirects_to_orders() {
        let response = get(app_with_order(), "/").await;
        assert!(response.status().is_redirection());
        assert_eq!(
            response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok()),
            Some("/orders")
        );
    }
}
