use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::service::{LookupError, LookupService, TransactionView};

pub const TX_HASH_PARAM: &str = "txHash";

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = match self.details() {
            Some(details) => json!({ "error": self.message(), "details": details }),
            None => json!({ "error": self.message() }),
        };
        (status, Json(body)).into_response()
    }
}

async fn parse_transaction(
    State(service): State<Arc<LookupService>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<TransactionView>, LookupError> {
    let tx_hash = params.get(TX_HASH_PARAM).map(String::as_str);
    match service.lookup(tx_hash).await {
        Ok(view) => {
            debug!(tx_hash, slot = view.slot, "transaction parsed");
            Ok(Json(view))
        }
        Err(err) => {
            warn!(tx_hash, error = %err, "transaction lookup failed");
            Err(err)
        }
    }
}

pub fn create_router(service: Arc<LookupService>) -> Router {
    Router::new()
        .route("/parseTransaction", get(parse_transaction))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received, stopping server");
}

pub async fn serve(addr: SocketAddr, service: Arc<LookupService>) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening for requests");

    axum::serve(listener, create_router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::create_router;
    use crate::service::testing::{
        FailAt, FakeParsers, FakeSource, parsed_data, sample_record, service, swap_data,
        valid_signature,
    };

    async fn get(source: FakeSource, fail_at: FailAt, uri: &str) -> (StatusCode, Value, usize) {
        let source = Arc::new(source);
        let parsers = Arc::new(FakeParsers::new(fail_at));
        let router = create_router(Arc::new(service(&source, &parsers)));

        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap();
        (status, body, source.calls())
    }

    #[tokio::test]
    async fn missing_tx_hash_is_bad_request() {
        for uri in ["/parseTransaction", "/parseTransaction?txHash="] {
            let (status, body, calls) =
                get(FakeSource::ok(sample_record()), FailAt::Nothing, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({"error": "txHash parameter is required"}));
            assert_eq!(calls, 0);
        }
    }

    #[tokio::test]
    async fn malformed_tx_hash_is_bad_request() {
        let (status, body, calls) = get(
            FakeSource::ok(sample_record()),
            FailAt::Nothing,
            "/parseTransaction?txHash=0OIl",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "invalid txHash format"}));
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn downstream_failures_are_server_errors() {
        let uri = format!("/parseTransaction?txHash={}", valid_signature());
        let cases = [
            (
                FakeSource::failing("rpc timed out"),
                FailAt::Nothing,
                "error fetching transaction",
            ),
            (
                FakeSource::ok(sample_record()),
                FailAt::Create,
                "error creating transaction parser",
            ),
            (
                FakeSource::ok(sample_record()),
                FailAt::Parse,
                "error parsing transaction",
            ),
            (
                FakeSource::ok(sample_record()),
                FailAt::Swap,
                "error processing swap data",
            ),
        ];
        for (source, fail_at, message) in cases {
            let (status, body, _) = get(source, fail_at, &uri).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body["error"], json!(message));
            assert!(body["details"].as_str().is_some_and(|d| !d.is_empty()));
        }
    }

    #[tokio::test]
    async fn upstream_details_carry_error_text() {
        let uri = format!("/parseTransaction?txHash={}", valid_signature());
        let (_, body, _) = get(FakeSource::failing("rpc timed out"), FailAt::Nothing, &uri).await;
        assert!(body["details"].as_str().unwrap().contains("rpc timed out"));
    }

    #[tokio::test]
    async fn success_returns_five_fields() {
        let record = sample_record();
        let uri = format!("/parseTransaction?txHash={}", valid_signature());
        let (status, body, calls) =
            get(FakeSource::ok(record.clone()), FailAt::Nothing, &uri).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(calls, 1);
        assert_eq!(
            body,
            json!({
                "transactionData": parsed_data(),
                "swapData": swap_data(),
                "slot": record.slot,
                "blockTime": record.block_time,
                "fee": record.fee,
            })
        );
    }
}
