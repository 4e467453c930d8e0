//! Insight generation against a local stand-in for the Gemini REST API.

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use smart_property::config::InsightsConfig;
use smart_property::insights::{
    insights_for, GeminiInsights, InsightSource, EMPTY_MESSAGE, FAILURE_MESSAGE,
};
use smart_property::listings::seed_listings;

const API_KEY: &str = "test-key";

#[derive(Deserialize)]
struct KeyParam {
    key: String,
}

async fn generate(
    Path(call): Path<String>,
    Query(params): Query<KeyParam>,
    Json(body): Json<Value>,
) -> Response {
    if params.key != API_KEY {
        return (StatusCode::FORBIDDEN, Json(json!({ "error": "bad key" }))).into_response();
    }
    let Some(model) = call.strip_suffix(":generateContent") else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let top_p = body["generationConfig"]["topP"].as_f64().unwrap_or_default();
    let temperature = body["generationConfig"]["temperature"]
        .as_f64()
        .unwrap_or_default();
    if (top_p - 0.8).abs() > 1e-6 || (temperature - 0.7).abs() > 1e-6 {
        return StatusCode::BAD_REQUEST.into_response();
    }
    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default()
        .to_string();

    match model {
        "gemini-test" => {
            let first_line = prompt.lines().nth(1).unwrap_or_default().to_string();
            let payload = json!({
                "candidates": [{
                    "content": { "parts": [
                        { "text": "Strong rental demand. " },
                        { "text": first_line }
                    ]}
                }]
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        "gemini-silent" => (StatusCode::OK, Json(json!({ "candidates": [] }))).into_response(),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": { "message": "model overloaded" } })),
        )
            .into_response(),
    }
}

async fn spawn() -> String {
    let app = Router::new().route("/v1beta/models/:call", post(generate));
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake model serves");
    });
    format!("http://{addr}")
}

fn generator(endpoint: &str, model: &str) -> GeminiInsights {
    let config = InsightsConfig {
        api_key: API_KEY.to_string(),
        model: model.to_string(),
    };
    GeminiInsights::new(&config, Duration::from_secs(5))
        .expect("client builds")
        .with_endpoint(endpoint)
}

#[tokio::test]
async fn generated_text_joins_candidate_parts() {
    let endpoint = spawn().await;
    let listing = seed_listings().remove(0);

    let outcome = insights_for(&generator(&endpoint, "gemini-test"), &listing).await;

    assert_eq!(outcome.source, InsightSource::Generated);
    assert_eq!(
        outcome.text,
        "Strong rental demand. Title: Modern Luxury Villa"
    );
}

#[tokio::test]
async fn empty_candidates_use_the_fallback_text() {
    let endpoint = spawn().await;
    let listing = seed_listings().remove(1);

    let outcome = insights_for(&generator(&endpoint, "gemini-silent"), &listing).await;

    assert_eq!(outcome.source, InsightSource::Empty);
    assert_eq!(outcome.text, EMPTY_MESSAGE);
}

#[tokio::test]
async fn provider_errors_are_not_surfaced() {
    let endpoint = spawn().await;
    let listing = seed_listings().remove(2);

    let outcome = insights_for(&generator(&endpoint, "gemini-overloaded"), &listing).await;

    assert_eq!(outcome.source, InsightSource::Failed);
    assert_eq!(outcome.text, FAILURE_MESSAGE);
}
