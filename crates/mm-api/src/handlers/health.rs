use axum::{Json, extract::State};
use serde_json::json;

use crate::SharedState;

pub async fn health_check(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let index = state.index.read().await;
    let store = state.store.read().await;

    Json(json!({
        "status": "ok",
        "prefectures": index.len(),
        "municipalities": index.total_codes(),
        "visited": store.len(),
        "application": env!("CARGO_PKG_NAME"),
    }))
}
