use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use mm_core::gradient::color_for;
use mm_core::progress::{ProgressError, ProgressSnapshot, ProgressTracker};

use crate::SharedState;
use crate::error::ApiError;

/// 県別一覧の 1 行。fill はコロプレス用の CSS 色。
#[derive(Debug, Serialize)]
pub struct PrefectureRow {
    pub code: &'static str,
    pub name: &'static str,
    pub hit: usize,
    pub total: usize,
    pub pct: f64,
    pub fill: String,
}

#[derive(Debug, Serialize)]
pub struct PrefectureDetail {
    pub name: String,
    pub hit: usize,
    pub total: usize,
    pub ratio: f64,
    pub fill: String,
}

pub async fn national(State(state): State<SharedState>) -> Json<ProgressSnapshot> {
    let index = state.index.read().await;
    let store = state.store.read().await;

    Json(ProgressTracker::new(&index, &store).national())
}

/// 全 47 県の進捗（コード昇順）。
pub async fn all_prefectures(State(state): State<SharedState>) -> Json<Vec<PrefectureRow>> {
    let index = state.index.read().await;
    let store = state.store.read().await;
    let tracker = ProgressTracker::new(&index, &store);

    let rows = tracker
        .all_prefectures()
        .into_iter()
        .map(|p| PrefectureRow {
            fill: color_for(p.pct / 100.0).to_string(),
            code: p.code,
            name: p.name,
            hit: p.hit,
            total: p.total,
            pct: p.pct,
        })
        .collect();

    Json(rows)
}

pub async fn by_name(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<PrefectureDetail>, ApiError> {
    let index = state.index.read().await;
    let store = state.store.read().await;
    let tracker = ProgressTracker::new(&index, &store);

    let snapshot = tracker.prefecture(&name).map_err(|err| match err {
        ProgressError::UnknownPrefecture(name) => {
            ApiError::NotFound(format!("unknown prefecture: {name}"))
        }
    })?;

    Ok(Json(PrefectureDetail {
        fill: color_for(snapshot.ratio).to_string(),
        name,
        hit: snapshot.hit,
        total: snapshot.total,
        ratio: snapshot.ratio,
    }))
}

/// インデックスをオンデマンドで再構築する。新しいインデックスが
/// 出来上がるまで旧インデックスは読み取り可能なまま。
pub async fn rebuild_index(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let rebuilt = state.source.build(&state.extractor).await;
    let prefectures = rebuilt.len();
    let municipalities = rebuilt.total_codes();

    *state.index.write().await = rebuilt;
    info!(prefectures, municipalities, "municipality index rebuilt");

    Json(json!({
        "prefectures": prefectures,
        "municipalities": municipalities,
    }))
}
