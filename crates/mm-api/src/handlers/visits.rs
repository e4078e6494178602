use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use mm_core::normalize::normalize_code_str;

use crate::SharedState;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct VisitState {
    pub code: String,
    pub visited: bool,
}

/// 訪問状態を反転し、永続化してから新しい状態を返す。
/// クリックハンドラが追加クエリなしで塗り替えられるようにするための契約。
pub async fn toggle_visit(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<VisitState>, ApiError> {
    let code = normalize_code_str(&code);
    if code.is_empty() {
        return Err(ApiError::BadRequest("municipality code is empty".into()));
    }

    let visited = state.store.write().await.toggle(&code);
    Ok(Json(VisitState { code, visited }))
}

pub async fn get_visit(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Json<VisitState> {
    let code = normalize_code_str(&code);
    let visited = state.store.read().await.contains(&code);
    Json(VisitState { code, visited })
}
