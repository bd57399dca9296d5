// src/handlers/tipos_processo.rs

use axum::{Json, extract::State, response::IntoResponse};

use crate::{common::error::AppError, config::AppState};

// GET /tipos-processo
pub async fn listar_tipos(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let tipos = app_state
        .processo_repo
        .listar_tipos(&app_state.db_pool)
        .await?;

    Ok(Json(tipos))
}
