// src/handlers/processos.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::processo::{
        AtualizarProcessoPayload, DeletarProcessoResponse, ProcessoDetalhe, ProcessoResumo,
        UpsertProcessoPayload, UpsertProcessoResponse,
    },
};

// GET /processo
#[utoipa::path(
    get,
    path = "/processo",
    tag = "Processos",
    responses(
        (status = 200, description = "Lista de processos com etapas", body = Vec<ProcessoResumo>)
    ),
    security(("api_jwt" = []))
)]
pub async fn listar_processos(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let processos = app_state.processo_service.listar_processos().await?;
    Ok(Json(processos))
}

// GET /processo/:id
#[utoipa::path(
    get,
    path = "/processo/{id}",
    tag = "Processos",
    params(("id" = i32, Path, description = "ID do processo")),
    responses(
        (status = 200, description = "Processo com cliente e etapas", body = ProcessoDetalhe),
        (status = 404, description = "Processo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn buscar_processo_por_id(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let detalhe = app_state
        .processo_service
        .buscar_processo_detalhe(id)
        .await?;
    Ok(Json(detalhe))
}

// POST /processo
#[utoipa::path(
    post,
    path = "/processo",
    tag = "Processos",
    request_body = UpsertProcessoPayload,
    responses(
        (status = 201, description = "Processo criado/atualizado", body = UpsertProcessoResponse),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn criar_processo_completo(
    State(app_state): State<AppState>,
    Json(payload): Json<UpsertProcessoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let resposta = app_state
        .processo_service
        .criar_processo_completo(payload)
        .await?;

    Ok((StatusCode::CREATED, Json(resposta)))
}

// PUT /processo/:id
#[utoipa::path(
    put,
    path = "/processo/{id}",
    tag = "Processos",
    params(("id" = i32, Path, description = "ID do processo")),
    request_body = AtualizarProcessoPayload,
    responses(
        (status = 200, description = "Processo atualizado"),
        (status = 404, description = "Processo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn atualizar_processo_completo(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<AtualizarProcessoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    app_state
        .processo_service
        .atualizar_processo_completo(id, payload)
        .await?;

    Ok(Json(
        serde_json::json!({ "message": "Processo atualizado com sucesso" }),
    ))
}

// DELETE /processo/:id
#[utoipa::path(
    delete,
    path = "/processo/{id}",
    tag = "Processos",
    params(("id" = i32, Path, description = "ID do processo")),
    responses(
        (status = 200, description = "Processo deletado", body = DeletarProcessoResponse),
        (status = 404, description = "Processo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn deletar_processo_completo(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let resposta = app_state
        .processo_service
        .deletar_processo_completo(id)
        .await?;

    Ok(Json(resposta))
}
