// src/handlers/usuarios.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::auth::{AtualizarUsuarioPayload, CriarUsuarioPayload, ResetarSenhaPayload},
    services::auth::AuthService,
};

// GET /usuarios
pub async fn listar_usuarios(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let usuarios = app_state.usuario_repo.listar().await?;
    Ok(Json(usuarios))
}

// GET /usuarios/funcionarios
pub async fn listar_funcionarios(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let usuarios = app_state.usuario_repo.listar_funcionarios().await?;
    Ok(Json(usuarios))
}

// POST /usuarios
pub async fn criar_usuario(
    State(app_state): State<AppState>,
    Json(payload): Json<CriarUsuarioPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let senha_hash = AuthService::hash_senha(&payload.senha).await?;

    let usuario = app_state
        .usuario_repo
        .criar(
            &payload.nome,
            &payload.email,
            payload.telefone.as_deref(),
            &senha_hash,
            &payload.role,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(usuario)))
}

// PUT /usuarios/:id
pub async fn atualizar_usuario(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<AtualizarUsuarioPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    // Se a senha veio no payload gera um hash novo, senão mantém o atual
    let senha_hash = match &payload.senha {
        Some(senha) => AuthService::hash_senha(senha).await?,
        None => {
            let atual = app_state
                .usuario_repo
                .buscar_por_id(id)
                .await?
                .ok_or(AppError::UsuarioNotFound)?;
            atual.senha_hash
        }
    };

    let usuario = app_state
        .usuario_repo
        .atualizar(
            id,
            &payload.nome,
            &payload.email,
            payload.telefone.as_deref(),
            &senha_hash,
            &payload.role,
        )
        .await?
        .ok_or(AppError::UsuarioNotFound)?;

    Ok(Json(usuario))
}

// DELETE /usuarios/:id
pub async fn deletar_usuario(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    app_state.usuario_repo.deletar(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// POST /usuarios/reset-password
pub async fn resetar_senha(
    State(app_state): State<AppState>,
    Json(payload): Json<ResetarSenhaPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let senha_hash = AuthService::hash_senha(&payload.new_password).await?;

    let atualizados = app_state
        .usuario_repo
        .atualizar_senha_por_email(&payload.email, &senha_hash)
        .await?;

    if atualizados == 0 {
        return Err(AppError::UsuarioNotFound);
    }

    Ok(Json(json!({ "message": "Senha redefinida com sucesso!" })))
}
