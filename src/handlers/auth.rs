// src/handlers/auth.rs

use axum::{Json, extract::State};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{LoginPayload, LoginResponse, Usuario, UsuarioPublico},
};

// Handler de login
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let (usuario, token) = app_state
        .auth_service
        .login(&payload.email, &payload.senha)
        .await?;

    Ok(Json(LoginResponse {
        user: UsuarioPublico {
            id: usuario.id,
            email: usuario.email,
            role: usuario.role,
            nome: usuario.nome,
        },
        token,
    }))
}

// Handler da rota protegida /me
pub async fn get_me(AuthenticatedUser(usuario): AuthenticatedUser) -> Json<Usuario> {
    Json(usuario)
}
