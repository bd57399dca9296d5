// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::{
    common::error::AppError,
    db::UsuarioRepository,
    models::auth::{Claims, Usuario},
};

#[derive(Clone)]
pub struct AuthService {
    usuario_repo: UsuarioRepository,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(usuario_repo: UsuarioRepository, jwt_secret: String) -> Self {
        Self {
            usuario_repo,
            jwt_secret,
        }
    }

    /// Hash de senha fora do executor async (bcrypt é CPU-bound).
    pub async fn hash_senha(senha: &str) -> Result<String, AppError> {
        let senha = senha.to_owned();
        let hashed = tokio::task::spawn_blocking(move || hash(&senha, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        Ok(hashed)
    }

    pub async fn login(&self, email: &str, senha: &str) -> Result<(Usuario, String), AppError> {
        let usuario = self
            .usuario_repo
            .buscar_por_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let senha = senha.to_owned();
        let senha_hash = usuario.senha_hash.clone();

        // Executa a verificação em uma thread separada
        let senha_valida = tokio::task::spawn_blocking(move || verify(&senha, &senha_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !senha_valida {
            return Err(AppError::InvalidCredentials);
        }

        let token = self.criar_token(&usuario)?;
        Ok((usuario, token))
    }

    pub async fn validar_token(&self, token: &str) -> Result<Usuario, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        self.usuario_repo
            .buscar_por_id(token_data.claims.id)
            .await?
            .ok_or(AppError::UsuarioNotFound)
    }

    fn criar_token(&self, usuario: &Usuario) -> Result<String, AppError> {
        let now = Utc::now();
        // Expiração fixa de 2 horas
        let expires_at = now + chrono::Duration::hours(2);

        let claims = Claims {
            id: usuario.id,
            email: usuario.email.clone(),
            role: usuario.role.clone(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}
