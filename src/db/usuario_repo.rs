// src/db/usuario_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::auth::{ContatoUsuario, Usuario},
};

// O repositório de usuários, responsável por todas as interações com a
// tabela 'usuarios'
#[derive(Clone)]
pub struct UsuarioRepository {
    pool: PgPool,
}

impl UsuarioRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn listar(&self) -> Result<Vec<Usuario>, AppError> {
        let usuarios = sqlx::query_as::<_, Usuario>(
            r#"
            SELECT id, nome, email, telefone, senha_hash, role, created_at
            FROM usuarios
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(usuarios)
    }

    pub async fn listar_funcionarios(&self) -> Result<Vec<Usuario>, AppError> {
        let usuarios = sqlx::query_as::<_, Usuario>(
            r#"
            SELECT id, nome, email, telefone, senha_hash, role, created_at
            FROM usuarios
            WHERE role = 'funcionario'
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(usuarios)
    }

    pub async fn buscar_por_email(&self, email: &str) -> Result<Option<Usuario>, AppError> {
        let usuario = sqlx::query_as::<_, Usuario>(
            r#"
            SELECT id, nome, email, telefone, senha_hash, role, created_at
            FROM usuarios
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(usuario)
    }

    pub async fn buscar_por_id(&self, id: i32) -> Result<Option<Usuario>, AppError> {
        let usuario = sqlx::query_as::<_, Usuario>(
            r#"
            SELECT id, nome, email, telefone, senha_hash, role, created_at
            FROM usuarios
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(usuario)
    }

    /// Só o necessário para o fan-out: nome, e-mail e telefone.
    pub async fn contato<'e, E>(
        &self,
        executor: E,
        usuario_id: i32,
    ) -> Result<Option<ContatoUsuario>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contato = sqlx::query_as::<_, ContatoUsuario>(
            "SELECT nome, email, telefone FROM usuarios WHERE id = $1",
        )
        .bind(usuario_id)
        .fetch_optional(executor)
        .await?;

        Ok(contato)
    }

    pub async fn criar(
        &self,
        nome: &str,
        email: &str,
        telefone: Option<&str>,
        senha_hash: &str,
        role: &str,
    ) -> Result<Usuario, AppError> {
        let usuario = sqlx::query_as::<_, Usuario>(
            r#"
            INSERT INTO usuarios (nome, email, telefone, senha_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, nome, email, telefone, senha_hash, role, created_at
            "#,
        )
        .bind(nome)
        .bind(email)
        .bind(telefone)
        .bind(senha_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::EmailAlreadyExists;
                }
            }
            e.into()
        })?;

        Ok(usuario)
    }

    pub async fn atualizar(
        &self,
        id: i32,
        nome: &str,
        email: &str,
        telefone: Option<&str>,
        senha_hash: &str,
        role: &str,
    ) -> Result<Option<Usuario>, AppError> {
        let usuario = sqlx::query_as::<_, Usuario>(
            r#"
            UPDATE usuarios
            SET nome = $1, email = $2, telefone = $3, senha_hash = $4, role = $5
            WHERE id = $6
            RETURNING id, nome, email, telefone, senha_hash, role, created_at
            "#,
        )
        .bind(nome)
        .bind(email)
        .bind(telefone)
        .bind(senha_hash)
        .bind(role)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::EmailAlreadyExists;
                }
            }
            e.into()
        })?;

        Ok(usuario)
    }

    pub async fn deletar(&self, id: i32) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM usuarios WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn atualizar_senha_por_email(
        &self,
        email: &str,
        senha_hash: &str,
    ) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE usuarios SET senha_hash = $1 WHERE email = $2")
            .bind(senha_hash)
            .bind(email)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
