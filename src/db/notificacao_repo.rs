// src/db/notificacao_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{common::error::AppError, models::notificacao::Notificacao};

// Log de notificações: só inserção; nada consome essas linhas depois.
#[derive(Clone)]
pub struct NotificacaoRepository {
    pool: PgPool,
}

impl NotificacaoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn registrar<'e, E>(
        &self,
        executor: E,
        usuario_id: i32,
        etapa_id: i32,
        mensagem: &str,
    ) -> Result<Notificacao, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let notificacao = sqlx::query_as::<_, Notificacao>(
            r#"
            INSERT INTO notificacoes (usuario_id, etapa_id, mensagem)
            VALUES ($1, $2, $3)
            RETURNING id, usuario_id, etapa_id, mensagem, criada_em
            "#,
        )
        .bind(usuario_id)
        .bind(etapa_id)
        .bind(mensagem)
        .fetch_one(executor)
        .await?;

        Ok(notificacao)
    }
}
