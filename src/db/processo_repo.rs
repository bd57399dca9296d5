// src/db/processo_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::{
        etapa::{EtapaComResponsavel, Tarefa},
        processo::{
            Cliente, Etapa, EtapaResumo, EtapaStatus, Processo, ProcessoResumo, TipoProcesso,
            PROCESSO_CONCLUIDO,
        },
    },
};

#[derive(Clone)]
pub struct ProcessoRepository {
    pool: PgPool,
}

impl ProcessoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  LISTAGEM / CONSULTA
    // =========================================================================

    /// Lista os processos com o nome do cliente e a etapa atual derivada na
    /// leitura (nenhuma escrita acontece aqui).
    pub async fn listar_processos<'e, E>(
        &self,
        executor: E,
    ) -> Result<Vec<ProcessoResumo>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let processos = sqlx::query_as::<_, ProcessoResumo>(
            r#"
            SELECT
                p.id AS processo_id,
                p.nome AS processo_nome,
                p.status AS processo_status,
                c.nome AS cliente_nome,
                COALESCE(
                    (
                        SELECT e.nome
                        FROM etapas e
                        WHERE e.processo_id = p.id
                          AND e.status = 'em andamento'
                        ORDER BY e.ordem
                        LIMIT 1
                    ),
                    'Concluído'
                ) AS etapa_atual
            FROM processos p
            JOIN clientes c ON c.id = p.cliente_id
            ORDER BY p.id
            "#,
        )
        .fetch_all(executor)
        .await?;

        Ok(processos)
    }

    pub async fn listar_etapas_resumo<'e, E>(
        &self,
        executor: E,
        processo_ids: &[i32],
    ) -> Result<Vec<EtapaResumo>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let etapas = sqlx::query_as::<_, EtapaResumo>(
            r#"
            SELECT id, nome, status, processo_id
            FROM etapas
            WHERE processo_id = ANY($1)
            ORDER BY processo_id, ordem
            "#,
        )
        .bind(processo_ids)
        .fetch_all(executor)
        .await?;

        Ok(etapas)
    }

    pub async fn buscar_processo<'e, E>(
        &self,
        executor: E,
        processo_id: i32,
    ) -> Result<Option<Processo>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let processo = sqlx::query_as::<_, Processo>(
            r#"
            SELECT id, nome, tipo_id, cliente_id, status, created_at
            FROM processos
            WHERE id = $1
            "#,
        )
        .bind(processo_id)
        .fetch_optional(executor)
        .await?;

        Ok(processo)
    }

    pub async fn buscar_cliente<'e, E>(
        &self,
        executor: E,
        cliente_id: i32,
    ) -> Result<Option<Cliente>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cliente = sqlx::query_as::<_, Cliente>(
            r#"
            SELECT id, nome, telefone, created_at
            FROM clientes
            WHERE id = $1
            "#,
        )
        .bind(cliente_id)
        .fetch_optional(executor)
        .await?;

        Ok(cliente)
    }

    /// Todas as etapas de um processo, em ordem de avanço.
    pub async fn listar_etapas<'e, E>(
        &self,
        executor: E,
        processo_id: i32,
    ) -> Result<Vec<Etapa>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let etapas = sqlx::query_as::<_, Etapa>(
            r#"
            SELECT id, processo_id, nome, ordem, status, usuario_id, prazo, urgencia, observacoes
            FROM etapas
            WHERE processo_id = $1
            ORDER BY ordem
            "#,
        )
        .bind(processo_id)
        .fetch_all(executor)
        .await?;

        Ok(etapas)
    }

    // =========================================================================
    //  UPSERT (cliente -> processo -> etapas)
    // =========================================================================

    pub async fn buscar_cliente_por_nome_telefone<'e, E>(
        &self,
        executor: E,
        nome: &str,
        telefone: &str,
    ) -> Result<Option<Cliente>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cliente = sqlx::query_as::<_, Cliente>(
            r#"
            SELECT id, nome, telefone, created_at
            FROM clientes
            WHERE nome = $1 AND telefone = $2
            "#,
        )
        .bind(nome)
        .bind(telefone)
        .fetch_optional(executor)
        .await?;

        Ok(cliente)
    }

    pub async fn criar_cliente<'e, E>(
        &self,
        executor: E,
        nome: &str,
        telefone: &str,
    ) -> Result<Cliente, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cliente = sqlx::query_as::<_, Cliente>(
            r#"
            INSERT INTO clientes (nome, telefone)
            VALUES ($1, $2)
            RETURNING id, nome, telefone, created_at
            "#,
        )
        .bind(nome)
        .bind(telefone)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::UniqueConstraintViolation(format!(
                        "Cliente '{}' já cadastrado.",
                        nome
                    ));
                }
            }
            e.into()
        })?;

        Ok(cliente)
    }

    pub async fn atualizar_cliente_do_processo<'e, E>(
        &self,
        executor: E,
        processo_id: i32,
        nome: &str,
        telefone: &str,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE clientes
            SET nome = $1, telefone = $2
            WHERE id = (SELECT cliente_id FROM processos WHERE id = $3)
            "#,
        )
        .bind(nome)
        .bind(telefone)
        .bind(processo_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn buscar_processo_por_cliente_tipo<'e, E>(
        &self,
        executor: E,
        cliente_id: i32,
        tipo_id: Option<i32>,
    ) -> Result<Option<Processo>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let processo = sqlx::query_as::<_, Processo>(
            r#"
            SELECT id, nome, tipo_id, cliente_id, status, created_at
            FROM processos
            WHERE cliente_id = $1 AND tipo_id IS NOT DISTINCT FROM $2
            "#,
        )
        .bind(cliente_id)
        .bind(tipo_id)
        .fetch_optional(executor)
        .await?;

        Ok(processo)
    }

    pub async fn criar_processo<'e, E>(
        &self,
        executor: E,
        nome: &str,
        tipo_id: Option<i32>,
        cliente_id: i32,
    ) -> Result<Processo, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let processo = sqlx::query_as::<_, Processo>(
            r#"
            INSERT INTO processos (nome, tipo_id, cliente_id)
            VALUES ($1, $2, $3)
            RETURNING id, nome, tipo_id, cliente_id, status, created_at
            "#,
        )
        .bind(nome)
        .bind(tipo_id)
        .bind(cliente_id)
        .fetch_one(executor)
        .await?;

        Ok(processo)
    }

    pub async fn atualizar_processo<'e, E>(
        &self,
        executor: E,
        processo_id: i32,
        nome: &str,
        tipo_id: Option<i32>,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE processos
            SET nome = $1, tipo_id = $2
            WHERE id = $3
            "#,
        )
        .bind(nome)
        .bind(tipo_id)
        .bind(processo_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn buscar_etapa_por_nome<'e, E>(
        &self,
        executor: E,
        processo_id: i32,
        nome: &str,
    ) -> Result<Option<Etapa>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let etapa = sqlx::query_as::<_, Etapa>(
            r#"
            SELECT id, processo_id, nome, ordem, status, usuario_id, prazo, urgencia, observacoes
            FROM etapas
            WHERE processo_id = $1 AND nome = $2
            "#,
        )
        .bind(processo_id)
        .bind(nome)
        .fetch_optional(executor)
        .await?;

        Ok(etapa)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn criar_etapa<'e, E>(
        &self,
        executor: E,
        processo_id: i32,
        nome: &str,
        ordem: i32,
        status: EtapaStatus,
        usuario_id: Option<i32>,
        prazo: Option<NaiveDate>,
        urgencia: bool,
        observacoes: Option<&str>,
    ) -> Result<Etapa, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let etapa = sqlx::query_as::<_, Etapa>(
            r#"
            INSERT INTO etapas (processo_id, nome, ordem, status, usuario_id, prazo, urgencia, observacoes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, processo_id, nome, ordem, status, usuario_id, prazo, urgencia, observacoes
            "#,
        )
        .bind(processo_id)
        .bind(nome)
        .bind(ordem)
        .bind(status)
        .bind(usuario_id)
        .bind(prazo)
        .bind(urgencia)
        .bind(observacoes)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::UniqueConstraintViolation(format!(
                        "Etapa '{}' duplicada no processo.",
                        nome
                    ));
                }
            }
            e.into()
        })?;

        Ok(etapa)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn atualizar_etapa<'e, E>(
        &self,
        executor: E,
        etapa_id: i32,
        ordem: i32,
        status: Option<EtapaStatus>,
        usuario_id: Option<i32>,
        prazo: Option<NaiveDate>,
        urgencia: bool,
        observacoes: Option<&str>,
    ) -> Result<Etapa, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let etapa = sqlx::query_as::<_, Etapa>(
            r#"
            UPDATE etapas
            SET usuario_id = $1, prazo = $2, urgencia = $3, observacoes = $4, status = $5, ordem = $6
            WHERE id = $7
            RETURNING id, processo_id, nome, ordem, status, usuario_id, prazo, urgencia, observacoes
            "#,
        )
        .bind(usuario_id)
        .bind(prazo)
        .bind(urgencia)
        .bind(observacoes)
        .bind(status)
        .bind(ordem)
        .bind(etapa_id)
        .fetch_one(executor)
        .await?;

        Ok(etapa)
    }

    // =========================================================================
    //  PROGRESSÃO
    // =========================================================================

    /// Finaliza a etapa. Refinalizar é idempotente: a linha continua
    /// 'finalizada' e a chamada devolve a etapa normalmente.
    pub async fn finalizar_etapa<'e, E>(
        &self,
        executor: E,
        etapa_id: i32,
    ) -> Result<Option<Etapa>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let etapa = sqlx::query_as::<_, Etapa>(
            r#"
            UPDATE etapas
            SET status = 'finalizada'
            WHERE id = $1
            RETURNING id, processo_id, nome, ordem, status, usuario_id, prazo, urgencia, observacoes
            "#,
        )
        .bind(etapa_id)
        .fetch_optional(executor)
        .await?;

        Ok(etapa)
    }

    /// Coloca a etapa em andamento, desde que ela ainda esteja pendente (ou
    /// sem status). Devolve None quando outra execução já passou por aqui.
    pub async fn promover_etapa<'e, E>(
        &self,
        executor: E,
        etapa_id: i32,
    ) -> Result<Option<Etapa>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let etapa = sqlx::query_as::<_, Etapa>(
            r#"
            UPDATE etapas
            SET status = 'em andamento'
            WHERE id = $1
              AND (status IS NULL OR status = 'pendente')
            RETURNING id, processo_id, nome, ordem, status, usuario_id, prazo, urgencia, observacoes
            "#,
        )
        .bind(etapa_id)
        .fetch_optional(executor)
        .await?;

        Ok(etapa)
    }

    pub async fn marcar_processo_concluido<'e, E>(
        &self,
        executor: E,
        processo_id: i32,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE processos
            SET status = $1
            WHERE id = $2 AND status <> $1
            "#,
        )
        .bind(PROCESSO_CONCLUIDO)
        .bind(processo_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    //  EXCLUSÃO
    // =========================================================================

    pub async fn deletar_etapas_do_processo<'e, E>(
        &self,
        executor: E,
        processo_id: i32,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM etapas WHERE processo_id = $1")
            .bind(processo_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn deletar_processo<'e, E>(
        &self,
        executor: E,
        processo_id: i32,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM processos WHERE id = $1")
            .bind(processo_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn contar_processos_do_cliente<'e, E>(
        &self,
        executor: E,
        cliente_id: i32,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM processos WHERE cliente_id = $1")
            .bind(cliente_id)
            .fetch_one(executor)
            .await?;

        Ok(total)
    }

    pub async fn deletar_cliente<'e, E>(
        &self,
        executor: E,
        cliente_id: i32,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM clientes WHERE id = $1")
            .bind(cliente_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    // =========================================================================
    //  TIPOS / QUADRO DE ETAPAS / TAREFAS
    // =========================================================================

    pub async fn listar_tipos<'e, E>(&self, executor: E) -> Result<Vec<TipoProcesso>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tipos = sqlx::query_as::<_, TipoProcesso>(
            "SELECT id, nome FROM tipos_processo ORDER BY id",
        )
        .fetch_all(executor)
        .await?;

        Ok(tipos)
    }

    pub async fn etapas_com_responsavel<'e, E>(
        &self,
        executor: E,
        processo_id: i32,
    ) -> Result<Vec<EtapaComResponsavel>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let etapas = sqlx::query_as::<_, EtapaComResponsavel>(
            r#"
            SELECT
                e.nome,
                e.status,
                u.nome AS responsavel
            FROM etapas e
            LEFT JOIN usuarios u ON u.id = e.usuario_id
            WHERE e.processo_id = $1
            ORDER BY e.ordem
            "#,
        )
        .bind(processo_id)
        .fetch_all(executor)
        .await?;

        Ok(etapas)
    }

    /// Tarefas acionáveis de um usuário (sem status ou em andamento).
    pub async fn tarefas_por_usuario<'e, E>(
        &self,
        executor: E,
        usuario_id: i32,
    ) -> Result<Vec<Tarefa>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tarefas = sqlx::query_as::<_, Tarefa>(
            r#"
            SELECT
                e.id,
                e.nome,
                e.prazo,
                e.urgencia,
                e.status,
                e.ordem,
                p.nome AS processo_nome
            FROM etapas e
            JOIN processos p ON p.id = e.processo_id
            WHERE e.usuario_id = $1
              AND (e.status IS NULL OR e.status = 'em andamento')
            ORDER BY
                e.status DESC,
                e.ordem ASC,
                e.prazo NULLS LAST
            "#,
        )
        .bind(usuario_id)
        .fetch_all(executor)
        .await?;

        Ok(tarefas)
    }

    pub async fn contar_tarefas_em_andamento<'e, E>(
        &self,
        executor: E,
        usuario_id: i32,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let quantidade: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM etapas
            WHERE usuario_id = $1 AND status = 'em andamento'
            "#,
        )
        .bind(usuario_id)
        .fetch_one(executor)
        .await?;

        Ok(quantidade)
    }
}
