// src/db/dashboard_repo.rs

use sqlx::{Acquire, Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::dashboard::{BarEntry, DashboardData, DashboardSummary, PieEntry, ProcessoRecente},
    models::processo::PROCESSO_CONCLUIDO,
};

// Cores fixas do gráfico de pizza, acertadas com o frontend
fn cor_do_status(status: &str) -> &'static str {
    match status {
        "em andamento" => "#003a74",
        "concluído" => "#0058a5",
        "pendente" => "#0078d4",
        "analise" => "#FFD700",
        _ => "#ccc",
    }
}

#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_dashboard<'e, E>(&self, executor: E) -> Result<DashboardData, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        // Transação para um snapshot consistente dos contadores e gráficos
        let mut tx = executor.begin().await?;

        // 1. Contagem de processos ativos
        let ativos: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM processos WHERE status <> $1")
            .bind(PROCESSO_CONCLUIDO)
            .fetch_one(&mut *tx)
            .await?;

        // 2. Contagem de processos concluídos
        let concluidos: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM processos WHERE status = $1")
            .bind(PROCESSO_CONCLUIDO)
            .fetch_one(&mut *tx)
            .await?;

        // 3. Atividade mensal (gráfico de barras)
        let bar_data = sqlx::query_as::<_, BarEntry>(
            r#"
            SELECT
                TO_CHAR(created_at, 'Mon') AS name,
                COUNT(*) AS value
            FROM processos
            GROUP BY name
            ORDER BY MIN(created_at)
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        // 4. Distribuição por status (gráfico de pizza)
        let pie_rows = sqlx::query_as::<_, BarEntry>(
            r#"
            SELECT
                status AS name,
                COUNT(*) AS value
            FROM processos
            GROUP BY status
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        let pie_data = pie_rows
            .into_iter()
            .map(|row| PieEntry {
                color: cor_do_status(&row.name).to_string(),
                name: row.name,
                value: row.value,
            })
            .collect();

        // 5. Processos recentes (tabela)
        let processes_data = sqlx::query_as::<_, ProcessoRecente>(
            r#"
            SELECT id, nome, status, created_at
            FROM processos
            ORDER BY created_at DESC
            LIMIT 5
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(DashboardData {
            summary: DashboardSummary { ativos, concluidos },
            bar_data,
            pie_data,
            processes_data,
        })
    }
}
