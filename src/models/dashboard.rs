// src/models/dashboard.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub summary: DashboardSummary,
    pub bar_data: Vec<BarEntry>,
    pub pie_data: Vec<PieEntry>,
    pub processes_data: Vec<ProcessoRecente>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardSummary {
    pub ativos: i64,
    pub concluidos: i64,
}

// Atividade mensal (gráfico de barras)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct BarEntry {
    pub name: String,
    pub value: i64,
}

// Distribuição por status (gráfico de pizza); a cor é resolvida no repo
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PieEntry {
    pub name: String,
    pub value: i64,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ProcessoRecente {
    pub id: i32,

    #[serde(rename = "type")]
    pub nome: String,

    pub status: String,

    #[serde(rename = "creationDate")]
    pub created_at: DateTime<Utc>,
}
