// src/handlers/dashboard.rs

use axum::{Json, extract::State, response::IntoResponse};

use crate::{common::error::AppError, config::AppState, models::dashboard::DashboardData};

// GET /dashboard
#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Resumo, gráficos e processos recentes", body = DashboardData)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_dashboard_data(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let dados = app_state
        .dashboard_repo
        .get_dashboard(&app_state.db_pool)
        .await?;

    Ok(Json(dados))
}
