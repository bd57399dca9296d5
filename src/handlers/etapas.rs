// src/handlers/etapas.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    common::error::AppError,
    config::AppState,
    models::{
        etapa::{EtapaQuadro, EtapasDoProcesso, PendentesResponse, Tarefa},
        processo::{Etapa, EtapaStatus},
    },
};

// A régua fixa de etapas que o quadro do frontend exibe, na ordem do fluxo
const ETAPAS_FIXAS: [&str; 15] = [
    "Documentação",
    "Análise",
    "Contrato",
    "Planilha",
    "Assinatura C.",
    "Carta de AP.",
    "Imobzi",
    "Vistoria",
    "Assinatura V.",
    "Garantia",
    "Pagamento",
    "Contrato ADM",
    "Entrega",
    "Seguro INC.",
    "Troca T.",
];

// GET /etapas/:processo_id
#[utoipa::path(
    get,
    path = "/etapas/{processoId}",
    tag = "Etapas",
    params(("processoId" = i32, Path, description = "ID do processo")),
    responses(
        (status = 200, description = "Quadro de etapas do processo", body = EtapasDoProcesso),
        (status = 404, description = "Processo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn etapas_por_processo(
    State(app_state): State<AppState>,
    Path(processo_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let processo = app_state
        .processo_repo
        .buscar_processo(&app_state.db_pool, processo_id)
        .await?
        .ok_or(AppError::ProcessoNotFound)?;

    let cadastradas = app_state
        .processo_repo
        .etapas_com_responsavel(&app_state.db_pool, processo_id)
        .await?;

    // Preenche a régua fixa com o que existe no banco
    let etapas = ETAPAS_FIXAS
        .iter()
        .map(|nome| {
            let cadastrada = cadastradas.iter().find(|e| e.nome == *nome);
            EtapaQuadro {
                nome: nome.to_string(),
                status: cadastrada
                    .and_then(|e| e.status)
                    .unwrap_or(EtapaStatus::Pendente),
                responsavel: cadastrada
                    .and_then(|e| e.responsavel.clone())
                    .unwrap_or_else(|| "Não atribuído".to_string()),
            }
        })
        .collect();

    Ok(Json(EtapasDoProcesso {
        processo_id: processo.id,
        processo_nome: processo.nome,
        etapas,
    }))
}

// PUT /etapa/finalizar/:id
#[utoipa::path(
    put,
    path = "/etapa/finalizar/{id}",
    tag = "Etapas",
    params(("id" = i32, Path, description = "ID da etapa")),
    responses(
        (status = 200, description = "Etapa finalizada; a próxima entra em andamento", body = Etapa),
        (status = 404, description = "Tarefa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn finalizar_tarefa(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let tarefa = app_state.processo_service.finalizar_etapa(id).await?;

    Ok(Json(json!({
        "message": "Tarefa finalizada com sucesso",
        "tarefa": tarefa,
    })))
}

// GET /etapa/:usuario_id
#[utoipa::path(
    get,
    path = "/etapa/{usuarioId}",
    tag = "Etapas",
    params(("usuarioId" = i32, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Tarefas acionáveis do usuário", body = Vec<Tarefa>)
    ),
    security(("api_jwt" = []))
)]
pub async fn tarefas_por_usuario(
    State(app_state): State<AppState>,
    Path(usuario_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let tarefas = app_state
        .processo_repo
        .tarefas_por_usuario(&app_state.db_pool, usuario_id)
        .await?;

    Ok(Json(tarefas))
}

// GET /etapa/pendentes/:usuario_id
#[utoipa::path(
    get,
    path = "/etapa/pendentes/{usuarioId}",
    tag = "Etapas",
    params(("usuarioId" = i32, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Quantidade de tarefas em andamento", body = PendentesResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn contar_etapas_pendentes(
    State(app_state): State<AppState>,
    Path(usuario_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let quantidade = app_state
        .processo_repo
        .contar_tarefas_em_andamento(&app_state.db_pool, usuario_id)
        .await?;

    Ok(Json(PendentesResponse { quantidade }))
}
