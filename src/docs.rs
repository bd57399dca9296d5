// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Processos ---
        handlers::processos::listar_processos,
        handlers::processos::buscar_processo_por_id,
        handlers::processos::criar_processo_completo,
        handlers::processos::atualizar_processo_completo,
        handlers::processos::deletar_processo_completo,

        // --- Etapas ---
        handlers::etapas::etapas_por_processo,
        handlers::etapas::finalizar_tarefa,
        handlers::etapas::tarefas_por_usuario,
        handlers::etapas::contar_etapas_pendentes,

        // --- Dashboard ---
        handlers::dashboard::get_dashboard_data,
    ),
    components(
        schemas(
            // --- Processos ---
            models::processo::EtapaStatus,
            models::processo::Cliente,
            models::processo::Processo,
            models::processo::Etapa,
            models::processo::TipoProcesso,
            models::processo::ProcessoResumo,
            models::processo::EtapaResumo,
            models::processo::ProcessoDetalhe,
            models::processo::ClientePayload,
            models::processo::ProcessoPayload,
            models::processo::EtapaPayload,
            models::processo::UpsertProcessoPayload,
            models::processo::AtualizarProcessoPayload,
            models::processo::UpsertProcessoResponse,
            models::processo::DeletarProcessoResponse,

            // --- Etapas ---
            models::etapa::Tarefa,
            models::etapa::EtapaQuadro,
            models::etapa::EtapasDoProcesso,
            models::etapa::PendentesResponse,

            // --- Dashboard ---
            models::dashboard::DashboardData,
            models::dashboard::DashboardSummary,
            models::dashboard::BarEntry,
            models::dashboard::PieEntry,
            models::dashboard::ProcessoRecente,
        )
    ),
    tags(
        (name = "Processos", description = "Criação e acompanhamento de processos"),
        (name = "Etapas", description = "Quadro de etapas, tarefas e finalização"),
        (name = "Dashboard", description = "Indicadores e gráficos gerenciais")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
