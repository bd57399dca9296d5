// src/models/etapa.rs

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::models::processo::EtapaStatus;

// Tarefa atribuída a um usuário (tela "minhas tarefas")
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tarefa {
    pub id: i32,
    pub nome: String,
    pub prazo: Option<NaiveDate>,
    pub urgencia: bool,
    pub status: Option<EtapaStatus>,
    pub ordem: i32,
    pub processo_nome: String,
}

// Linha crua da consulta de etapas de um processo, com o nome do responsável
#[derive(Debug, Clone, FromRow)]
pub struct EtapaComResponsavel {
    pub nome: String,
    pub status: Option<EtapaStatus>,
    pub responsavel: Option<String>,
}

// Uma posição da régua fixa de etapas, preenchida com o que existe no banco
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EtapaQuadro {
    pub nome: String,
    pub status: EtapaStatus,
    pub responsavel: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EtapasDoProcesso {
    pub processo_id: i32,
    pub processo_nome: String,
    pub etapas: Vec<EtapaQuadro>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendentesResponse {
    pub quantidade: i64,
}
