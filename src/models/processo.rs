// src/models/processo.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

// --- ENUMS ---

// Mapeia o CREATE TYPE etapa_status do banco.
// Uma etapa recém-criada pode ter status NULL; o sistema lê NULL como pendente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "etapa_status")]
pub enum EtapaStatus {
    #[sqlx(rename = "pendente")]
    #[serde(rename = "pendente")]
    Pendente,

    #[sqlx(rename = "em andamento")]
    #[serde(rename = "em andamento")]
    EmAndamento,

    #[sqlx(rename = "finalizada")]
    #[serde(rename = "finalizada")]
    Finalizada,
}

// O status do processo fica como texto livre no banco ('em andamento',
// 'concluído', 'analise'...). A lógica só distingue concluído do resto.
pub const PROCESSO_CONCLUIDO: &str = "concluído";

// --- LINHAS DO BANCO ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cliente {
    pub id: i32,
    pub nome: String,
    pub telefone: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Processo {
    pub id: i32,
    pub nome: String,
    pub tipo_id: Option<i32>,
    pub cliente_id: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Etapa {
    pub id: i32,
    pub processo_id: i32,
    pub nome: String,
    pub ordem: i32,
    pub status: Option<EtapaStatus>,
    pub usuario_id: Option<i32>,
    pub prazo: Option<NaiveDate>,
    pub urgencia: bool,
    pub observacoes: Option<String>,
}

impl Etapa {
    // NULL no banco conta como pendente
    pub fn esta_pendente(&self) -> bool {
        matches!(self.status, None | Some(EtapaStatus::Pendente))
    }

    pub fn esta_finalizada(&self) -> bool {
        self.status == Some(EtapaStatus::Finalizada)
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TipoProcesso {
    pub id: i32,
    pub nome: String,
}

// --- PAYLOADS DO UPSERT ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientePayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Maria da Silva")]
    pub nome: String,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "11988887777")]
    pub telefone: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessoPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Locação Apto 42")]
    pub nome: String,

    pub tipo_id: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EtapaPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Documentação")]
    pub nome: String,

    pub usuario_id: Option<i32>,

    #[schema(value_type = Option<String>, format = Date, example = "2026-09-01")]
    pub prazo: Option<NaiveDate>,

    // Ausente no JSON significa "mantém o que já existe"
    pub urgencia: Option<bool>,

    pub observacoes: Option<String>,

    // Só é considerado no PUT; o POST deriva o status pela posição
    pub status: Option<EtapaStatus>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertProcessoPayload {
    #[validate(nested)]
    pub cliente: ClientePayload,

    #[validate(nested)]
    pub processo: ProcessoPayload,

    #[validate(nested)]
    pub etapas: Vec<EtapaPayload>,
}

// No PUT cliente/processo são opcionais: só as etapas são obrigatórias
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AtualizarProcessoPayload {
    #[validate(nested)]
    pub cliente: Option<ClientePayload>,

    #[validate(nested)]
    pub processo: Option<ProcessoPayload>,

    #[validate(nested)]
    pub etapas: Vec<EtapaPayload>,
}

// --- RESPOSTAS DE LEITURA ---

// Linha da listagem geral, com a etapa atual derivada na leitura
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessoResumo {
    pub processo_id: i32,
    pub processo_nome: String,
    pub processo_status: String,
    pub cliente_nome: String,
    pub etapa_atual: String,

    #[sqlx(skip)]
    pub etapas: Vec<EtapaResumo>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EtapaResumo {
    pub id: i32,
    pub nome: String,
    pub status: Option<EtapaStatus>,
    pub processo_id: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessoDetalhe {
    #[serde(flatten)]
    pub processo: Processo,
    pub cliente: Cliente,
    pub etapas: Vec<Etapa>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertProcessoResponse {
    pub message: String,
    pub cliente_id: i32,
    pub processo_id: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletarProcessoResponse {
    pub message: String,
    pub processo_id: i32,
    pub cliente_deletado: bool,
}
