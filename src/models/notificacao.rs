// src/models/notificacao.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

// Registro de notificação: escrito uma vez, nunca consumido pela lógica
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notificacao {
    pub id: i32,
    pub usuario_id: i32,
    pub etapa_id: i32,
    pub mensagem: String,
    pub criada_em: DateTime<Utc>,
}
