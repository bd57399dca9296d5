// src/config.rs

use std::sync::Arc;
use std::{env, time::Duration};

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    db::{DashboardRepository, NotificacaoRepository, ProcessoRepository, UsuarioRepository},
    services::{
        auth::AuthService,
        email::EmailService,
        notifier::{CanalNotificacao, Notifier},
        processo_service::ProcessoService,
        webhook::WebhookService,
        whatsapp::WhatsappService,
    },
};

const FRONTEND_URL_PADRAO: &str = "https://www.painelventura.com.br";
const WA_GRAPH_VERSION_PADRAO: &str = "v20.0";

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub processo_service: ProcessoService,
    pub usuario_repo: UsuarioRepository,
    pub processo_repo: ProcessoRepository,
    pub dashboard_repo: DashboardRepository,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        // Credenciais obrigatórias: sem elas a aplicação não deve subir
        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(20)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let base_url = env::var("FRONTEND_URL").unwrap_or_else(|_| FRONTEND_URL_PADRAO.to_string());

        // --- Monta o gráfico de dependências ---
        let usuario_repo = UsuarioRepository::new(db_pool.clone());
        let processo_repo = ProcessoRepository::new(db_pool.clone());
        let notificacao_repo = NotificacaoRepository::new(db_pool.clone());
        let dashboard_repo = DashboardRepository::new(db_pool.clone());

        let auth_service = AuthService::new(usuario_repo.clone(), jwt_secret);

        let notifier = Notifier::new(montar_canais()?);
        tracing::info!("🔔 Notificador configurado com {} canal(is)", notifier.canais_ativos());

        let processo_service = ProcessoService::new(
            db_pool.clone(),
            processo_repo.clone(),
            usuario_repo.clone(),
            notificacao_repo,
            notifier,
            base_url,
        );

        Ok(Self {
            db_pool,
            auth_service,
            processo_service,
            usuario_repo,
            processo_repo,
            dashboard_repo,
        })
    }
}

/// Cada canal só entra quando as credenciais dele estão completas. Um par
/// meio-configurado derruba a inicialização em vez de falhar em silêncio na
/// primeira notificação.
fn montar_canais() -> anyhow::Result<Vec<Arc<dyn CanalNotificacao>>> {
    let mut canais: Vec<Arc<dyn CanalNotificacao>> = Vec::new();

    match (env::var("EMAIL_USER").ok(), env::var("EMAIL_PASS").ok()) {
        (Some(usuario), Some(senha)) => {
            canais.push(Arc::new(EmailService::new(usuario, senha)?));
        }
        (None, None) => {
            tracing::warn!("⚠️ EMAIL_USER/EMAIL_PASS ausentes; canal de e-mail desabilitado");
        }
        _ => anyhow::bail!("EMAIL_USER e EMAIL_PASS precisam ser definidos juntos"),
    }

    match (
        env::var("META_WHATSAPP_TOKEN").ok(),
        env::var("META_WHATSAPP_PHONE_NUMBER_ID").ok(),
    ) {
        (Some(token), Some(phone_number_id)) => {
            let graph_version = env::var("META_WHATSAPP_GRAPH_VERSION")
                .unwrap_or_else(|_| WA_GRAPH_VERSION_PADRAO.to_string());
            canais.push(Arc::new(WhatsappService::new(
                token,
                phone_number_id,
                graph_version,
            )));
        }
        (None, None) => {
            tracing::warn!("⚠️ Credenciais do WhatsApp ausentes; canal desabilitado");
        }
        _ => anyhow::bail!(
            "META_WHATSAPP_TOKEN e META_WHATSAPP_PHONE_NUMBER_ID precisam ser definidos juntos"
        ),
    }

    match env::var("N8N_WEBHOOK_URL").ok() {
        Some(url) => canais.push(Arc::new(WebhookService::new(url))),
        None => {
            tracing::warn!("⚠️ N8N_WEBHOOK_URL ausente; webhook desabilitado");
        }
    }

    Ok(canais)
}
