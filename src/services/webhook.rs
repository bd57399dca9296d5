// src/services/webhook.rs

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::models::auth::ContatoUsuario;
use crate::services::notifier::{CanalNotificacao, TarefaNotificacao};

const TIMEOUT: Duration = Duration::from_secs(10);

// Corpo que o fluxo do n8n espera receber
#[derive(Debug, Serialize)]
pub struct NovaTarefaWebhook<'a> {
    pub nome: &'a str,
    pub telefone: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<&'a str>,
    pub tarefa: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processo: Option<&'a str>,
    pub link: &'a str,
}

#[derive(Clone)]
pub struct WebhookService {
    client: reqwest::Client,
    url: String,
}

impl WebhookService {
    pub fn new(url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .build()
            .expect("Falha ao construir o cliente HTTP do webhook");

        Self { client, url }
    }

    pub async fn notificar_nova_tarefa(
        &self,
        dados: &NovaTarefaWebhook<'_>,
    ) -> anyhow::Result<()> {
        self.client
            .post(&self.url)
            .json(dados)
            .send()
            .await?
            .error_for_status()?;

        tracing::info!("🚀 Webhook n8n disparado com sucesso para {}", dados.telefone);
        Ok(())
    }
}

#[async_trait]
impl CanalNotificacao for WebhookService {
    fn nome(&self) -> &'static str {
        "n8n"
    }

    fn aplicavel(&self, contato: &ContatoUsuario) -> bool {
        contato.telefone.as_deref().is_some_and(|t| !t.is_empty())
    }

    async fn enviar(
        &self,
        contato: &ContatoUsuario,
        tarefa: &TarefaNotificacao,
    ) -> anyhow::Result<()> {
        self.notificar_nova_tarefa(&NovaTarefaWebhook {
            nome: &contato.nome,
            telefone: contato.telefone.as_deref().unwrap_or_default(),
            email: contato.email.as_deref(),
            tarefa: &tarefa.etapa_nome,
            processo: tarefa.processo_nome.as_deref(),
            link: &tarefa.link,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn posta_o_corpo_que_o_fluxo_espera() {
        let server = httpmock::MockServer::start_async().await;

        let mock = server
            .mock_async(|when, then| {
                when.method(httpmock::Method::POST)
                    .path("/webhook/ventura")
                    .json_body(serde_json::json!({
                        "nome": "Ana",
                        "telefone": "11988887777",
                        "email": "ana@imobiliaria.com",
                        "tarefa": "Vistoria",
                        "processo": "Locação Apto 42",
                        "link": "https://painel.example/processos/1/etapas/8",
                    }));
                then.status(200);
            })
            .await;

        let service = WebhookService::new(server.url("/webhook/ventura"));

        service
            .notificar_nova_tarefa(&NovaTarefaWebhook {
                nome: "Ana",
                telefone: "11988887777",
                email: Some("ana@imobiliaria.com"),
                tarefa: "Vistoria",
                processo: Some("Locação Apto 42"),
                link: "https://painel.example/processos/1/etapas/8",
            })
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn erro_http_do_fluxo_e_propagado_ao_chamador() {
        let server = httpmock::MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(httpmock::Method::POST).path("/webhook/ventura");
                then.status(500);
            })
            .await;

        let service = WebhookService::new(server.url("/webhook/ventura"));

        let resultado = service
            .notificar_nova_tarefa(&NovaTarefaWebhook {
                nome: "Ana",
                telefone: "11988887777",
                email: None,
                tarefa: "Vistoria",
                processo: None,
                link: "https://painel.example",
            })
            .await;

        assert!(resultado.is_err());
    }
}
