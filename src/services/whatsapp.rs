// src/services/whatsapp.rs

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::models::auth::ContatoUsuario;
use crate::services::notifier::{CanalNotificacao, TarefaNotificacao};

const GRAPH_BASE_URL: &str = "https://graph.facebook.com";
const TIMEOUT: Duration = Duration::from_secs(20);

// Template aprovado no Manager:
// "Olá {{1}}, você recebeu uma nova tarefa: {{2}}. Acesse o sistema para mais detalhes."
const TEMPLATE_AVISO: &str = "aviso_funcionario";
const LANG_PADRAO: &str = "pt_BR";

/// Normaliza o telefone para dígitos com código do país (55 quando ausente).
pub fn to_e164(numero: &str) -> String {
    let digitos: String = numero.chars().filter(|c| c.is_ascii_digit()).collect();
    if digitos.starts_with("55") {
        digitos
    } else {
        format!("55{}", digitos)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnvioTemplate {
    pub to: String,
    pub template: String,
    pub lang: String,
    pub body_params: Vec<String>,
    // Variáveis do botão de URL dinâmica (normalmente só uma)
    pub button_url_params: Vec<String>,
}

// Monta o corpo esperado pela Graph API (messaging_product/template/components)
fn montar_payload(envio: &EnvioTemplate) -> Value {
    let mut components = Vec::new();

    if !envio.body_params.is_empty() {
        components.push(json!({
            "type": "body",
            "parameters": envio.body_params.iter()
                .map(|t| json!({ "type": "text", "text": t }))
                .collect::<Vec<_>>(),
        }));
    }

    for (index, param) in envio.button_url_params.iter().enumerate() {
        components.push(json!({
            "type": "button",
            "sub_type": "url",
            "index": index.to_string(),
            "parameters": [{ "type": "text", "text": param }],
        }));
    }

    let mut template = json!({
        "name": envio.template,
        "language": { "code": envio.lang },
    });
    if !components.is_empty() {
        template["components"] = Value::Array(components);
    }

    json!({
        "messaging_product": "whatsapp",
        "to": to_e164(&envio.to),
        "type": "template",
        "template": template,
    })
}

#[derive(Clone)]
pub struct WhatsappService {
    client: reqwest::Client,
    token: String,
    phone_number_id: String,
    graph_version: String,
    base_url: String,
}

impl WhatsappService {
    pub fn new(token: String, phone_number_id: String, graph_version: String) -> Self {
        Self::with_base_url(token, phone_number_id, graph_version, GRAPH_BASE_URL.to_string())
    }

    // Construtor com URL configurável para apontar a um servidor de teste
    pub fn with_base_url(
        token: String,
        phone_number_id: String,
        graph_version: String,
        base_url: String,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .build()
            .expect("Falha ao construir o cliente HTTP do WhatsApp");

        Self {
            client,
            token,
            phone_number_id,
            graph_version,
            base_url,
        }
    }

    pub async fn send_template(&self, envio: &EnvioTemplate) -> anyhow::Result<Value> {
        let payload = montar_payload(envio);
        let url = format!(
            "{}/{}/{}/messages",
            self.base_url, self.graph_version, self.phone_number_id
        );

        tracing::debug!("➡️ Enviando WA payload: {}", payload);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or_else(|_| json!({}));

        tracing::debug!("⬅️ WA response {}: {}", status, body);

        if !status.is_success() {
            anyhow::bail!("WA API error {}: {}", status, body);
        }

        Ok(body)
    }
}

#[async_trait]
impl CanalNotificacao for WhatsappService {
    fn nome(&self) -> &'static str {
        "whatsapp"
    }

    fn aplicavel(&self, contato: &ContatoUsuario) -> bool {
        contato.telefone.as_deref().is_some_and(|t| !t.is_empty())
    }

    async fn enviar(
        &self,
        contato: &ContatoUsuario,
        tarefa: &TarefaNotificacao,
    ) -> anyhow::Result<()> {
        let telefone = contato
            .telefone
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("contato sem telefone"))?;

        self.send_template(&EnvioTemplate {
            to: telefone.to_string(),
            template: TEMPLATE_AVISO.to_string(),
            lang: LANG_PADRAO.to_string(),
            body_params: vec![contato.nome.clone(), tarefa.etapa_nome.clone()],
            button_url_params: vec![tarefa.botao_url.clone()],
        })
        .await?;

        tracing::info!("💬 WhatsApp (template) enviado para {}", telefone);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normaliza_telefone_sem_codigo_do_pais() {
        assert_eq!(to_e164("(11) 98888-7777"), "5511988887777");
    }

    #[test]
    fn mantem_telefone_ja_prefixado() {
        assert_eq!(to_e164("5511988887777"), "5511988887777");
    }

    #[test]
    fn descarta_tudo_que_nao_for_digito() {
        assert_eq!(to_e164("+55 (11) 9 8888-7777"), "5511988887777");
    }

    #[test]
    fn payload_do_template_tem_corpo_e_botao() {
        let payload = montar_payload(&EnvioTemplate {
            to: "11988887777".into(),
            template: "aviso_funcionario".into(),
            lang: "pt_BR".into(),
            body_params: vec!["Ana".into(), "Vistoria".into()],
            button_url_params: vec!["processos/1/etapas/8".into()],
        });

        assert_eq!(payload["messaging_product"], "whatsapp");
        assert_eq!(payload["to"], "5511988887777");
        assert_eq!(payload["type"], "template");
        assert_eq!(payload["template"]["name"], "aviso_funcionario");
        assert_eq!(payload["template"]["language"]["code"], "pt_BR");

        let components = payload["template"]["components"].as_array().unwrap();
        assert_eq!(components.len(), 2);
        assert_eq!(components[0]["type"], "body");
        assert_eq!(components[0]["parameters"][1]["text"], "Vistoria");
        assert_eq!(components[1]["type"], "button");
        assert_eq!(components[1]["sub_type"], "url");
        assert_eq!(components[1]["index"], "0");
        assert_eq!(components[1]["parameters"][0]["text"], "processos/1/etapas/8");
    }

    #[test]
    fn payload_sem_parametros_omite_components() {
        let payload = montar_payload(&EnvioTemplate {
            to: "11988887777".into(),
            template: "aviso_simples".into(),
            lang: "pt_BR".into(),
            ..Default::default()
        });

        assert!(payload["template"].get("components").is_none());
    }

    fn envio_de_teste() -> EnvioTemplate {
        EnvioTemplate {
            to: "11988887777".into(),
            template: "aviso_funcionario".into(),
            lang: "pt_BR".into(),
            body_params: vec!["Ana".into(), "Vistoria".into()],
            button_url_params: vec!["processos/1/etapas/8".into()],
        }
    }

    #[tokio::test]
    async fn envia_template_para_a_graph_api() {
        let server = httpmock::MockServer::start_async().await;

        let mock = server
            .mock_async(|when, then| {
                when.method(httpmock::Method::POST)
                    .path("/v20.0/12345/messages")
                    .header("authorization", "Bearer token-teste")
                    .json_body_partial(
                        r#"{ "messaging_product": "whatsapp", "to": "5511988887777", "type": "template" }"#,
                    );
                then.status(200)
                    .json_body(serde_json::json!({ "messages": [{ "id": "wamid.teste" }] }));
            })
            .await;

        let service = WhatsappService::with_base_url(
            "token-teste".into(),
            "12345".into(),
            "v20.0".into(),
            server.url(""),
        );

        let resposta = service.send_template(&envio_de_teste()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(resposta["messages"][0]["id"], "wamid.teste");
    }

    #[tokio::test]
    async fn status_fora_de_2xx_vira_erro() {
        let server = httpmock::MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(httpmock::Method::POST).path("/v20.0/12345/messages");
                then.status(401)
                    .json_body(serde_json::json!({ "error": { "message": "Invalid OAuth" } }));
            })
            .await;

        let service = WhatsappService::with_base_url(
            "token-invalido".into(),
            "12345".into(),
            "v20.0".into(),
            server.url(""),
        );

        let erro = service.send_template(&envio_de_teste()).await.unwrap_err();
        assert!(erro.to_string().contains("WA API error"));
    }
}
