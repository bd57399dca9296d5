// src/services/email.rs

use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use crate::models::auth::ContatoUsuario;
use crate::services::notifier::{CanalNotificacao, TarefaNotificacao};

const SMTP_HOST: &str = "smtp.gmail.com";
const TIMEOUT: Duration = Duration::from_secs(10);

// Corpo fixo no formato que o time já conhece: saudação + lista de tarefas
fn montar_html(linhas: &[String]) -> String {
    let itens: String = linhas
        .iter()
        .map(|l| format!("<li>{}</li>", l))
        .collect();

    format!(
        "<h2>Olá!</h2>\n<p>Você possui as seguintes tarefas em andamento:</p>\n<ul>{}</ul>",
        itens
    )
}

#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailService {
    pub fn new(usuario: String, senha: String) -> anyhow::Result<Self> {
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(SMTP_HOST)?
            .credentials(Credentials::new(usuario.clone(), senha))
            .timeout(Some(TIMEOUT))
            .build();

        let from = Mailbox::new(Some("Sistema Imobiliária".to_string()), usuario.parse()?);

        Ok(Self { mailer, from })
    }

    pub async fn enviar_email(
        &self,
        destinatario: &str,
        assunto: &str,
        linhas: &[String],
    ) -> anyhow::Result<()> {
        tracing::debug!("📧 Tentando enviar e-mail para: {}", destinatario);

        let mensagem = Message::builder()
            .from(self.from.clone())
            .to(destinatario.parse()?)
            .subject(assunto)
            .header(ContentType::TEXT_HTML)
            .body(montar_html(linhas))?;

        self.mailer.send(mensagem).await?;

        tracing::info!("📧 E-mail enviado para {}", destinatario);
        Ok(())
    }
}

#[async_trait]
impl CanalNotificacao for EmailService {
    fn nome(&self) -> &'static str {
        "email"
    }

    fn aplicavel(&self, contato: &ContatoUsuario) -> bool {
        contato.email.as_deref().is_some_and(|e| !e.is_empty())
    }

    async fn enviar(
        &self,
        contato: &ContatoUsuario,
        tarefa: &TarefaNotificacao,
    ) -> anyhow::Result<()> {
        let destinatario = contato
            .email
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("contato sem e-mail"))?;

        let recebida = match &tarefa.processo_nome {
            Some(processo) => format!(
                "Você recebeu a tarefa: {} no processo {}.",
                tarefa.etapa_nome, processo
            ),
            None => format!("Você recebeu uma nova tarefa: {}.", tarefa.etapa_nome),
        };

        let linhas = vec![
            format!("Olá {},", contato.nome),
            recebida,
            "Acesse o sistema para mais detalhes:".to_string(),
            tarefa.link.clone(),
        ];

        self.enviar_email(
            destinatario,
            &format!("Nova tarefa: {}", tarefa.etapa_nome),
            &linhas,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corpo_html_lista_todas_as_linhas() {
        let html = montar_html(&[
            "Olá Ana,".to_string(),
            "Você recebeu uma nova tarefa: Vistoria.".to_string(),
        ]);

        assert!(html.contains("<li>Olá Ana,</li>"));
        assert!(html.contains("<li>Você recebeu uma nova tarefa: Vistoria.</li>"));
        assert!(html.starts_with("<h2>Olá!</h2>"));
    }
}
