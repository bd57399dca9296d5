// src/services/notifier.rs

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinSet;

use crate::models::auth::ContatoUsuario;

// Contexto de uma tarefa recém-ativada, montado uma única vez pelo engine
#[derive(Debug, Clone)]
pub struct TarefaNotificacao {
    pub etapa_nome: String,
    pub processo_nome: Option<String>,
    // URL completa do painel (e-mail e webhook)
    pub link: String,
    // Sufixo para o botão de URL dinâmica do template do WhatsApp
    pub botao_url: String,
}

/// Um canal de saída (e-mail, WhatsApp, webhook). Cada canal decide sozinho
/// se o contato disponível é suficiente para agir.
#[async_trait]
pub trait CanalNotificacao: Send + Sync {
    fn nome(&self) -> &'static str;

    fn aplicavel(&self, contato: &ContatoUsuario) -> bool;

    async fn enviar(
        &self,
        contato: &ContatoUsuario,
        tarefa: &TarefaNotificacao,
    ) -> anyhow::Result<()>;
}

// Resultado etiquetado de uma tentativa de canal
#[derive(Debug)]
pub struct ResultadoCanal {
    pub canal: &'static str,
    pub resultado: Result<(), String>,
}

impl ResultadoCanal {
    pub fn sucesso(&self) -> bool {
        self.resultado.is_ok()
    }
}

// Ponto de extensão: por padrão uma tentativa única, sem backoff.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub tentativas: u32,
    pub intervalo: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            tentativas: 1,
            intervalo: Duration::ZERO,
        }
    }
}

/// Fan-out de notificações: dispara todos os canais aplicáveis de forma
/// concorrente num JoinSet e coleta um resultado etiquetado por canal. A
/// falha de um canal nunca afeta os demais nem o chamador.
#[derive(Clone)]
pub struct Notifier {
    canais: Vec<Arc<dyn CanalNotificacao>>,
    retry: RetryPolicy,
}

impl Notifier {
    pub fn new(canais: Vec<Arc<dyn CanalNotificacao>>) -> Self {
        Self {
            canais,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn canais_ativos(&self) -> usize {
        self.canais.len()
    }

    pub async fn notificar(
        &self,
        contato: &ContatoUsuario,
        tarefa: &TarefaNotificacao,
    ) -> Vec<ResultadoCanal> {
        let contato = Arc::new(contato.clone());
        let tarefa = Arc::new(tarefa.clone());

        let mut set = JoinSet::new();

        for canal in self.canais.iter() {
            if !canal.aplicavel(&contato) {
                tracing::debug!(
                    "Canal {} pulado para {}: sem contato aplicável",
                    canal.nome(),
                    contato.nome
                );
                continue;
            }

            let canal = Arc::clone(canal);
            let contato = Arc::clone(&contato);
            let tarefa = Arc::clone(&tarefa);
            let retry = self.retry;

            set.spawn(async move {
                let mut tentativa = 0u32;
                loop {
                    tentativa += 1;
                    match canal.enviar(&contato, &tarefa).await {
                        Ok(()) => {
                            break ResultadoCanal {
                                canal: canal.nome(),
                                resultado: Ok(()),
                            };
                        }
                        Err(e) if tentativa < retry.tentativas => {
                            tracing::warn!(
                                "Canal {} falhou (tentativa {}): {}",
                                canal.nome(),
                                tentativa,
                                e
                            );
                            tokio::time::sleep(retry.intervalo).await;
                        }
                        Err(e) => {
                            break ResultadoCanal {
                                canal: canal.nome(),
                                resultado: Err(e.to_string()),
                            };
                        }
                    }
                }
            });
        }

        let mut resultados = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(resultado) => {
                    match &resultado.resultado {
                        Ok(()) => tracing::info!(
                            "✅ Canal {} notificou {}",
                            resultado.canal,
                            contato.nome
                        ),
                        Err(e) => tracing::error!(
                            "❌ Falha ao notificar (canal {}): {}",
                            resultado.canal,
                            e
                        ),
                    }
                    resultados.push(resultado);
                }
                Err(e) => {
                    tracing::error!("❌ Task de notificação abortada: {}", e);
                }
            }
        }

        resultados
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    struct CanalFixo {
        nome: &'static str,
        falha: bool,
        chamadas: AtomicU32,
    }

    impl CanalFixo {
        fn ok(nome: &'static str) -> Self {
            Self {
                nome,
                falha: false,
                chamadas: AtomicU32::new(0),
            }
        }

        fn falho(nome: &'static str) -> Self {
            Self {
                nome,
                falha: true,
                chamadas: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl CanalNotificacao for CanalFixo {
        fn nome(&self) -> &'static str {
            self.nome
        }

        fn aplicavel(&self, _contato: &ContatoUsuario) -> bool {
            true
        }

        async fn enviar(
            &self,
            _contato: &ContatoUsuario,
            _tarefa: &TarefaNotificacao,
        ) -> anyhow::Result<()> {
            self.chamadas.fetch_add(1, Ordering::SeqCst);
            if self.falha {
                anyhow::bail!("canal fora do ar")
            }
            Ok(())
        }
    }

    // Canal que exige e-mail no contato
    struct CanalSoEmail;

    #[async_trait]
    impl CanalNotificacao for CanalSoEmail {
        fn nome(&self) -> &'static str {
            "email"
        }

        fn aplicavel(&self, contato: &ContatoUsuario) -> bool {
            contato.email.is_some()
        }

        async fn enviar(
            &self,
            _contato: &ContatoUsuario,
            _tarefa: &TarefaNotificacao,
        ) -> anyhow::Result<()> {
            Ok(())
        }
    }

    // Falha nas primeiras N tentativas, depois passa
    struct CanalIntermitente {
        falhas_antes: u32,
        chamadas: AtomicU32,
    }

    #[async_trait]
    impl CanalNotificacao for CanalIntermitente {
        fn nome(&self) -> &'static str {
            "intermitente"
        }

        fn aplicavel(&self, _contato: &ContatoUsuario) -> bool {
            true
        }

        async fn enviar(
            &self,
            _contato: &ContatoUsuario,
            _tarefa: &TarefaNotificacao,
        ) -> anyhow::Result<()> {
            let chamada = self.chamadas.fetch_add(1, Ordering::SeqCst);
            if chamada < self.falhas_antes {
                anyhow::bail!("indisponível")
            }
            Ok(())
        }
    }

    fn contato() -> ContatoUsuario {
        ContatoUsuario {
            nome: "Ana".into(),
            email: Some("ana@imobiliaria.com".into()),
            telefone: Some("11988887777".into()),
        }
    }

    fn tarefa() -> TarefaNotificacao {
        TarefaNotificacao {
            etapa_nome: "Vistoria".into(),
            processo_nome: Some("Locação Apto 42".into()),
            link: "https://painel.example/processos/1/etapas/8".into(),
            botao_url: "processos/1/etapas/8".into(),
        }
    }

    #[tokio::test]
    async fn falha_parcial_nao_derruba_os_demais_canais() {
        let notifier = Notifier::new(vec![
            Arc::new(CanalFixo::ok("whatsapp")),
            Arc::new(CanalFixo::falho("email")),
        ]);

        let resultados = notifier.notificar(&contato(), &tarefa()).await;

        assert_eq!(resultados.len(), 2);
        let ok = resultados.iter().find(|r| r.canal == "whatsapp").unwrap();
        let err = resultados.iter().find(|r| r.canal == "email").unwrap();
        assert!(ok.sucesso());
        assert!(!err.sucesso());
    }

    #[tokio::test]
    async fn todos_os_canais_falhando_ainda_retorna_resultados() {
        let notifier = Notifier::new(vec![
            Arc::new(CanalFixo::falho("whatsapp")),
            Arc::new(CanalFixo::falho("email")),
            Arc::new(CanalFixo::falho("n8n")),
        ]);

        let resultados = notifier.notificar(&contato(), &tarefa()).await;

        assert_eq!(resultados.len(), 3);
        assert!(resultados.iter().all(|r| !r.sucesso()));
    }

    #[tokio::test]
    async fn canal_sem_contato_aplicavel_e_pulado() {
        let notifier = Notifier::new(vec![Arc::new(CanalSoEmail)]);

        let sem_email = ContatoUsuario {
            nome: "Bruno".into(),
            email: None,
            telefone: Some("11977776666".into()),
        };

        let resultados = notifier.notificar(&sem_email, &tarefa()).await;
        assert!(resultados.is_empty());
    }

    #[tokio::test]
    async fn retry_policy_reexecuta_o_canal() {
        let canal = Arc::new(CanalIntermitente {
            falhas_antes: 1,
            chamadas: AtomicU32::new(0),
        });

        let notifier = Notifier::new(vec![canal.clone()]).with_retry(RetryPolicy {
            tentativas: 2,
            intervalo: Duration::ZERO,
        });

        let resultados = notifier.notificar(&contato(), &tarefa()).await;

        assert_eq!(resultados.len(), 1);
        assert!(resultados[0].sucesso());
        assert_eq!(canal.chamadas.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn sem_retry_a_falha_e_definitiva() {
        let canal = Arc::new(CanalIntermitente {
            falhas_antes: 1,
            chamadas: AtomicU32::new(0),
        });

        let notifier = Notifier::new(vec![canal.clone()]);

        let resultados = notifier.notificar(&contato(), &tarefa()).await;

        assert!(!resultados[0].sucesso());
        assert_eq!(canal.chamadas.load(Ordering::SeqCst), 1);
    }

    // Fan-out de ponta a ponta com os transportes reais contra um servidor
    // HTTP de teste: a Graph API fora do ar não impede o webhook de sair.
    #[tokio::test]
    async fn fanout_http_com_falha_parcial() {
        use crate::services::webhook::WebhookService;
        use crate::services::whatsapp::WhatsappService;

        let server = httpmock::MockServer::start_async().await;

        let wa_mock = server
            .mock_async(|when, then| {
                when.method(httpmock::Method::POST).path("/v20.0/12345/messages");
                then.status(500)
                    .json_body(serde_json::json!({ "error": { "message": "instável" } }));
            })
            .await;

        let webhook_mock = server
            .mock_async(|when, then| {
                when.method(httpmock::Method::POST).path("/webhook/ventura");
                then.status(200);
            })
            .await;

        let notifier = Notifier::new(vec![
            Arc::new(WhatsappService::with_base_url(
                "token".into(),
                "12345".into(),
                "v20.0".into(),
                server.url(""),
            )),
            Arc::new(WebhookService::new(server.url("/webhook/ventura"))),
        ]);

        let resultados = notifier.notificar(&contato(), &tarefa()).await;

        wa_mock.assert_async().await;
        webhook_mock.assert_async().await;

        assert_eq!(resultados.len(), 2);
        let wa = resultados.iter().find(|r| r.canal == "whatsapp").unwrap();
        let n8n = resultados.iter().find(|r| r.canal == "n8n").unwrap();
        assert!(!wa.sucesso());
        assert!(n8n.sucesso());
    }
}
