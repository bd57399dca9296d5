// src/services/processo_service.rs

use sqlx::{PgConnection, PgPool};

use crate::{
    common::error::AppError,
    db::{NotificacaoRepository, ProcessoRepository, UsuarioRepository},
    models::{
        auth::ContatoUsuario,
        processo::{
            AtualizarProcessoPayload, DeletarProcessoResponse, Etapa, EtapaStatus,
            ProcessoDetalhe, ProcessoResumo, UpsertProcessoPayload, UpsertProcessoResponse,
        },
    },
    services::notifier::{Notifier, TarefaNotificacao},
};

// =========================================================================
//  DECISÕES PURAS DO AVANÇO
// =========================================================================

/// Regra posicional do upsert: a primeira etapa entra "em andamento", as
/// demais "pendente". 'finalizada' é pegajosa e nunca é rebaixada.
fn status_posicional(posicao: usize, existente: Option<EtapaStatus>) -> EtapaStatus {
    if existente == Some(EtapaStatus::Finalizada) {
        EtapaStatus::Finalizada
    } else if posicao == 0 {
        EtapaStatus::EmAndamento
    } else {
        EtapaStatus::Pendente
    }
}

/// Dada a ordem recém-finalizada, escolhe a etapa de `ordem + 1` que ainda
/// esteja pendente (ou sem status). Qualquer outra situação não avança nada.
fn proxima_etapa_elegivel(etapas: &[Etapa], ordem_finalizada: i32) -> Option<&Etapa> {
    etapas
        .iter()
        .find(|e| e.ordem == ordem_finalizada + 1 && e.esta_pendente())
}

/// Um processo conclui exatamente quando tem etapas e todas finalizaram.
fn todas_finalizadas(etapas: &[Etapa]) -> bool {
    !etapas.is_empty() && etapas.iter().all(|e| e.esta_finalizada())
}

// Fan-out adiado para depois do commit da transação
struct FanoutPendente {
    contato: ContatoUsuario,
    tarefa: TarefaNotificacao,
}

#[derive(Clone)]
pub struct ProcessoService {
    pool: PgPool,
    repo: ProcessoRepository,
    usuario_repo: UsuarioRepository,
    notificacao_repo: NotificacaoRepository,
    notifier: Notifier,
    base_url: String,
}

impl ProcessoService {
    pub fn new(
        pool: PgPool,
        repo: ProcessoRepository,
        usuario_repo: UsuarioRepository,
        notificacao_repo: NotificacaoRepository,
        notifier: Notifier,
        base_url: String,
    ) -> Self {
        Self {
            pool,
            repo,
            usuario_repo,
            notificacao_repo,
            notifier,
            base_url,
        }
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    /// Listagem geral. A etapa atual e a conclusão são derivadas na leitura;
    /// nenhuma escrita acontece aqui.
    pub async fn listar_processos(&self) -> Result<Vec<ProcessoResumo>, AppError> {
        let mut processos = self.repo.listar_processos(&self.pool).await?;
        if processos.is_empty() {
            return Ok(processos);
        }

        let ids: Vec<i32> = processos.iter().map(|p| p.processo_id).collect();
        let etapas = self.repo.listar_etapas_resumo(&self.pool, &ids).await?;

        for processo in processos.iter_mut() {
            processo.etapas = etapas
                .iter()
                .filter(|e| e.processo_id == processo.processo_id)
                .cloned()
                .collect();
        }

        Ok(processos)
    }

    pub async fn buscar_processo_detalhe(
        &self,
        processo_id: i32,
    ) -> Result<ProcessoDetalhe, AppError> {
        let processo = self
            .repo
            .buscar_processo(&self.pool, processo_id)
            .await?
            .ok_or(AppError::ProcessoNotFound)?;

        let cliente = self
            .repo
            .buscar_cliente(&self.pool, processo.cliente_id)
            .await?
            .ok_or(AppError::ProcessoNotFound)?;

        let etapas = self.repo.listar_etapas(&self.pool, processo_id).await?;

        Ok(ProcessoDetalhe {
            processo,
            cliente,
            etapas,
        })
    }

    // =========================================================================
    //  AGREGADOR DE STATUS
    // =========================================================================

    /// Reavalia a conclusão do processo dentro da transação corrente. Só
    /// transiciona para concluído; nunca reabre automaticamente.
    pub async fn recomputar_status_processo(
        &self,
        conn: &mut PgConnection,
        processo_id: i32,
    ) -> Result<bool, AppError> {
        let etapas = self.repo.listar_etapas(&mut *conn, processo_id).await?;

        if todas_finalizadas(&etapas) {
            let alteradas = self
                .repo
                .marcar_processo_concluido(&mut *conn, processo_id)
                .await?;
            return Ok(alteradas > 0);
        }

        Ok(false)
    }

    // =========================================================================
    //  ENGINE: FINALIZAÇÃO + AVANÇO
    // =========================================================================

    /// Finaliza a etapa, ativa a próxima elegível, registra a notificação e
    /// reavalia a conclusão, tudo numa transação única. O fan-out roda
    /// depois do commit e nunca desfaz a mutação.
    pub async fn finalizar_etapa(&self, etapa_id: i32) -> Result<Etapa, AppError> {
        let mut tx = self.pool.begin().await?;

        let finalizada = self
            .repo
            .finalizar_etapa(&mut *tx, etapa_id)
            .await?
            .ok_or(AppError::EtapaNotFound)?;

        let processo = self
            .repo
            .buscar_processo(&mut *tx, finalizada.processo_id)
            .await?
            .ok_or(AppError::ProcessoNotFound)?;

        let etapas = self
            .repo
            .listar_etapas(&mut *tx, finalizada.processo_id)
            .await?;

        let mut fanout: Option<FanoutPendente> = None;

        if let Some(alvo) = proxima_etapa_elegivel(&etapas, finalizada.ordem) {
            // O WHERE da promoção segura a corrida: se outra execução já
            // passou por aqui, a linha volta None e nada é notificado.
            if let Some(promovida) = self.repo.promover_etapa(&mut *tx, alvo.id).await? {
                if let Some(usuario_id) = promovida.usuario_id {
                    // Link profundo direto para a etapa recém-ativada
                    let link = format!(
                        "{}/processos/{}/etapas/{}",
                        self.base_url, promovida.processo_id, promovida.id
                    );
                    let botao_url =
                        format!("processos/{}/etapas/{}", promovida.processo_id, promovida.id);

                    fanout = self
                        .preparar_notificacao(
                            &mut tx,
                            usuario_id,
                            &promovida,
                            &processo.nome,
                            link,
                            botao_url,
                        )
                        .await?;
                }
            }
        }

        self.recomputar_status_processo(&mut tx, finalizada.processo_id)
            .await?;

        tx.commit().await?;

        if let Some(pendente) = fanout {
            self.notifier
                .notificar(&pendente.contato, &pendente.tarefa)
                .await;
        }

        Ok(finalizada)
    }

    /// Registra a notificação dentro da transação e devolve o fan-out pronto
    /// para rodar depois do commit. Usuário sem cadastro de contato não gera
    /// fan-out, só a linha no log.
    async fn preparar_notificacao(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        usuario_id: i32,
        etapa: &Etapa,
        nome_processo: &str,
        link: String,
        botao_url: String,
    ) -> Result<Option<FanoutPendente>, AppError> {
        let mensagem = format!(
            "Você tem uma nova tarefa: {} no processo {}",
            etapa.nome, nome_processo
        );

        self.notificacao_repo
            .registrar(&mut **tx, usuario_id, etapa.id, &mensagem)
            .await?;

        let Some(contato) = self.usuario_repo.contato(&mut **tx, usuario_id).await? else {
            return Ok(None);
        };

        Ok(Some(FanoutPendente {
            contato,
            tarefa: TarefaNotificacao {
                etapa_nome: etapa.nome.clone(),
                processo_nome: Some(nome_processo.to_string()),
                link,
                botao_url,
            },
        }))
    }

    // =========================================================================
    //  ENGINE: UPSERT COMPLETO
    // =========================================================================

    /// Criação/reaproveitamento de cliente, processo e etapas num lote
    /// transacional. Dedup: cliente por (nome, telefone), processo por
    /// (cliente, tipo), etapa por (processo, nome).
    pub async fn criar_processo_completo(
        &self,
        payload: UpsertProcessoPayload,
    ) -> Result<UpsertProcessoResponse, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Cliente
        let cliente = match self
            .repo
            .buscar_cliente_por_nome_telefone(
                &mut *tx,
                &payload.cliente.nome,
                &payload.cliente.telefone,
            )
            .await?
        {
            Some(cliente) => cliente,
            None => {
                self.repo
                    .criar_cliente(&mut *tx, &payload.cliente.nome, &payload.cliente.telefone)
                    .await?
            }
        };

        // 2. Processo
        let processo = match self
            .repo
            .buscar_processo_por_cliente_tipo(&mut *tx, cliente.id, payload.processo.tipo_id)
            .await?
        {
            Some(processo) => processo,
            None => {
                self.repo
                    .criar_processo(
                        &mut *tx,
                        &payload.processo.nome,
                        payload.processo.tipo_id,
                        cliente.id,
                    )
                    .await?
            }
        };

        // 3. Etapas (cria ou atualiza, preservando 'finalizada')
        let mut fanouts: Vec<FanoutPendente> = Vec::new();

        for (posicao, etapa_payload) in payload.etapas.iter().enumerate() {
            let ordem = (posicao + 1) as i32;

            let existente = self
                .repo
                .buscar_etapa_por_nome(&mut *tx, processo.id, &etapa_payload.nome)
                .await?;

            let status = status_posicional(posicao, existente.as_ref().and_then(|e| e.status));
            let ja_em_andamento = existente
                .as_ref()
                .is_some_and(|e| e.status == Some(EtapaStatus::EmAndamento));

            let etapa = match existente {
                Some(atual) => {
                    self.repo
                        .atualizar_etapa(
                            &mut *tx,
                            atual.id,
                            ordem,
                            Some(status),
                            etapa_payload.usuario_id.or(atual.usuario_id),
                            etapa_payload.prazo.or(atual.prazo),
                            etapa_payload.urgencia.unwrap_or(atual.urgencia),
                            etapa_payload
                                .observacoes
                                .as_deref()
                                .or(atual.observacoes.as_deref()),
                        )
                        .await?
                }
                None => {
                    self.repo
                        .criar_etapa(
                            &mut *tx,
                            processo.id,
                            &etapa_payload.nome,
                            ordem,
                            status,
                            etapa_payload.usuario_id,
                            etapa_payload.prazo,
                            etapa_payload.urgencia.unwrap_or(false),
                            etapa_payload.observacoes.as_deref(),
                        )
                        .await?
                }
            };

            // 4. Notificação para quem acabou de receber uma etapa ativa
            if status == EtapaStatus::EmAndamento && !ja_em_andamento {
                if let Some(usuario_id) = etapa.usuario_id {
                    if let Some(pendente) = self
                        .preparar_notificacao(
                            &mut tx,
                            usuario_id,
                            &etapa,
                            &processo.nome,
                            self.base_url.clone(),
                            "/".to_string(),
                        )
                        .await?
                    {
                        fanouts.push(pendente);
                    }
                }
            }
        }

        tx.commit().await?;

        self.disparar_fanouts(fanouts).await;

        Ok(UpsertProcessoResponse {
            message: "Processo criado/atualizado com sucesso".to_string(),
            cliente_id: cliente.id,
            processo_id: processo.id,
        })
    }

    /// Variante do PUT: patch de cliente/processo e das etapas existentes
    /// (casadas por nome), honrando o status enviado exceto sobre
    /// 'finalizada'.
    pub async fn atualizar_processo_completo(
        &self,
        processo_id: i32,
        payload: AtualizarProcessoPayload,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let processo = self
            .repo
            .buscar_processo(&mut *tx, processo_id)
            .await?
            .ok_or(AppError::ProcessoNotFound)?;

        if let Some(cliente) = &payload.cliente {
            self.repo
                .atualizar_cliente_do_processo(
                    &mut *tx,
                    processo_id,
                    &cliente.nome,
                    &cliente.telefone,
                )
                .await?;
        }

        let nome_processo = match &payload.processo {
            Some(p) => {
                self.repo
                    .atualizar_processo(&mut *tx, processo_id, &p.nome, p.tipo_id)
                    .await?;
                p.nome.clone()
            }
            None => processo.nome.clone(),
        };

        let mut fanouts: Vec<FanoutPendente> = Vec::new();

        for etapa_payload in payload.etapas.iter() {
            let Some(atual) = self
                .repo
                .buscar_etapa_por_nome(&mut *tx, processo_id, &etapa_payload.nome)
                .await?
            else {
                // Etapa desconhecida no PUT é ignorada; o POST é quem cria
                continue;
            };

            let novo_status = aplicar_status_pedido(atual.status, etapa_payload.status);

            let etapa = self
                .repo
                .atualizar_etapa(
                    &mut *tx,
                    atual.id,
                    atual.ordem,
                    novo_status,
                    etapa_payload.usuario_id,
                    etapa_payload.prazo,
                    etapa_payload.urgencia.unwrap_or(atual.urgencia),
                    etapa_payload.observacoes.as_deref(),
                )
                .await?;

            let entrou_em_andamento = novo_status == Some(EtapaStatus::EmAndamento)
                && atual.status != Some(EtapaStatus::EmAndamento);

            if entrou_em_andamento {
                if let Some(usuario_id) = etapa.usuario_id {
                    if let Some(pendente) = self
                        .preparar_notificacao(
                            &mut tx,
                            usuario_id,
                            &etapa,
                            &nome_processo,
                            self.base_url.clone(),
                            "/".to_string(),
                        )
                        .await?
                    {
                        fanouts.push(pendente);
                    }
                }
            }
        }

        // O PUT pode ter finalizado as últimas etapas
        self.recomputar_status_processo(&mut tx, processo_id).await?;

        tx.commit().await?;

        self.disparar_fanouts(fanouts).await;

        Ok(())
    }

    async fn disparar_fanouts(&self, fanouts: Vec<FanoutPendente>) {
        for pendente in fanouts {
            self.notifier
                .notificar(&pendente.contato, &pendente.tarefa)
                .await;
        }
    }

    // =========================================================================
    //  EXCLUSÃO
    // =========================================================================

    /// Apaga etapas e processo; o cliente some junto quando não sobra nenhum
    /// outro processo dele.
    pub async fn deletar_processo_completo(
        &self,
        processo_id: i32,
    ) -> Result<DeletarProcessoResponse, AppError> {
        let mut tx = self.pool.begin().await?;

        let processo = self
            .repo
            .buscar_processo(&mut *tx, processo_id)
            .await?
            .ok_or(AppError::ProcessoNotFound)?;

        self.repo
            .deletar_etapas_do_processo(&mut *tx, processo_id)
            .await?;
        self.repo.deletar_processo(&mut *tx, processo_id).await?;

        let restantes = self
            .repo
            .contar_processos_do_cliente(&mut *tx, processo.cliente_id)
            .await?;

        let cliente_deletado = restantes == 0;
        if cliente_deletado {
            self.repo
                .deletar_cliente(&mut *tx, processo.cliente_id)
                .await?;
        }

        tx.commit().await?;

        Ok(DeletarProcessoResponse {
            message: "Processo deletado com sucesso".to_string(),
            processo_id,
            cliente_deletado,
        })
    }
}

/// Status final de uma etapa no PUT: o pedido vale, exceto que 'finalizada'
/// nunca é rebaixada.
fn aplicar_status_pedido(
    atual: Option<EtapaStatus>,
    pedido: Option<EtapaStatus>,
) -> Option<EtapaStatus> {
    if atual == Some(EtapaStatus::Finalizada) {
        return atual;
    }
    pedido.or(atual)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn etapa(id: i32, ordem: i32, status: Option<EtapaStatus>) -> Etapa {
        Etapa {
            id,
            processo_id: 1,
            nome: format!("Etapa {}", ordem),
            ordem,
            status,
            usuario_id: None,
            prazo: None,
            urgencia: false,
            observacoes: None,
        }
    }

    // --- regra posicional do upsert ---

    #[test]
    fn primeira_etapa_nova_entra_em_andamento() {
        assert_eq!(status_posicional(0, None), EtapaStatus::EmAndamento);
    }

    #[test]
    fn demais_etapas_novas_ficam_pendentes() {
        assert_eq!(status_posicional(1, None), EtapaStatus::Pendente);
        assert_eq!(status_posicional(7, Some(EtapaStatus::Pendente)), EtapaStatus::Pendente);
    }

    #[test]
    fn finalizada_e_pegajosa_em_qualquer_posicao() {
        assert_eq!(
            status_posicional(0, Some(EtapaStatus::Finalizada)),
            EtapaStatus::Finalizada
        );
        assert_eq!(
            status_posicional(3, Some(EtapaStatus::Finalizada)),
            EtapaStatus::Finalizada
        );
    }

    #[test]
    fn etapa_posterior_em_andamento_volta_para_pendente() {
        // Regra posicional vale para tudo que não estiver finalizado
        assert_eq!(
            status_posicional(2, Some(EtapaStatus::EmAndamento)),
            EtapaStatus::Pendente
        );
    }

    // --- seleção da próxima etapa ---

    #[test]
    fn finalizar_a_primeira_promove_a_segunda_e_nao_a_terceira() {
        let etapas = vec![
            etapa(1, 1, Some(EtapaStatus::Finalizada)),
            etapa(2, 2, Some(EtapaStatus::Pendente)),
            etapa(3, 3, Some(EtapaStatus::Pendente)),
        ];

        let alvo = proxima_etapa_elegivel(&etapas, 1).unwrap();
        assert_eq!(alvo.id, 2);
    }

    #[test]
    fn status_nulo_conta_como_pendente() {
        let etapas = vec![
            etapa(1, 1, Some(EtapaStatus::Finalizada)),
            etapa(2, 2, None),
        ];

        assert_eq!(proxima_etapa_elegivel(&etapas, 1).unwrap().id, 2);
    }

    #[test]
    fn proxima_ja_em_andamento_nao_avanca_de_novo() {
        // Refinalizar a etapa 1 não deve re-disparar o avanço
        let etapas = vec![
            etapa(1, 1, Some(EtapaStatus::Finalizada)),
            etapa(2, 2, Some(EtapaStatus::EmAndamento)),
            etapa(3, 3, Some(EtapaStatus::Pendente)),
        ];

        assert!(proxima_etapa_elegivel(&etapas, 1).is_none());
    }

    #[test]
    fn proxima_ja_finalizada_nao_regride() {
        let etapas = vec![
            etapa(1, 1, Some(EtapaStatus::Finalizada)),
            etapa(2, 2, Some(EtapaStatus::Finalizada)),
        ];

        assert!(proxima_etapa_elegivel(&etapas, 1).is_none());
    }

    #[test]
    fn ultima_etapa_nao_tem_proxima() {
        let etapas = vec![
            etapa(1, 1, Some(EtapaStatus::Pendente)),
            etapa(2, 2, Some(EtapaStatus::Pendente)),
            etapa(3, 3, Some(EtapaStatus::Finalizada)),
        ];

        assert!(proxima_etapa_elegivel(&etapas, 3).is_none());
    }

    // --- agregador de conclusão ---

    #[test]
    fn processo_sem_etapas_nao_conclui() {
        assert!(!todas_finalizadas(&[]));
    }

    #[test]
    fn processo_com_etapa_pendente_nao_conclui() {
        let etapas = vec![
            etapa(1, 1, Some(EtapaStatus::Finalizada)),
            etapa(2, 2, Some(EtapaStatus::EmAndamento)),
            etapa(3, 3, Some(EtapaStatus::Pendente)),
        ];

        assert!(!todas_finalizadas(&etapas));
    }

    #[test]
    fn processo_com_todas_finalizadas_conclui() {
        let etapas = vec![
            etapa(1, 1, Some(EtapaStatus::Finalizada)),
            etapa(2, 2, Some(EtapaStatus::Finalizada)),
            etapa(3, 3, Some(EtapaStatus::Finalizada)),
        ];

        assert!(todas_finalizadas(&etapas));
    }

    #[test]
    fn status_nulo_impede_a_conclusao() {
        let etapas = vec![
            etapa(1, 1, Some(EtapaStatus::Finalizada)),
            etapa(2, 2, None),
        ];

        assert!(!todas_finalizadas(&etapas));
    }

    // --- status pedido no PUT ---

    #[test]
    fn put_respeita_o_status_pedido() {
        assert_eq!(
            aplicar_status_pedido(Some(EtapaStatus::Pendente), Some(EtapaStatus::EmAndamento)),
            Some(EtapaStatus::EmAndamento)
        );
    }

    #[test]
    fn put_nao_rebaixa_finalizada() {
        assert_eq!(
            aplicar_status_pedido(Some(EtapaStatus::Finalizada), Some(EtapaStatus::Pendente)),
            Some(EtapaStatus::Finalizada)
        );
    }

    #[test]
    fn put_sem_status_mantem_o_atual() {
        assert_eq!(
            aplicar_status_pedido(Some(EtapaStatus::EmAndamento), None),
            Some(EtapaStatus::EmAndamento)
        );
        assert_eq!(aplicar_status_pedido(None, None), None);
    }
}
