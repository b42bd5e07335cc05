//! Transições de status dos títulos
//!
//! Cada operação valida a transição dentro da guarda de escrita do store; as
//! chamadas externas (Sienge, Asaas) acontecem antes e, se falharem, nada é
//! alterado.

use chrono::{NaiveDate, Utc};
use integracoes::asaas::AsaasClient;
use integracoes::sienge::{AtualizacaoDocumento, SiengeClient};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::models::{Colecao, NovoTitulo, Sessao, TipoDocumentoFiscal, TipoLeituraPagamento, Titulo, TituloStatus};
use crate::services::consulta_titulos::ConsultaTitulos;
use crate::services::rateio::validar_rateios;
use crate::services::realtime::{TAG_FINALIZADOS, TAG_PENDENTES};
use crate::store::Database;
use crate::utils::logging::{log_integracao_error, log_titulo_criado, log_transicao, log_validation_error};
use crate::utils::{AppError, AppResult};

const MAX_DESCRICAO: usize = 500;

/// Resultado de operações que envolvem um sistema externo
///
/// Quando o sistema externo aceitou mas a gravação local falhou, a operação
/// não é desfeita lá fora: `sincronizado_localmente` vem `false` e a
/// mensagem explica a divergência.
#[derive(Debug, Clone, Serialize)]
pub struct ResultadoOperacao {
    pub titulo: Option<Titulo>,
    pub mensagem: String,
    pub sincronizado_localmente: bool,
}

#[derive(Clone)]
pub struct FluxoTitulos {
    db: Arc<Database>,
    consulta: ConsultaTitulos,
    sienge: SiengeClient,
    asaas: AsaasClient,
}

fn exigir(condicao: bool) -> AppResult<()> {
    if condicao {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

fn exigir_transicao(titulo: &Titulo, destino: TituloStatus) -> AppResult<()> {
    if titulo.status.pode_transicionar_para(destino) {
        Ok(())
    } else {
        Err(AppError::TransicaoInvalida(format!(
            "Título está como {} e não pode passar para {}",
            titulo.status, destino
        )))
    }
}

fn campo_obrigatorio(valor: &str, campo: &str, mensagem: &str) -> AppResult<()> {
    if valor.trim().is_empty() {
        log_validation_error(campo, mensagem);
        return Err(AppError::ValidationError(mensagem.to_string()));
    }
    Ok(())
}

fn invalido(campo: &str, mensagem: &str) -> AppError {
    log_validation_error(campo, mensagem);
    AppError::ValidationError(mensagem.to_string())
}

/// Validações do formulário de envio que não dependem da obra
fn validar_envio(novo: &NovoTitulo) -> AppResult<()> {
    campo_obrigatorio(&novo.empresa, "empresa", "Código da empresa é obrigatório")?;
    campo_obrigatorio(&novo.credor, "credor", "Credor é obrigatório")?;
    campo_obrigatorio(&novo.documento_numero, "documento_numero", "Documento é obrigatório")?;
    campo_obrigatorio(
        &novo.numero_documento,
        "numero_documento",
        "Número do documento é obrigatório",
    )?;

    if !(novo.valor_total >= 0.01) {
        return Err(invalido("valor_total", "Valor deve ser maior que zero"));
    }
    if novo.descontos < 0.0 {
        return Err(invalido("descontos", "Descontos não pode ser negativo"));
    }
    if novo.parcelas < 1 {
        return Err(invalido("parcelas", "Mínimo 1 parcela"));
    }
    if novo
        .descricao
        .as_deref()
        .is_some_and(|d| d.chars().count() > MAX_DESCRICAO)
    {
        return Err(invalido("descricao", "Descrição muito longa (máx. 500 caracteres)"));
    }
    if novo.tipo_leitura_pagamento == TipoLeituraPagamento::Manual
        && novo.dados_bancarios.as_deref().map_or(true, |d| d.trim().is_empty())
    {
        return Err(invalido(
            "dados_bancarios",
            "Dados bancários são obrigatórios para pagamento manual",
        ));
    }
    Ok(())
}

impl FluxoTitulos {
    pub fn new(db: Arc<Database>, consulta: ConsultaTitulos, sienge: SiengeClient, asaas: AsaasClient) -> Self {
        Self {
            db,
            consulta,
            sienge,
            asaas,
        }
    }

    async fn invalidar_leituras(&self) {
        self.consulta.cache().invalidar(TAG_PENDENTES).await;
        self.consulta.cache().invalidar(TAG_FINALIZADOS).await;
    }

    async fn carregar(&self, sessao: &Sessao, id: Uuid) -> AppResult<(Colecao, Titulo)> {
        let (colecao, titulo) = self
            .db
            .buscar_titulo(id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Título não encontrado: {}", id)))?;
        exigir(sessao.capacidades.acessa_obra(titulo.obra_id))?;
        Ok((colecao, titulo))
    }

    /// Carrega exigindo que o título esteja em `titulos_pendentes`
    async fn carregar_pendente(&self, sessao: &Sessao, id: Uuid) -> AppResult<Titulo> {
        match self.carregar(sessao, id).await? {
            (Colecao::Pendentes, titulo) => Ok(titulo),
            (Colecao::Finalizados, titulo) => Err(AppError::TransicaoInvalida(format!(
                "Título {} não está entre os pendentes (status atual: {})",
                id, titulo.status
            ))),
        }
    }

    /// Envio de um novo título (status `enviado`)
    pub async fn criar(&self, sessao: &Sessao, novo: NovoTitulo) -> AppResult<Titulo> {
        exigir(sessao.capacidades.criar_titulos)?;
        validar_envio(&novo)?;

        let obra = self
            .db
            .buscar_obra(novo.obra_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Obra não encontrada: {}", novo.obra_id)))?;
        exigir(sessao.capacidades.acessa_obra(obra.id))?;
        if !obra.ativa {
            return Err(invalido("obra_id", "Obra inativa não recebe novos títulos"));
        }

        validar_rateios(&obra, &novo.rateio_financeiro, &novo.aprop_obra)?;

        let codigo_etapa = novo
            .codigo_etapa
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        let etapa = match &codigo_etapa {
            Some(codigo) => self
                .db
                .listar_etapas(obra.id)
                .await
                .into_iter()
                .find(|e| &e.codigo == codigo)
                .map(|e| e.rotulo())
                .unwrap_or_else(|| codigo.clone()),
            None => String::new(),
        };

        let agora = Utc::now();
        let titulo = Titulo {
            id: Uuid::new_v4(),
            empresa: novo.empresa.trim().to_string(),
            empresa_id: sessao.usuario.perfil.empresa_id,
            credor: novo.credor.trim().to_string(),
            credor_id: novo.credor_id,
            documento_tipo: novo.documento_tipo,
            documento_numero: novo.documento_numero,
            obra_id: obra.id,
            obra_codigo: obra.codigo.clone(),
            obra_nome: None,
            grupo_id: obra.grupo_id.clone(),
            centro_custo: novo.centro_custo,
            etapa,
            codigo_etapa,
            valor_total: novo.valor_total,
            descontos: novo.descontos,
            parcelas: novo.parcelas,
            tipo_documento: novo.tipo_documento,
            numero_documento: novo.numero_documento.trim().to_string(),
            data_emissao: novo.data_emissao,
            data_vencimento: novo.data_vencimento,
            plano_financeiro: novo.plano_financeiro,
            dados_bancarios: novo.dados_bancarios.filter(|d| !d.trim().is_empty()),
            tipo_leitura_pagamento: novo.tipo_leitura_pagamento,
            documento_url: novo.documento_url,
            arquivo_pagamento_url: novo
                .arquivo_pagamento_url
                .filter(|_| novo.tipo_leitura_pagamento != TipoLeituraPagamento::Manual),
            descricao: novo.descricao.filter(|d| !d.trim().is_empty()),
            rateio_financeiro: novo.rateio_financeiro,
            aprop_obra: novo.aprop_obra,
            status: TituloStatus::Enviado,
            created_by: sessao.id(),
            criador: sessao.nome().to_string(),
            aprovado_por: None,
            aprovado_em: None,
            pago_por: None,
            pago_em: None,
            motivo_reprovacao: None,
            obs: None,
            id_sienge: None,
            created_at: agora,
            updated_at: agora,
        };

        let criado = self.db.inserir_pendente(titulo).await?;
        log_titulo_criado(criado.id, &criado.credor, &criado.obra_codigo, criado.valor_total);
        self.invalidar_leituras().await;
        Ok(criado)
    }

    /// enviado → aprovado
    ///
    /// Sem `id_sienge` informado, o título é lançado no Sienge antes; se o
    /// webhook falhar o status não muda. Se o lançamento passar e a gravação
    /// local falhar, o id emitido fica registrado no título e o resultado
    /// volta com `sincronizado_localmente` em `false`.
    pub async fn aprovar(
        &self,
        sessao: &Sessao,
        id: Uuid,
        id_sienge: Option<i64>,
    ) -> AppResult<ResultadoOperacao> {
        exigir(sessao.capacidades.aprovar_titulos)?;
        let titulo = self.carregar_pendente(sessao, id).await?;
        exigir_transicao(&titulo, TituloStatus::Aprovado)?;

        let (id_sienge, lancado) = match id_sienge.or(titulo.id_sienge) {
            Some(id) => (Some(id), false),
            None if self.sienge.lancamento_habilitado() => {
                let emitido = self
                    .sienge
                    .lancar_titulo(&titulo.to_lancamento_sienge())
                    .await
                    .map_err(|e| {
                        log_integracao_error("sienge", e.status(), &e.to_string());
                        AppError::integracao("Erro ao lançar título no Sienge", e)
                    })?;
                (emitido, true)
            }
            None => (None, false),
        };

        let usuario = sessao.id();
        let aprovado = self
            .db
            .atualizar_titulo(Colecao::Pendentes, id, |t| {
                exigir_transicao(t, TituloStatus::Aprovado)?;
                t.status = TituloStatus::Aprovado;
                t.aprovado_por = Some(usuario);
                t.aprovado_em = Some(Utc::now());
                t.motivo_reprovacao = None;
                if id_sienge.is_some() {
                    t.id_sienge = id_sienge;
                }
                Ok::<(), AppError>(())
            })
            .await;

        match aprovado {
            Ok(aprovado) => {
                log_transicao(id, titulo.status, TituloStatus::Aprovado, usuario);
                self.invalidar_leituras().await;
                Ok(ResultadoOperacao {
                    titulo: Some(aprovado),
                    mensagem: TituloStatus::Aprovado.mensagem_sucesso().to_string(),
                    sincronizado_localmente: true,
                })
            }
            Err(e) if lancado => {
                warn!(
                    "⚠️ Título {} lançado no Sienge com id {:?}, mas falhou localmente: {}",
                    id, id_sienge, e
                );
                let registrado = self.registrar_id_sienge(id, id_sienge).await;
                self.invalidar_leituras().await;
                Ok(ResultadoOperacao {
                    titulo: registrado,
                    mensagem: "Sincronizado com Sienge, mas erro ao salvar localmente".to_string(),
                    sincronizado_localmente: false,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Guarda o id do Sienge sem mexer no status, para que uma nova
    /// aprovação não lance o título de novo
    async fn registrar_id_sienge(&self, id: Uuid, id_sienge: Option<i64>) -> Option<Titulo> {
        let (colecao, _) = self.db.buscar_titulo(id).await?;
        self.db
            .atualizar_titulo(colecao, id, |t| {
                if t.id_sienge.is_none() {
                    t.id_sienge = id_sienge;
                }
                Ok::<(), AppError>(())
            })
            .await
            .map_err(|e| warn!("⚠️ Não foi possível registrar o id do Sienge no título {}: {}", id, e))
            .ok()
    }

    /// enviado → reprovado, com motivo obrigatório
    pub async fn reprovar(&self, sessao: &Sessao, id: Uuid, motivo: &str) -> AppResult<Titulo> {
        exigir(sessao.capacidades.aprovar_titulos)?;
        campo_obrigatorio(motivo, "motivo", "Informe o motivo da reprovação")?;
        let titulo = self.carregar_pendente(sessao, id).await?;
        exigir_transicao(&titulo, TituloStatus::Reprovado)?;

        let usuario = sessao.id();
        let motivo = motivo.trim().to_string();
        let reprovado = self
            .db
            .atualizar_titulo(Colecao::Pendentes, id, |t| {
                exigir_transicao(t, TituloStatus::Reprovado)?;
                t.status = TituloStatus::Reprovado;
                t.aprovado_por = Some(usuario);
                t.aprovado_em = Some(Utc::now());
                t.motivo_reprovacao = Some(motivo);
                Ok::<(), AppError>(())
            })
            .await?;

        log_transicao(id, titulo.status, TituloStatus::Reprovado, usuario);
        self.invalidar_leituras().await;
        Ok(reprovado)
    }

    /// aprovado → pago (move para `titulos`) ou processando_pagamento → pago
    pub async fn pagar(&self, sessao: &Sessao, id: Uuid, obs: Option<String>) -> AppResult<Titulo> {
        exigir(sessao.capacidades.pagar_titulos)?;
        let (colecao, titulo) = self.carregar(sessao, id).await?;
        exigir_transicao(&titulo, TituloStatus::Pago)?;

        let usuario = sessao.id();
        let obs = obs.map(|o| o.trim().to_string()).filter(|o| !o.is_empty());
        let marcar_pago = |t: &mut Titulo| {
            exigir_transicao(t, TituloStatus::Pago)?;
            t.status = TituloStatus::Pago;
            t.pago_por = Some(usuario);
            t.pago_em = Some(Utc::now());
            if obs.is_some() {
                t.obs = obs;
            }
            Ok::<(), AppError>(())
        };

        let pago = match colecao {
            Colecao::Pendentes => {
                self.db
                    .mover_titulo(Colecao::Pendentes, Colecao::Finalizados, id, marcar_pago)
                    .await?
            }
            Colecao::Finalizados => self.db.atualizar_titulo(Colecao::Finalizados, id, marcar_pago).await?,
        };

        log_transicao(id, titulo.status, TituloStatus::Pago, usuario);
        self.invalidar_leituras().await;
        Ok(pago)
    }

    /// aprovado → processando_pagamento via Asaas
    pub async fn iniciar_pagamento_asaas(&self, sessao: &Sessao, id: Uuid) -> AppResult<ResultadoOperacao> {
        exigir(sessao.capacidades.pagar_titulos)?;
        if !self.asaas.habilitado() {
            return Err(AppError::ConfigError("Pagamento via Asaas não configurado".to_string()));
        }
        let titulo = self.carregar_pendente(sessao, id).await?;
        exigir_transicao(&titulo, TituloStatus::ProcessandoPagamento)?;

        let resposta = self
            .asaas
            .iniciar_pagamento(&titulo.to_ordem_pagamento())
            .await
            .map_err(|e| {
                log_integracao_error("asaas", e.status(), &e.to_string());
                AppError::integracao("Erro ao processar pagamento", e)
            })?;
        tracing::info!("💸 Asaas respondeu {} para o título {}", resposta.status, id);

        let usuario = sessao.id();
        let movido = self
            .db
            .mover_titulo(Colecao::Pendentes, Colecao::Finalizados, id, |t| {
                exigir_transicao(t, TituloStatus::ProcessandoPagamento)?;
                t.status = TituloStatus::ProcessandoPagamento;
                Ok::<(), AppError>(())
            })
            .await;
        self.invalidar_leituras().await;

        match movido {
            Ok(titulo_atual) => {
                log_transicao(id, titulo.status, TituloStatus::ProcessandoPagamento, usuario);
                Ok(ResultadoOperacao {
                    titulo: Some(titulo_atual),
                    mensagem: TituloStatus::ProcessandoPagamento.mensagem_sucesso().to_string(),
                    sincronizado_localmente: true,
                })
            }
            Err(e) => {
                warn!("⚠️ Pagamento do título {} enviado ao Asaas, mas falhou localmente: {}", id, e);
                Ok(ResultadoOperacao {
                    titulo: None,
                    mensagem: "Pagamento enviado ao Asaas, mas erro ao salvar localmente".to_string(),
                    sincronizado_localmente: false,
                })
            }
        }
    }

    /// reprovado → enviado; limpa os carimbos da reprovação
    pub async fn reenviar(&self, sessao: &Sessao, id: Uuid) -> AppResult<Titulo> {
        exigir(sessao.capacidades.criar_titulos)?;
        let titulo = self.carregar_pendente(sessao, id).await?;
        exigir(sessao.capacidades.aprovar_titulos || titulo.created_by == sessao.id())?;
        exigir_transicao(&titulo, TituloStatus::Enviado)?;

        let reenviado = self
            .db
            .atualizar_titulo(Colecao::Pendentes, id, |t| {
                exigir_transicao(t, TituloStatus::Enviado)?;
                t.status = TituloStatus::Enviado;
                t.aprovado_por = None;
                t.aprovado_em = None;
                t.motivo_reprovacao = None;
                Ok::<(), AppError>(())
            })
            .await?;

        log_transicao(id, titulo.status, TituloStatus::Enviado, sessao.id());
        self.invalidar_leituras().await;
        Ok(reenviado)
    }

    /// Cria um novo envio copiando os dados de negócio de um título existente
    pub async fn replicar(
        &self,
        sessao: &Sessao,
        id: Uuid,
        data_vencimento: Option<NaiveDate>,
    ) -> AppResult<Titulo> {
        let (_, origem) = self.carregar(sessao, id).await?;
        let mut novo = NovoTitulo::replicado_de(&origem);
        if let Some(data) = data_vencimento {
            novo.data_vencimento = data;
        }
        self.criar(sessao, novo).await
    }

    /// Altera tipo/número do documento no Sienge e depois localmente
    pub async fn atualizar_documento_sienge(
        &self,
        sessao: &Sessao,
        id: Uuid,
        tipo_documento: TipoDocumentoFiscal,
        numero_documento: &str,
    ) -> AppResult<ResultadoOperacao> {
        exigir(sessao.capacidades.aprovar_titulos)?;
        campo_obrigatorio(numero_documento, "numero_documento", "Número do documento é obrigatório")?;
        let (colecao, titulo) = self.carregar(sessao, id).await?;
        let id_sienge = titulo
            .id_sienge
            .ok_or_else(|| invalido("id_sienge", "Título ainda não foi lançado no Sienge"))?;

        let numero = numero_documento.trim().to_string();
        self.sienge
            .atualizar_documento(&AtualizacaoDocumento {
                id_sienge,
                document_identification_id: tipo_documento.as_str().to_string(),
                document_number: numero.clone(),
            })
            .await
            .map_err(|e| {
                log_integracao_error("sienge", e.status(), &e.to_string());
                AppError::integracao("Erro ao atualizar documento no Sienge", e)
            })?;

        let salvo = self
            .db
            .atualizar_titulo(colecao, id, |t| {
                t.tipo_documento = tipo_documento;
                t.numero_documento = numero;
                Ok::<(), AppError>(())
            })
            .await;
        self.invalidar_leituras().await;

        Ok(match salvo {
            Ok(atualizado) => ResultadoOperacao {
                titulo: Some(atualizado),
                mensagem: "Documento atualizado no Sienge".to_string(),
                sincronizado_localmente: true,
            },
            Err(e) => {
                warn!("⚠️ Título {} atualizado no Sienge, mas falhou localmente: {}", id, e);
                ResultadoOperacao {
                    titulo: None,
                    mensagem: "Sincronizado com Sienge, mas erro ao salvar localmente".to_string(),
                    sincronizado_localmente: false,
                }
            }
        })
    }
}
