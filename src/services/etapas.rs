use integracoes::extracao::ExtracaoEtapasClient;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::models::{NovaEtapa, ObraEtapa, Sessao};
use crate::store::Database;
use crate::utils::logging::log_integracao_error;
use crate::utils::{AppError, AppResult};

/// Tamanho máximo da imagem enviada para extração
pub const MAX_IMAGEM_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Serialize)]
pub struct ResultadoImportacao {
    pub inseridas: Vec<ObraEtapa>,
    /// Etapas extraídas cujo código já existia na obra
    pub ignoradas: usize,
    pub mensagem: String,
}

#[derive(Clone)]
pub struct EtapasService {
    db: Arc<Database>,
    extracao: ExtracaoEtapasClient,
}

impl EtapasService {
    pub fn new(db: Arc<Database>, extracao: ExtracaoEtapasClient) -> Self {
        Self { db, extracao }
    }

    async fn exigir_obra(&self, obra_id: Uuid) -> AppResult<()> {
        self.db
            .buscar_obra(obra_id)
            .await
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Obra não encontrada: {}", obra_id)))
    }

    pub async fn listar(&self, sessao: &Sessao, obra_id: Uuid) -> AppResult<Vec<ObraEtapa>> {
        if !sessao.capacidades.acessa_obra(obra_id) {
            return Err(AppError::Forbidden);
        }
        self.exigir_obra(obra_id).await?;
        Ok(self.db.listar_etapas(obra_id).await)
    }

    pub async fn criar(&self, sessao: &Sessao, obra_id: Uuid, nova: NovaEtapa) -> AppResult<ObraEtapa> {
        if !sessao.capacidades.gerenciar_obras {
            return Err(AppError::Forbidden);
        }

        let codigo = nova.codigo.trim().to_string();
        let nome = nova.nome.trim().to_string();
        if codigo.is_empty() || nome.is_empty() {
            return Err(AppError::ValidationError("Preencha código e nome da etapa".to_string()));
        }

        Ok(self.db.inserir_etapa(obra_id, NovaEtapa { codigo, nome }).await?)
    }

    pub async fn remover(&self, sessao: &Sessao, obra_id: Uuid, etapa_id: Uuid) -> AppResult<()> {
        if !sessao.capacidades.gerenciar_obras {
            return Err(AppError::Forbidden);
        }
        Ok(self.db.remover_etapa(obra_id, etapa_id).await?)
    }

    /// Extrai etapas de uma imagem e cadastra as que ainda não existem
    pub async fn importar_imagem(
        &self,
        sessao: &Sessao,
        obra_id: Uuid,
        imagem: &[u8],
        content_type: &str,
    ) -> AppResult<ResultadoImportacao> {
        if !sessao.capacidades.gerenciar_obras {
            return Err(AppError::Forbidden);
        }
        if !content_type.starts_with("image/") {
            return Err(AppError::ValidationError("Por favor, selecione uma imagem".to_string()));
        }
        if imagem.len() > MAX_IMAGEM_BYTES {
            return Err(AppError::ValidationError("Imagem muito grande. Máximo 10MB.".to_string()));
        }
        self.exigir_obra(obra_id).await?;

        let extraidas = self.extracao.extrair(imagem, content_type).await.map_err(|e| {
            log_integracao_error("extracao_etapas", e.status(), &e.to_string());
            AppError::integracao("Erro ao processar imagem", e)
        })?;
        if extraidas.is_empty() {
            return Err(AppError::ValidationError("Nenhuma etapa encontrada na imagem".to_string()));
        }

        let mut existentes: BTreeSet<String> = self
            .db
            .listar_etapas(obra_id)
            .await
            .into_iter()
            .map(|e| e.codigo)
            .collect();

        let total = extraidas.len();
        let novas: Vec<NovaEtapa> = extraidas
            .into_iter()
            .filter(|e| existentes.insert(e.codigo.clone()))
            .map(|e| NovaEtapa {
                codigo: e.codigo,
                nome: e.nome,
            })
            .collect();
        let ignoradas = total - novas.len();

        if novas.is_empty() {
            return Ok(ResultadoImportacao {
                inseridas: Vec::new(),
                ignoradas,
                mensagem: "Todas as etapas já estão cadastradas".to_string(),
            });
        }

        let inseridas = self.db.inserir_etapas(obra_id, novas).await?;
        info!("🧱 {} etapas importadas na obra {}", inseridas.len(), obra_id);

        Ok(ResultadoImportacao {
            mensagem: format!("{} etapas importadas com sucesso!", inseridas.len()),
            inseridas,
            ignoradas,
        })
    }
}
