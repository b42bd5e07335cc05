use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::models::{AtualizacaoObra, NovaObra, Obra, Sessao};
use crate::store::Database;
use crate::utils::{AppError, AppResult};

#[derive(Clone)]
pub struct ObrasService {
    db: Arc<Database>,
}

impl ObrasService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Admin e orçamento veem todas; equipe de obra só as vinculadas
    pub async fn listar(&self, sessao: &Sessao) -> Vec<Obra> {
        if sessao.capacidades.ver_todas_obras {
            self.db.listar_obras(None).await
        } else {
            self.db.listar_obras(Some(&sessao.capacidades.obras)).await
        }
    }

    pub async fn buscar(&self, sessao: &Sessao, id: Uuid) -> AppResult<Obra> {
        if !sessao.capacidades.acessa_obra(id) {
            return Err(AppError::Forbidden);
        }
        self.db
            .buscar_obra(id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Obra não encontrada: {}", id)))
    }

    pub async fn criar(&self, sessao: &Sessao, nova: NovaObra) -> AppResult<Obra> {
        if !sessao.capacidades.gerenciar_obras {
            return Err(AppError::Forbidden);
        }
        if nova.nome.trim().is_empty() || nova.codigo.trim().is_empty() {
            return Err(AppError::ValidationError("Nome e código da obra são obrigatórios".to_string()));
        }

        let nova = NovaObra {
            nome: nova.nome.trim().to_string(),
            codigo: nova.codigo.trim().to_string(),
            ..nova
        };
        let obra = self.db.inserir_obra(nova).await?;
        info!("🏗️ Obra criada: {} - {}", obra.codigo, obra.nome);
        Ok(obra)
    }

    pub async fn atualizar(&self, sessao: &Sessao, id: Uuid, alteracao: AtualizacaoObra) -> AppResult<Obra> {
        if !sessao.capacidades.gerenciar_obras {
            return Err(AppError::Forbidden);
        }
        if alteracao.nome.as_deref().is_some_and(|n| n.trim().is_empty())
            || alteracao.codigo.as_deref().is_some_and(|c| c.trim().is_empty())
        {
            return Err(AppError::ValidationError("Nome e código da obra são obrigatórios".to_string()));
        }
        Ok(self.db.atualizar_obra(id, alteracao).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{nova_obra, Cenario};

    #[tokio::test]
    async fn test_listagem_por_papel() {
        let cenario = Cenario::novo(None, None).await;
        let obras = ObrasService::new(cenario.db.clone());
        cenario.criar_obra("OB-02").await;

        assert_eq!(obras.listar(&cenario.admin).await.len(), 2);
        let da_equipe = obras.listar(&cenario.equipe).await;
        assert_eq!(da_equipe.len(), 1);
        assert_eq!(da_equipe[0].id, cenario.obra.id);
    }

    #[tokio::test]
    async fn test_codigo_duplicado() {
        let cenario = Cenario::novo(None, None).await;
        let obras = ObrasService::new(cenario.db.clone());

        let err = obras
            .criar(&cenario.admin, nova_obra(" OB-01 ", "Repetida"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Já existe uma obra com este código");

        let err = obras.criar(&cenario.equipe, nova_obra("OB-09", "Nova")).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[tokio::test]
    async fn test_desativar_obra() {
        let cenario = Cenario::novo(None, None).await;
        let obras = ObrasService::new(cenario.db.clone());

        let obra = obras
            .atualizar(
                &cenario.admin,
                cenario.obra.id,
                AtualizacaoObra {
                    ativa: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!obra.ativa);
        assert!(cenario.fluxo.criar(&cenario.equipe, crate::test_support::novo_titulo(obra.id)).await.is_err());
    }
}
