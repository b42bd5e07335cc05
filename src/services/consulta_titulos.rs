//! Visões de leitura sobre `titulos_pendentes` e `titulos`

use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Colecao, DashboardStats, Titulo, TituloStatus};
use crate::services::read_cache::ReadCache;
use crate::services::realtime::{TAG_FINALIZADOS, TAG_PENDENTES};
use crate::store::Database;

const STATUS_FINALIZADOS: [TituloStatus; 2] = [TituloStatus::Pago, TituloStatus::ProcessandoPagamento];

#[derive(Clone)]
pub struct ConsultaTitulos {
    db: Arc<Database>,
    cache: ReadCache<Vec<Titulo>>,
}

fn chave(tag: &str, obra_id: Option<Uuid>) -> String {
    match obra_id {
        Some(obra) => format!("{}:obra={}", tag, obra),
        None => format!("{}:todas", tag),
    }
}

impl ConsultaTitulos {
    pub fn new(db: Arc<Database>, cache: ReadCache<Vec<Titulo>>) -> Self {
        Self { db, cache }
    }

    pub fn cache(&self) -> &ReadCache<Vec<Titulo>> {
        &self.cache
    }

    /// Todos os pendentes, mais recentes primeiro
    pub async fn pendentes(&self, obra_id: Option<Uuid>) -> Vec<Titulo> {
        let carregado: Result<_, Infallible> = self
            .cache
            .get_or_load(&chave(TAG_PENDENTES, obra_id), move || async move {
                Ok(self.db.listar_titulos(Colecao::Pendentes, obra_id, None).await)
            })
            .await;
        carregado.unwrap_or_default()
    }

    /// Pagos e em processamento, mais recentes primeiro
    pub async fn finalizados(&self, obra_id: Option<Uuid>) -> Vec<Titulo> {
        let carregado: Result<_, Infallible> = self
            .cache
            .get_or_load(&chave(TAG_FINALIZADOS, obra_id), move || async move {
                Ok(self
                    .db
                    .listar_titulos(Colecao::Finalizados, obra_id, Some(&STATUS_FINALIZADOS))
                    .await)
            })
            .await;
        carregado.unwrap_or_default()
    }

    /// União das duas coleções reordenada por criação
    pub async fn combinados(&self, obra_id: Option<Uuid>) -> Vec<Titulo> {
        let mut todos = self.pendentes(obra_id).await;
        todos.extend(self.finalizados(obra_id).await);
        todos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        todos
    }

    /// Sempre lido direto do store: fila de aprovação não pode vir do cache
    pub async fn por_status(&self, status: TituloStatus, obra_id: Option<Uuid>) -> Vec<Titulo> {
        self.db
            .listar_titulos(status.colecao(), obra_id, Some(&[status]))
            .await
    }

    pub async fn buscar(&self, id: Uuid) -> Option<Titulo> {
        self.db.buscar_titulo(id).await.map(|(_, titulo)| titulo)
    }

    pub async fn estatisticas(&self, obra_id: Option<Uuid>) -> DashboardStats {
        DashboardStats::calcular(&self.combinados(obra_id).await)
    }
}
