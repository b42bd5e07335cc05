use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::models::Credor;
use crate::services::read_cache::ReadCache;
use crate::store::Database;
use crate::utils::normalization::{contem_normalizado, normalize_busca, so_digitos};

/// Limite de linhas por página do backend
pub const TAMANHO_PAGINA: usize = 1000;
pub const MIN_CARACTERES_BUSCA: usize = 2;
pub const MAX_RESULTADOS: usize = 50;

const CHAVE_CACHE: &str = "sienge_credores:todos";

/// Diretório de credores espelhados do Sienge, com cache de 30 minutos
#[derive(Clone)]
pub struct CredorDirectory {
    db: Arc<Database>,
    cache: ReadCache<Arc<Vec<Credor>>>,
}

impl CredorDirectory {
    pub fn new(db: Arc<Database>, ttl: Duration) -> Self {
        Self {
            db,
            cache: ReadCache::new(ttl),
        }
    }

    /// Tabela inteira, carregada página a página até uma página incompleta
    pub async fn todos(&self) -> Arc<Vec<Credor>> {
        if let Some(credores) = self.cache.get(CHAVE_CACHE).await {
            return credores;
        }

        let mut credores = Vec::new();
        let mut de = 0;
        loop {
            let pagina = self.db.pagina_credores(de, de + TAMANHO_PAGINA - 1).await;
            let recebidos = pagina.len();
            credores.extend(pagina);
            if recebidos < TAMANHO_PAGINA {
                break;
            }
            de += TAMANHO_PAGINA;
        }

        info!("📇 {} credores carregados", credores.len());
        let credores = Arc::new(credores);
        self.cache.put(CHAVE_CACHE, credores.clone()).await;
        credores
    }

    /// Busca por nome, nome fantasia (sem acento/pontuação) ou dígitos do documento
    ///
    /// Termos com menos de 2 caracteres normalizados não retornam nada.
    pub async fn buscar(&self, termo: &str) -> Vec<Credor> {
        let termo_normalizado = normalize_busca(termo);
        if termo_normalizado.chars().count() < MIN_CARACTERES_BUSCA {
            return Vec::new();
        }

        let digitos = so_digitos(termo);
        self.todos()
            .await
            .iter()
            .filter(|c| corresponde(c, &termo_normalizado, &digitos))
            .take(MAX_RESULTADOS)
            .cloned()
            .collect()
    }

    pub async fn buscar_por_id(&self, creditor_id: i64) -> Option<Credor> {
        self.todos().await.iter().find(|c| c.creditor_id == creditor_id).cloned()
    }

    /// Substitui o espelho e descarta o cache
    pub async fn sincronizar(&self, credores: Vec<Credor>) -> usize {
        let total = self.db.substituir_credores(credores).await;
        self.cache.invalidar("sienge_credores").await;
        total
    }
}

fn corresponde(credor: &Credor, termo_normalizado: &str, digitos: &str) -> bool {
    if contem_normalizado(&credor.nome, termo_normalizado) {
        return true;
    }
    if credor
        .nome_fantasia
        .as_deref()
        .is_some_and(|fantasia| contem_normalizado(fantasia, termo_normalizado))
    {
        return true;
    }
    !digitos.is_empty()
        && credor
            .doc
            .as_deref()
            .is_some_and(|doc| so_digitos(doc).contains(digitos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::realtime::ChangeFeed;
    use uuid::Uuid;

    fn credor(creditor_id: i64, nome: &str, doc: Option<&str>) -> Credor {
        Credor {
            id: Uuid::new_v4(),
            creditor_id,
            nome: nome.to_string(),
            nome_fantasia: None,
            doc: doc.map(str::to_string),
            tipo: Some("J".into()),
        }
    }

    async fn diretorio(credores: Vec<Credor>) -> CredorDirectory {
        let db = Arc::new(Database::new(ChangeFeed::new(16)));
        db.substituir_credores(credores).await;
        CredorDirectory::new(db, Duration::from_secs(1800))
    }

    #[tokio::test]
    async fn test_busca_ignora_acentos() {
        let dir = diretorio(vec![
            credor(1, "José Materiais", Some("12.345.678/0001-90")),
            credor(2, "Concreto Forte", None),
        ])
        .await;

        assert!(dir.buscar("j").await.is_empty());
        let achados = dir.buscar("jose").await;
        assert_eq!(achados.len(), 1);
        assert_eq!(achados[0].creditor_id, 1);
    }

    #[tokio::test]
    async fn test_busca_por_documento() {
        let dir = diretorio(vec![credor(1, "Areial Ltda", Some("12.345.678/0001-90"))]).await;

        assert_eq!(dir.buscar("345678").await.len(), 1);
        assert_eq!(dir.buscar("12.345").await.len(), 1);
        assert!(dir.buscar("999").await.is_empty());
    }

    #[tokio::test]
    async fn test_carga_paginada_e_limite_de_resultados() {
        let credores: Vec<Credor> = (0..2500).map(|i| credor(i, &format!("Fornecedor {:04}", i), None)).collect();
        let dir = diretorio(credores).await;

        assert_eq!(dir.todos().await.len(), 2500);
        assert_eq!(dir.buscar("fornecedor").await.len(), MAX_RESULTADOS);
    }

    #[tokio::test]
    async fn test_sincronizar_descarta_cache() {
        let dir = diretorio(vec![credor(1, "Antigo", None)]).await;
        assert_eq!(dir.todos().await.len(), 1);

        dir.sincronizar(vec![credor(2, "Novo", None), credor(3, "Outro", None)]).await;
        assert_eq!(dir.todos().await.len(), 2);
        assert!(dir.buscar_por_id(2).await.is_some());
    }
}
