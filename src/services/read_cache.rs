use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::utils::logging::log_cache_invalidado;

/// Cache das leituras de listas
///
/// Chaves têm a forma `"{tag}:{variante}"` (ex.: `titulos_pendentes:todas`,
/// `titulos:obra=<uuid>`); invalidar uma tag remove todas as variantes.
#[derive(Debug, Clone)]
pub struct ReadCache<V> {
    tabela: Arc<RwLock<Tabela<V>>>,
    stats: Arc<RwLock<CacheStats>>,
    ttl: Duration,
}

#[derive(Debug)]
struct Tabela<V> {
    entradas: HashMap<String, Entrada<V>>,
    /// Incrementada a cada invalidação da tag
    geracoes: HashMap<String, u64>,
    /// Incrementada por `limpar`
    geracao_geral: u64,
}

impl<V> Tabela<V> {
    fn geracao(&self, chave: &str) -> (u64, u64) {
        let tag = tag_da_chave(chave);
        (
            self.geracao_geral,
            self.geracoes.get(tag).copied().unwrap_or(0),
        )
    }
}

#[derive(Debug, Clone)]
struct Entrada<V> {
    valor: V,
    gravado_em: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CacheStats {
    pub leituras: u64,
    pub acertos: u64,
    pub invalidacoes: u64,
}

fn tag_da_chave(chave: &str) -> &str {
    chave.split_once(':').map(|(tag, _)| tag).unwrap_or(chave)
}

impl<V: Clone> ReadCache<V> {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            tabela: Arc::new(RwLock::new(Tabela {
                entradas: HashMap::new(),
                geracoes: HashMap::new(),
                geracao_geral: 0,
            })),
            stats: Arc::new(RwLock::new(CacheStats::default())),
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::minutes(5)),
        }
    }

    /// Valor ainda dentro do TTL, se houver
    pub async fn get(&self, chave: &str) -> Option<V> {
        let valor = {
            let tabela = self.tabela.read().await;
            tabela
                .entradas
                .get(chave)
                .filter(|e| Utc::now() - e.gravado_em < self.ttl)
                .map(|e| e.valor.clone())
        };

        let mut stats = self.stats.write().await;
        stats.leituras += 1;
        if valor.is_some() {
            stats.acertos += 1;
        }
        valor
    }

    pub async fn put(&self, chave: impl Into<String>, valor: V) {
        let mut tabela = self.tabela.write().await;
        tabela.entradas.insert(
            chave.into(),
            Entrada {
                valor,
                gravado_em: Utc::now(),
            },
        );
    }

    /// Lê do cache ou carrega com `carregar` e grava o resultado
    ///
    /// Se a tag for invalidada enquanto `carregar` roda, o valor carregado
    /// é devolvido mas não fica no cache.
    pub async fn get_or_load<F, Fut, E>(&self, chave: &str, carregar: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(valor) = self.get(chave).await {
            return Ok(valor);
        }

        let geracao = self.tabela.read().await.geracao(chave);
        let valor = carregar().await?;

        let mut tabela = self.tabela.write().await;
        if tabela.geracao(chave) == geracao {
            tabela.entradas.insert(
                chave.to_string(),
                Entrada {
                    valor: valor.clone(),
                    gravado_em: Utc::now(),
                },
            );
        }
        Ok(valor)
    }

    /// Remove todas as variantes de uma tag
    pub async fn invalidar(&self, tag: &str) -> usize {
        let prefixo = format!("{}:", tag);
        let removidos = {
            let mut tabela = self.tabela.write().await;
            *tabela.geracoes.entry(tag.to_string()).or_insert(0) += 1;
            let antes = tabela.entradas.len();
            tabela
                .entradas
                .retain(|chave, _| chave != tag && !chave.starts_with(&prefixo));
            antes - tabela.entradas.len()
        };

        self.stats.write().await.invalidacoes += 1;
        log_cache_invalidado(tag, removidos);
        removidos
    }

    pub async fn limpar(&self) {
        let removidos = {
            let mut tabela = self.tabela.write().await;
            tabela.geracao_geral += 1;
            let total = tabela.entradas.len();
            tabela.entradas.clear();
            total
        };

        self.stats.write().await.invalidacoes += 1;
        log_cache_invalidado("*", removidos);
    }

    pub async fn stats(&self) -> CacheStats {
        self.stats.read().await.clone()
    }
}
