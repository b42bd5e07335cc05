//! Feed de alterações e invalidação das leituras em cache
//!
//! O store publica um `ChangeEvent` a cada escrita confirmada. O
//! `RealtimeSync` escuta o feed e invalida as listas de títulos; nenhum
//! payload é aplicado diretamente: a próxima leitura busca de novo.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::models::{ChangeEvent, Titulo};
use crate::services::read_cache::ReadCache;

pub const TAG_PENDENTES: &str = "titulos_pendentes";
pub const TAG_FINALIZADOS: &str = "titulos";

#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacidade: usize) -> Self {
        let (tx, _) = broadcast::channel(capacidade.max(1));
        Self { tx }
    }

    /// Publica sem bloquear; sem assinantes o evento é descartado
    pub fn publicar(&self, evento: ChangeEvent) {
        debug!("📡 {} {:?} {:?}", evento.tabela.as_str(), evento.tipo, evento.id);
        let _ = self.tx.send(evento);
    }

    pub fn assinar(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    pub fn assinantes(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Assinatura ativa; ao ser descartada, encerra a tarefa de invalidação
#[derive(Debug)]
pub struct RealtimeHandle {
    tarefa: JoinHandle<()>,
}

impl RealtimeHandle {
    pub fn ativa(&self) -> bool {
        !self.tarefa.is_finished()
    }
}

impl Drop for RealtimeHandle {
    fn drop(&mut self) {
        self.tarefa.abort();
    }
}

pub struct RealtimeSync;

impl RealtimeSync {
    /// Abre uma assinatura do feed que invalida as listas de títulos
    ///
    /// Deve ser chamada uma vez por processo; guarde o handle enquanto o
    /// serviço estiver de pé.
    pub fn assinar(feed: &ChangeFeed, cache: ReadCache<Vec<Titulo>>) -> RealtimeHandle {
        let mut rx = feed.assinar();

        let tarefa = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(evento) if evento.tabela.e_de_titulos() => {
                        // A visão combinada deriva das duas listas
                        cache.invalidar(TAG_PENDENTES).await;
                        cache.invalidar(TAG_FINALIZADOS).await;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(perdidos)) => {
                        warn!("⚠️ Feed de alterações atrasado, {} eventos perdidos; limpando cache", perdidos);
                        cache.limpar().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        RealtimeHandle { tarefa }
    }
}
