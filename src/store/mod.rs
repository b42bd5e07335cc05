//! Store em memória com as tabelas do sistema
//!
//! `titulos_pendentes` e `titulos` ficam atrás do mesmo `RwLock`: mover um
//! título entre as duas acontece dentro de uma única guarda de escrita, então
//! nenhum leitor vê o título nas duas coleções (ou em nenhuma).
//!
//! Toda escrita confirmada publica um `ChangeEvent` no feed depois de liberar
//! a guarda.

mod cadastros;
mod titulos;

use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{ChangeEvent, Colecao, Credor, Obra, ObraEtapa, Papel, Perfil, Titulo};
use crate::services::realtime::ChangeFeed;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entidade} não encontrado(a): {id}")]
    NaoEncontrado { entidade: &'static str, id: String },

    #[error("Título {id} não está em {esperada} (status atual: {status_atual})")]
    ForaDaColecao {
        id: Uuid,
        esperada: &'static str,
        status_atual: String,
    },

    #[error("Registro duplicado em {tabela}: {detalhe}")]
    Duplicado { tabela: &'static str, detalhe: String },
}

impl StoreError {
    /// Código estilo Postgres, usado para mapear mensagens ao usuário
    pub fn codigo(&self) -> Option<&'static str> {
        match self {
            StoreError::Duplicado { .. } => Some("23505"),
            _ => None,
        }
    }

    pub(crate) fn titulo_nao_encontrado(id: Uuid) -> Self {
        StoreError::NaoEncontrado {
            entidade: "Título",
            id: id.to_string(),
        }
    }
}

#[derive(Default)]
struct Tabelas {
    titulos_pendentes: HashMap<Uuid, Titulo>,
    titulos: HashMap<Uuid, Titulo>,
    obras: HashMap<Uuid, Obra>,
    obra_etapas: HashMap<Uuid, ObraEtapa>,
    profiles: HashMap<Uuid, Perfil>,
    user_roles: HashMap<Uuid, Papel>,
    /// (user_id, obra_id)
    user_obras: BTreeSet<(Uuid, Uuid)>,
    /// Mantido ordenado por nome
    sienge_credores: Vec<Credor>,
}

impl Tabelas {
    fn colecao(&self, colecao: Colecao) -> &HashMap<Uuid, Titulo> {
        match colecao {
            Colecao::Pendentes => &self.titulos_pendentes,
            Colecao::Finalizados => &self.titulos,
        }
    }

    fn colecao_mut(&mut self, colecao: Colecao) -> &mut HashMap<Uuid, Titulo> {
        match colecao {
            Colecao::Pendentes => &mut self.titulos_pendentes,
            Colecao::Finalizados => &mut self.titulos,
        }
    }

    /// Equivalente ao join `obras (nome)` da leitura
    fn com_obra_nome(&self, mut titulo: Titulo) -> Titulo {
        titulo.obra_nome = self.obras.get(&titulo.obra_id).map(|o| o.nome.clone());
        titulo
    }

    fn obras_do_usuario(&self, user_id: Uuid) -> BTreeSet<Uuid> {
        self.user_obras
            .range((user_id, Uuid::nil())..=(user_id, Uuid::from_u128(u128::MAX)))
            .map(|(_, obra_id)| *obra_id)
            .collect()
    }
}

pub struct Database {
    tabelas: RwLock<Tabelas>,
    feed: ChangeFeed,
}

impl Database {
    pub fn new(feed: ChangeFeed) -> Self {
        Self {
            tabelas: RwLock::new(Tabelas::default()),
            feed,
        }
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    fn publicar(&self, eventos: impl IntoIterator<Item = ChangeEvent>) {
        for evento in eventos {
            self.feed.publicar(evento);
        }
    }
}
