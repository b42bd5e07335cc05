use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::titulo::Colecao;

/// Tabelas observadas pelo feed de alterações
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Tabela {
    TitulosPendentes,
    Titulos,
    Obras,
    ObraEtapas,
    Profiles,
    UserRoles,
    UserObras,
    SiengeCredores,
}

impl Tabela {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tabela::TitulosPendentes => "titulos_pendentes",
            Tabela::Titulos => "titulos",
            Tabela::Obras => "obras",
            Tabela::ObraEtapas => "obra_etapas",
            Tabela::Profiles => "profiles",
            Tabela::UserRoles => "user_roles",
            Tabela::UserObras => "user_obras",
            Tabela::SiengeCredores => "sienge_credores",
        }
    }

    pub fn e_de_titulos(&self) -> bool {
        matches!(self, Tabela::TitulosPendentes | Tabela::Titulos)
    }
}

impl From<Colecao> for Tabela {
    fn from(colecao: Colecao) -> Self {
        match colecao {
            Colecao::Pendentes => Tabela::TitulosPendentes,
            Colecao::Finalizados => Tabela::Titulos,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TipoEvento {
    Insert,
    Update,
    Delete,
}

/// Notificação de alteração publicada após cada escrita confirmada
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeEvent {
    pub tabela: Tabela,
    pub tipo: TipoEvento,
    pub id: Option<Uuid>,
    /// Obra do registro alterado (títulos, obras e etapas)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obra_id: Option<Uuid>,
    pub em: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(tabela: Tabela, tipo: TipoEvento, id: Option<Uuid>) -> Self {
        Self {
            tabela,
            tipo,
            id,
            obra_id: None,
            em: Utc::now(),
        }
    }

    pub fn da_obra(mut self, obra_id: Uuid) -> Self {
        self.obra_id = Some(obra_id);
        self
    }
}
