use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Obra (unidade contra a qual os títulos são lançados)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Obra {
    pub id: Uuid,
    pub nome: String,
    pub codigo: String,
    pub endereco: String,
    pub ativa: bool,
    /// Grupo de mensagens correlacionado à obra
    pub grupo_id: Option<String>,
    /// Títulos podem ser lançados sem rateio de centro de custo
    pub permite_sem_apropriacao: bool,
    /// Código da obra oculto nos formulários (lança sem apropriação e sem etapas)
    pub ocultar_codigo_obra: bool,
    pub created_at: DateTime<Utc>,
}

impl Obra {
    pub fn exige_rateio_financeiro(&self) -> bool {
        !(self.permite_sem_apropriacao || self.ocultar_codigo_obra)
    }

    pub fn exige_apropriacao_etapas(&self) -> bool {
        !self.ocultar_codigo_obra
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NovaObra {
    pub nome: String,
    pub codigo: String,
    #[serde(default)]
    pub endereco: String,
    #[serde(default)]
    pub grupo_id: Option<String>,
    #[serde(default)]
    pub permite_sem_apropriacao: bool,
    #[serde(default)]
    pub ocultar_codigo_obra: bool,
}

/// Alteração parcial de uma obra
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AtualizacaoObra {
    pub nome: Option<String>,
    pub codigo: Option<String>,
    pub endereco: Option<String>,
    pub ativa: Option<bool>,
    pub grupo_id: Option<String>,
    pub permite_sem_apropriacao: Option<bool>,
    pub ocultar_codigo_obra: Option<bool>,
}

impl AtualizacaoObra {
    pub fn aplicar(self, obra: &mut Obra) {
        if let Some(nome) = self.nome {
            obra.nome = nome;
        }
        if let Some(codigo) = self.codigo {
            obra.codigo = codigo;
        }
        if let Some(endereco) = self.endereco {
            obra.endereco = endereco;
        }
        if let Some(ativa) = self.ativa {
            obra.ativa = ativa;
        }
        if let Some(grupo_id) = self.grupo_id {
            obra.grupo_id = Some(grupo_id).filter(|g| !g.trim().is_empty());
        }
        if let Some(permite) = self.permite_sem_apropriacao {
            obra.permite_sem_apropriacao = permite;
        }
        if let Some(ocultar) = self.ocultar_codigo_obra {
            obra.ocultar_codigo_obra = ocultar;
        }
    }
}

/// Etapa de obra; `codigo` é único dentro da obra
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObraEtapa {
    pub id: Uuid,
    pub obra_id: Uuid,
    pub codigo: String,
    pub nome: String,
    pub created_at: DateTime<Utc>,
}

impl ObraEtapa {
    /// Rótulo "COD - Nome" gravado no título
    pub fn rotulo(&self) -> String {
        format!("{} - {}", self.codigo, self.nome)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NovaEtapa {
    pub codigo: String,
    pub nome: String,
}
