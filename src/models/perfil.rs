use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Papel do usuário (`user_roles`)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Papel {
    Admin,
    /// Equipe de obra
    #[default]
    Obra,
    /// Visualização de orçamento
    Orcamento,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Perfil {
    pub id: Uuid,
    pub nome: String,
    pub email: String,
    pub telefone: Option<String>,
    /// Falso até o usuário completar o cadastro inicial
    pub perfil_completo: bool,
    pub empresa_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Perfil com papel e obras vinculadas, como resolvido no início da sessão
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Usuario {
    pub perfil: Perfil,
    pub papel: Papel,
    pub obras: BTreeSet<Uuid>,
}

/// O que o usuário pode fazer, resolvido uma vez por requisição
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Capacidades {
    pub aprovar_titulos: bool,
    pub pagar_titulos: bool,
    pub criar_titulos: bool,
    pub gerenciar_obras: bool,
    pub gerenciar_usuarios: bool,
    pub ver_todas_obras: bool,
    pub obras: BTreeSet<Uuid>,
}

impl Capacidades {
    pub fn resolver(papel: Papel, obras: &BTreeSet<Uuid>) -> Self {
        let admin = papel == Papel::Admin;
        Self {
            aprovar_titulos: admin,
            pagar_titulos: admin,
            criar_titulos: matches!(papel, Papel::Admin | Papel::Obra),
            gerenciar_obras: admin,
            gerenciar_usuarios: admin,
            ver_todas_obras: matches!(papel, Papel::Admin | Papel::Orcamento),
            obras: obras.clone(),
        }
    }

    pub fn acessa_obra(&self, obra_id: Uuid) -> bool {
        self.ver_todas_obras || self.obras.contains(&obra_id)
    }
}

/// Usuário autenticado da requisição com as capacidades já resolvidas
#[derive(Debug, Clone)]
pub struct Sessao {
    pub usuario: Usuario,
    pub capacidades: Capacidades,
}

impl Sessao {
    pub fn new(usuario: Usuario) -> Self {
        let capacidades = Capacidades::resolver(usuario.papel, &usuario.obras);
        Self { usuario, capacidades }
    }

    pub fn id(&self) -> Uuid {
        self.usuario.perfil.id
    }

    pub fn nome(&self) -> &str {
        &self.usuario.perfil.nome
    }
}

/// Cadastro de usuário feito por um administrador
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NovoUsuario {
    pub email: String,
    pub nome: String,
    #[serde(default)]
    pub telefone: Option<String>,
    #[serde(default)]
    pub papel: Papel,
    #[serde(default)]
    pub obra_ids: Vec<Uuid>,
    #[serde(default)]
    pub empresa_id: Option<Uuid>,
}

/// Dados do cadastro inicial (primeiro acesso)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConclusaoPerfil {
    pub nome: String,
    pub telefone: String,
}
