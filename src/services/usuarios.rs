use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::models::{ConclusaoPerfil, NovoUsuario, Papel, Perfil, Sessao, Usuario};
use crate::store::Database;
use crate::utils::{AppError, AppResult};

/// Troca de papel e/ou de obras vinculadas
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlteracaoAcesso {
    pub papel: Option<Papel>,
    pub obra_ids: Option<Vec<Uuid>>,
}

#[derive(Clone)]
pub struct UsuariosService {
    db: Arc<Database>,
}

impl UsuariosService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn exigir_admin(sessao: &Sessao) -> AppResult<()> {
        if sessao.capacidades.gerenciar_usuarios {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    pub async fn criar(&self, sessao: &Sessao, novo: NovoUsuario) -> AppResult<Usuario> {
        Self::exigir_admin(sessao)?;
        if novo.email.trim().is_empty() || novo.nome.trim().is_empty() {
            return Err(AppError::ValidationError("Email e nome são obrigatórios".to_string()));
        }
        if !novo.email.contains('@') {
            return Err(AppError::ValidationError("Email inválido".to_string()));
        }

        let usuario = self.db.inserir_usuario(Uuid::new_v4(), novo).await?;
        info!(
            "👤 Usuário criado: {} ({:?}) por {}",
            usuario.perfil.email,
            usuario.papel,
            sessao.id()
        );
        Ok(usuario)
    }

    pub async fn listar(&self, sessao: &Sessao) -> AppResult<Vec<Usuario>> {
        Self::exigir_admin(sessao)?;
        Ok(self.db.listar_usuarios().await)
    }

    pub async fn alterar_acesso(&self, sessao: &Sessao, id: Uuid, alteracao: AlteracaoAcesso) -> AppResult<Usuario> {
        Self::exigir_admin(sessao)?;

        if let Some(papel) = alteracao.papel {
            self.db.definir_papel(id, papel).await?;
        }
        if let Some(obra_ids) = alteracao.obra_ids {
            self.db.definir_obras(id, &obra_ids).await?;
        }

        self.db
            .carregar_usuario(id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Usuário não encontrado: {}", id)))
    }

    /// Cadastro inicial obrigatório no primeiro acesso
    pub async fn concluir_perfil(&self, sessao: &Sessao, dados: ConclusaoPerfil) -> AppResult<Perfil> {
        if dados.nome.trim().is_empty() || dados.telefone.trim().is_empty() {
            return Err(AppError::ValidationError("Nome e telefone são obrigatórios".to_string()));
        }
        let dados = ConclusaoPerfil {
            nome: dados.nome.trim().to_string(),
            telefone: dados.telefone.trim().to_string(),
        };
        Ok(self.db.concluir_perfil(sessao.id(), dados).await?)
    }

    /// Garante um administrador inicial; não faz nada se o email já existe
    pub async fn garantir_admin(&self, email: &str, nome: &str) -> AppResult<Option<Usuario>> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Ok(None);
        }
        if self
            .db
            .listar_usuarios()
            .await
            .iter()
            .any(|u| u.perfil.email == email)
        {
            return Ok(None);
        }

        let usuario = self
            .db
            .inserir_usuario(
                Uuid::new_v4(),
                NovoUsuario {
                    email,
                    nome: nome.to_string(),
                    telefone: None,
                    papel: Papel::Admin,
                    obra_ids: Vec::new(),
                    empresa_id: None,
                },
            )
            .await?;
        info!("👤 Administrador inicial criado: {} ({})", usuario.perfil.email, usuario.perfil.id);
        Ok(Some(usuario))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Cenario;

    fn novo(email: &str, papel: Papel, obra_ids: Vec<Uuid>) -> NovoUsuario {
        NovoUsuario {
            email: email.to_string(),
            nome: "Fulano".into(),
            telefone: None,
            papel,
            obra_ids,
            empresa_id: None,
        }
    }

    #[tokio::test]
    async fn test_somente_admin_cria_usuarios() {
        let cenario = Cenario::novo(None, None).await;
        let usuarios = UsuariosService::new(cenario.db.clone());

        let err = usuarios
            .criar(&cenario.equipe, novo("x@grifo.com", Papel::Obra, vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        let criado = usuarios
            .criar(&cenario.admin, novo("novo@grifo.com", Papel::Obra, vec![cenario.obra.id]))
            .await
            .unwrap();
        assert!(!criado.perfil.perfil_completo);
        assert!(criado.obras.contains(&cenario.obra.id));

        let err = usuarios
            .criar(&cenario.admin, novo("novo@grifo.com", Papel::Obra, vec![]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Já existe um usuário com este email");
    }

    #[tokio::test]
    async fn test_alterar_acesso_e_concluir_perfil() {
        let cenario = Cenario::novo(None, None).await;
        let usuarios = UsuariosService::new(cenario.db.clone());

        let alterado = usuarios
            .alterar_acesso(
                &cenario.admin,
                cenario.equipe.id(),
                AlteracaoAcesso {
                    papel: Some(Papel::Orcamento),
                    obra_ids: Some(vec![]),
                },
            )
            .await
            .unwrap();
        assert_eq!(alterado.papel, Papel::Orcamento);
        assert!(alterado.obras.is_empty());

        let err = usuarios
            .concluir_perfil(
                &cenario.equipe,
                ConclusaoPerfil {
                    nome: "Equipe".into(),
                    telefone: " ".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let perfil = usuarios
            .concluir_perfil(
                &cenario.equipe,
                ConclusaoPerfil {
                    nome: " Equipe Obra ".into(),
                    telefone: "(11) 99999-0000".into(),
                },
            )
            .await
            .unwrap();
        assert!(perfil.perfil_completo);
        assert_eq!(perfil.nome, "Equipe Obra");
    }

    #[tokio::test]
    async fn test_garantir_admin_idempotente() {
        let cenario = Cenario::novo(None, None).await;
        let usuarios = UsuariosService::new(cenario.db.clone());

        assert!(usuarios.garantir_admin("root@grifo.com", "Root").await.unwrap().is_some());
        assert!(usuarios.garantir_admin("ROOT@grifo.com", "Root").await.unwrap().is_none());
        assert!(usuarios.garantir_admin("", "Root").await.unwrap().is_none());
    }
}
