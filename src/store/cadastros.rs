use chrono::Utc;
use std::collections::BTreeSet;
use uuid::Uuid;

use super::{Database, StoreError};
use crate::models::{
    AtualizacaoObra, ChangeEvent, ConclusaoPerfil, Credor, NovaEtapa, NovaObra, NovoUsuario, Obra, ObraEtapa, Papel,
    Perfil, Tabela, TipoEvento, Usuario,
};

fn obra_nao_encontrada(id: Uuid) -> StoreError {
    StoreError::NaoEncontrado {
        entidade: "Obra",
        id: id.to_string(),
    }
}

fn usuario_nao_encontrado(id: Uuid) -> StoreError {
    StoreError::NaoEncontrado {
        entidade: "Usuário",
        id: id.to_string(),
    }
}

// ==================== Obras ====================

impl Database {
    pub async fn inserir_obra(&self, nova: NovaObra) -> Result<Obra, StoreError> {
        let obra = {
            let mut tabelas = self.tabelas.write().await;
            if tabelas.obras.values().any(|o| o.codigo == nova.codigo) {
                return Err(StoreError::Duplicado {
                    tabela: "obras",
                    detalhe: format!("codigo {}", nova.codigo),
                });
            }

            let obra = Obra {
                id: Uuid::new_v4(),
                nome: nova.nome,
                codigo: nova.codigo,
                endereco: nova.endereco,
                ativa: true,
                grupo_id: nova.grupo_id.filter(|g| !g.trim().is_empty()),
                permite_sem_apropriacao: nova.permite_sem_apropriacao,
                ocultar_codigo_obra: nova.ocultar_codigo_obra,
                created_at: Utc::now(),
            };
            tabelas.obras.insert(obra.id, obra.clone());
            obra
        };

        self.publicar([ChangeEvent::new(Tabela::Obras, TipoEvento::Insert, Some(obra.id)).da_obra(obra.id)]);
        Ok(obra)
    }

    pub async fn atualizar_obra(&self, id: Uuid, alteracao: AtualizacaoObra) -> Result<Obra, StoreError> {
        let obra = {
            let mut tabelas = self.tabelas.write().await;
            if let Some(codigo) = &alteracao.codigo {
                if tabelas.obras.values().any(|o| o.id != id && &o.codigo == codigo) {
                    return Err(StoreError::Duplicado {
                        tabela: "obras",
                        detalhe: format!("codigo {}", codigo),
                    });
                }
            }

            let obra = tabelas.obras.get_mut(&id).ok_or_else(|| obra_nao_encontrada(id))?;
            alteracao.aplicar(obra);
            obra.clone()
        };

        self.publicar([ChangeEvent::new(Tabela::Obras, TipoEvento::Update, Some(id)).da_obra(id)]);
        Ok(obra)
    }

    pub async fn buscar_obra(&self, id: Uuid) -> Option<Obra> {
        self.tabelas.read().await.obras.get(&id).cloned()
    }

    /// Lista obras por nome; `visiveis` restringe às obras vinculadas
    pub async fn listar_obras(&self, visiveis: Option<&BTreeSet<Uuid>>) -> Vec<Obra> {
        let tabelas = self.tabelas.read().await;
        let mut obras: Vec<Obra> = tabelas
            .obras
            .values()
            .filter(|o| visiveis.map_or(true, |ids| ids.contains(&o.id)))
            .cloned()
            .collect();
        obras.sort_by(|a, b| a.nome.cmp(&b.nome));
        obras
    }

    // ==================== Etapas ====================

    pub async fn listar_etapas(&self, obra_id: Uuid) -> Vec<ObraEtapa> {
        let tabelas = self.tabelas.read().await;
        let mut etapas: Vec<ObraEtapa> = tabelas
            .obra_etapas
            .values()
            .filter(|e| e.obra_id == obra_id)
            .cloned()
            .collect();
        etapas.sort_by(|a, b| a.codigo.cmp(&b.codigo));
        etapas
    }

    pub async fn inserir_etapa(&self, obra_id: Uuid, nova: NovaEtapa) -> Result<ObraEtapa, StoreError> {
        let mut inseridas = self.inserir_etapas(obra_id, vec![nova]).await?;
        inseridas.pop().ok_or_else(|| obra_nao_encontrada(obra_id))
    }

    /// Inserção em lote: se algum código já existir (ou repetir no lote),
    /// nenhuma etapa é gravada
    pub async fn inserir_etapas(&self, obra_id: Uuid, novas: Vec<NovaEtapa>) -> Result<Vec<ObraEtapa>, StoreError> {
        let inseridas = {
            let mut tabelas = self.tabelas.write().await;
            if !tabelas.obras.contains_key(&obra_id) {
                return Err(obra_nao_encontrada(obra_id));
            }

            let mut codigos: BTreeSet<String> = tabelas
                .obra_etapas
                .values()
                .filter(|e| e.obra_id == obra_id)
                .map(|e| e.codigo.clone())
                .collect();

            for nova in &novas {
                if !codigos.insert(nova.codigo.clone()) {
                    return Err(StoreError::Duplicado {
                        tabela: "obra_etapas",
                        detalhe: format!("obra {} codigo {}", obra_id, nova.codigo),
                    });
                }
            }

            let agora = Utc::now();
            let inseridas: Vec<ObraEtapa> = novas
                .into_iter()
                .map(|nova| ObraEtapa {
                    id: Uuid::new_v4(),
                    obra_id,
                    codigo: nova.codigo,
                    nome: nova.nome,
                    created_at: agora,
                })
                .collect();

            for etapa in &inseridas {
                tabelas.obra_etapas.insert(etapa.id, etapa.clone());
            }
            inseridas
        };

        self.publicar(
            inseridas
                .iter()
                .map(|e| ChangeEvent::new(Tabela::ObraEtapas, TipoEvento::Insert, Some(e.id)).da_obra(e.obra_id)),
        );
        Ok(inseridas)
    }

    pub async fn remover_etapa(&self, obra_id: Uuid, etapa_id: Uuid) -> Result<(), StoreError> {
        {
            let mut tabelas = self.tabelas.write().await;
            match tabelas.obra_etapas.get(&etapa_id) {
                Some(etapa) if etapa.obra_id == obra_id => {
                    tabelas.obra_etapas.remove(&etapa_id);
                }
                _ => {
                    return Err(StoreError::NaoEncontrado {
                        entidade: "Etapa",
                        id: etapa_id.to_string(),
                    })
                }
            }
        }

        self.publicar([ChangeEvent::new(Tabela::ObraEtapas, TipoEvento::Delete, Some(etapa_id)).da_obra(obra_id)]);
        Ok(())
    }

    // ==================== Usuários ====================

    /// Cria perfil, papel e vínculos de obra de uma vez
    ///
    /// Administradores veem todas as obras, então não recebem vínculos.
    pub async fn inserir_usuario(&self, id: Uuid, novo: NovoUsuario) -> Result<Usuario, StoreError> {
        let email = novo.email.trim().to_lowercase();
        let usuario = {
            let mut tabelas = self.tabelas.write().await;
            if tabelas.profiles.contains_key(&id) || tabelas.profiles.values().any(|p| p.email == email) {
                return Err(StoreError::Duplicado {
                    tabela: "profiles",
                    detalhe: format!("email {}", email),
                });
            }
            if let Some(obra_id) = novo.obra_ids.iter().find(|o| !tabelas.obras.contains_key(o)) {
                return Err(obra_nao_encontrada(*obra_id));
            }

            let perfil = Perfil {
                id,
                nome: novo.nome,
                email,
                telefone: novo.telefone,
                perfil_completo: false,
                empresa_id: novo.empresa_id,
                created_at: Utc::now(),
            };
            tabelas.profiles.insert(id, perfil.clone());
            tabelas.user_roles.insert(id, novo.papel);
            if novo.papel != Papel::Admin {
                for obra_id in &novo.obra_ids {
                    tabelas.user_obras.insert((id, *obra_id));
                }
            }

            Usuario {
                obras: tabelas.obras_do_usuario(id),
                perfil,
                papel: novo.papel,
            }
        };

        self.publicar([
            ChangeEvent::new(Tabela::Profiles, TipoEvento::Insert, Some(id)),
            ChangeEvent::new(Tabela::UserRoles, TipoEvento::Insert, Some(id)),
            ChangeEvent::new(Tabela::UserObras, TipoEvento::Insert, Some(id)),
        ]);
        Ok(usuario)
    }

    pub async fn carregar_usuario(&self, id: Uuid) -> Option<Usuario> {
        let tabelas = self.tabelas.read().await;
        let perfil = tabelas.profiles.get(&id)?.clone();
        Some(Usuario {
            papel: tabelas.user_roles.get(&id).copied().unwrap_or_default(),
            obras: tabelas.obras_do_usuario(id),
            perfil,
        })
    }

    pub async fn listar_usuarios(&self) -> Vec<Usuario> {
        let tabelas = self.tabelas.read().await;
        let mut usuarios: Vec<Usuario> = tabelas
            .profiles
            .values()
            .map(|perfil| Usuario {
                papel: tabelas.user_roles.get(&perfil.id).copied().unwrap_or_default(),
                obras: tabelas.obras_do_usuario(perfil.id),
                perfil: perfil.clone(),
            })
            .collect();
        usuarios.sort_by(|a, b| a.perfil.nome.cmp(&b.perfil.nome));
        usuarios
    }

    pub async fn definir_papel(&self, id: Uuid, papel: Papel) -> Result<(), StoreError> {
        {
            let mut tabelas = self.tabelas.write().await;
            if !tabelas.profiles.contains_key(&id) {
                return Err(usuario_nao_encontrado(id));
            }
            tabelas.user_roles.insert(id, papel);
        }

        self.publicar([ChangeEvent::new(Tabela::UserRoles, TipoEvento::Update, Some(id))]);
        Ok(())
    }

    /// Substitui os vínculos de obra do usuário
    pub async fn definir_obras(&self, id: Uuid, obra_ids: &[Uuid]) -> Result<(), StoreError> {
        {
            let mut tabelas = self.tabelas.write().await;
            if !tabelas.profiles.contains_key(&id) {
                return Err(usuario_nao_encontrado(id));
            }
            if let Some(obra_id) = obra_ids.iter().find(|o| !tabelas.obras.contains_key(o)) {
                return Err(obra_nao_encontrada(*obra_id));
            }

            tabelas.user_obras.retain(|(user_id, _)| *user_id != id);
            for obra_id in obra_ids {
                tabelas.user_obras.insert((id, *obra_id));
            }
        }

        self.publicar([ChangeEvent::new(Tabela::UserObras, TipoEvento::Update, Some(id))]);
        Ok(())
    }

    pub async fn concluir_perfil(&self, id: Uuid, dados: ConclusaoPerfil) -> Result<Perfil, StoreError> {
        let perfil = {
            let mut tabelas = self.tabelas.write().await;
            let perfil = tabelas.profiles.get_mut(&id).ok_or_else(|| usuario_nao_encontrado(id))?;
            perfil.nome = dados.nome;
            perfil.telefone = Some(dados.telefone);
            perfil.perfil_completo = true;
            perfil.clone()
        };

        self.publicar([ChangeEvent::new(Tabela::Profiles, TipoEvento::Update, Some(id))]);
        Ok(perfil)
    }

    // ==================== Credores ====================

    /// Troca o espelho de credores inteiro
    pub async fn substituir_credores(&self, mut credores: Vec<Credor>) -> usize {
        credores.sort_by(|a, b| a.nome.cmp(&b.nome));
        let total = credores.len();
        self.tabelas.write().await.sienge_credores = credores;

        self.publicar([ChangeEvent::new(Tabela::SiengeCredores, TipoEvento::Update, None)]);
        total
    }

    /// Página de credores ordenados por nome, intervalo inclusivo `de..=ate`
    pub async fn pagina_credores(&self, de: usize, ate: usize) -> Vec<Credor> {
        let tabelas = self.tabelas.read().await;
        tabelas
            .sienge_credores
            .iter()
            .skip(de)
            .take(ate.saturating_sub(de) + 1)
            .cloned()
            .collect()
    }

    pub async fn contar_credores(&self) -> usize {
        self.tabelas.read().await.sienge_credores.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::realtime::ChangeFeed;

    fn nova_obra(codigo: &str) -> NovaObra {
        NovaObra {
            nome: format!("Obra {}", codigo),
            codigo: codigo.to_string(),
            endereco: String::new(),
            grupo_id: None,
            permite_sem_apropriacao: false,
            ocultar_codigo_obra: false,
        }
    }

    fn etapa(codigo: &str) -> NovaEtapa {
        NovaEtapa {
            codigo: codigo.to_string(),
            nome: format!("Etapa {}", codigo),
        }
    }

    #[tokio::test]
    async fn test_etapa_duplicada_gera_codigo_23505() {
        let db = Database::new(ChangeFeed::new(16));
        let obra = db.inserir_obra(nova_obra("OB-1")).await.unwrap();
        db.inserir_etapa(obra.id, etapa("01")).await.unwrap();

        let err = db.inserir_etapa(obra.id, etapa("01")).await.unwrap_err();
        assert_eq!(err.codigo(), Some("23505"));

        // Mesmo código em outra obra é permitido
        let outra = db.inserir_obra(nova_obra("OB-2")).await.unwrap();
        assert!(db.inserir_etapa(outra.id, etapa("01")).await.is_ok());
    }

    #[tokio::test]
    async fn test_lote_de_etapas_e_atomico() {
        let db = Database::new(ChangeFeed::new(16));
        let obra = db.inserir_obra(nova_obra("OB-1")).await.unwrap();

        let resultado = db
            .inserir_etapas(obra.id, vec![etapa("02"), etapa("03"), etapa("02")])
            .await;
        assert!(resultado.is_err());
        assert!(db.listar_etapas(obra.id).await.is_empty());

        db.inserir_etapas(obra.id, vec![etapa("02"), etapa("01")]).await.unwrap();
        let codigos: Vec<String> = db.listar_etapas(obra.id).await.into_iter().map(|e| e.codigo).collect();
        assert_eq!(codigos, vec!["01", "02"]);
    }

    #[tokio::test]
    async fn test_usuario_admin_nao_recebe_vinculos() {
        let db = Database::new(ChangeFeed::new(16));
        let obra = db.inserir_obra(nova_obra("OB-1")).await.unwrap();

        let admin = db
            .inserir_usuario(
                Uuid::new_v4(),
                NovoUsuario {
                    email: "Admin@Grifo.com".into(),
                    nome: "Admin".into(),
                    telefone: None,
                    papel: Papel::Admin,
                    obra_ids: vec![obra.id],
                    empresa_id: None,
                },
            )
            .await
            .unwrap();
        assert!(admin.obras.is_empty());
        assert_eq!(admin.perfil.email, "admin@grifo.com");

        let repetido = db
            .inserir_usuario(
                Uuid::new_v4(),
                NovoUsuario {
                    email: "admin@grifo.com".into(),
                    nome: "Outro".into(),
                    telefone: None,
                    papel: Papel::Obra,
                    obra_ids: vec![],
                    empresa_id: None,
                },
            )
            .await;
        assert!(matches!(repetido, Err(StoreError::Duplicado { tabela: "profiles", .. })));
    }

    #[tokio::test]
    async fn test_definir_obras_substitui_vinculos() {
        let db = Database::new(ChangeFeed::new(16));
        let a = db.inserir_obra(nova_obra("A")).await.unwrap();
        let b = db.inserir_obra(nova_obra("B")).await.unwrap();
        let id = Uuid::new_v4();
        db.inserir_usuario(
            id,
            NovoUsuario {
                email: "equipe@grifo.com".into(),
                nome: "Equipe".into(),
                telefone: None,
                papel: Papel::Obra,
                obra_ids: vec![a.id],
                empresa_id: None,
            },
        )
        .await
        .unwrap();

        db.definir_obras(id, &[b.id]).await.unwrap();
        let usuario = db.carregar_usuario(id).await.unwrap();
        assert_eq!(usuario.obras.into_iter().collect::<Vec<_>>(), vec![b.id]);
    }

    #[tokio::test]
    async fn test_paginas_de_credores() {
        let db = Database::new(ChangeFeed::new(16));
        let credores = (0..5)
            .map(|i| Credor {
                id: Uuid::new_v4(),
                creditor_id: i,
                nome: format!("Credor {}", 4 - i),
                nome_fantasia: None,
                doc: None,
                tipo: None,
            })
            .collect();
        assert_eq!(db.substituir_credores(credores).await, 5);

        let primeira = db.pagina_credores(0, 1).await;
        assert_eq!(primeira.len(), 2);
        assert_eq!(primeira[0].nome, "Credor 0");
        assert_eq!(db.pagina_credores(4, 5).await.len(), 1);
        assert!(db.pagina_credores(6, 7).await.is_empty());
    }
}
