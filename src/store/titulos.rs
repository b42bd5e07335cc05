use chrono::Utc;
use uuid::Uuid;

use super::{Database, StoreError, Tabelas};
use crate::models::{ChangeEvent, Colecao, Tabela, TipoEvento, Titulo, TituloStatus};

impl Tabelas {
    /// Erro adequado quando o título não está na coleção esperada
    fn erro_fora_da_colecao(&self, id: Uuid, esperada: Colecao) -> StoreError {
        let outra = match esperada {
            Colecao::Pendentes => Colecao::Finalizados,
            Colecao::Finalizados => Colecao::Pendentes,
        };

        match self.colecao(outra).get(&id) {
            Some(titulo) => StoreError::ForaDaColecao {
                id,
                esperada: esperada.tabela(),
                status_atual: titulo.status.to_string(),
            },
            None => StoreError::titulo_nao_encontrado(id),
        }
    }
}

impl Database {
    /// Insere um título em `titulos_pendentes`
    pub async fn inserir_pendente(&self, titulo: Titulo) -> Result<Titulo, StoreError> {
        let id = titulo.id;
        let obra_id = titulo.obra_id;
        let inserido = {
            let mut tabelas = self.tabelas.write().await;
            if tabelas.titulos_pendentes.contains_key(&id) || tabelas.titulos.contains_key(&id) {
                return Err(StoreError::Duplicado {
                    tabela: "titulos_pendentes",
                    detalhe: format!("id {}", id),
                });
            }
            tabelas.titulos_pendentes.insert(id, titulo.clone());
            tabelas.com_obra_nome(titulo)
        };

        self.publicar([ChangeEvent::new(Tabela::TitulosPendentes, TipoEvento::Insert, Some(id)).da_obra(obra_id)]);
        Ok(inserido)
    }

    /// Procura o título nas duas coleções
    pub async fn buscar_titulo(&self, id: Uuid) -> Option<(Colecao, Titulo)> {
        let tabelas = self.tabelas.read().await;
        [Colecao::Pendentes, Colecao::Finalizados]
            .into_iter()
            .find_map(|colecao| {
                tabelas
                    .colecao(colecao)
                    .get(&id)
                    .map(|t| (colecao, tabelas.com_obra_nome(t.clone())))
            })
    }

    /// Lista uma coleção, mais recentes primeiro
    pub async fn listar_titulos(
        &self,
        colecao: Colecao,
        obra_id: Option<Uuid>,
        status: Option<&[TituloStatus]>,
    ) -> Vec<Titulo> {
        let tabelas = self.tabelas.read().await;
        let mut titulos: Vec<Titulo> = tabelas
            .colecao(colecao)
            .values()
            .filter(|t| obra_id.map_or(true, |obra| t.obra_id == obra))
            .filter(|t| status.map_or(true, |aceitos| aceitos.contains(&t.status)))
            .map(|t| tabelas.com_obra_nome(t.clone()))
            .collect();

        titulos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        titulos
    }

    /// Atualiza um título dentro da sua coleção
    ///
    /// `alterar` roda sobre uma cópia dentro da guarda de escrita; se
    /// devolver erro nada é gravado.
    pub async fn atualizar_titulo<F, E>(&self, colecao: Colecao, id: Uuid, alterar: F) -> Result<Titulo, E>
    where
        F: FnOnce(&mut Titulo) -> Result<(), E>,
        E: From<StoreError>,
    {
        let atualizado = {
            let mut tabelas = self.tabelas.write().await;
            let mut copia = match tabelas.colecao(colecao).get(&id) {
                Some(titulo) => titulo.clone(),
                None => return Err(tabelas.erro_fora_da_colecao(id, colecao).into()),
            };

            alterar(&mut copia)?;
            copia.updated_at = Utc::now();

            if copia.status.colecao() != colecao {
                return Err(StoreError::ForaDaColecao {
                    id,
                    esperada: copia.status.colecao().tabela(),
                    status_atual: copia.status.to_string(),
                }
                .into());
            }

            tabelas.colecao_mut(colecao).insert(id, copia.clone());
            tabelas.com_obra_nome(copia)
        };

        self.publicar([ChangeEvent::new(colecao.into(), TipoEvento::Update, Some(id)).da_obra(atualizado.obra_id)]);
        Ok(atualizado)
    }

    /// Move um título de uma coleção para a outra
    ///
    /// Leitura, alteração, remoção da origem e inserção no destino ocorrem
    /// sob a mesma guarda de escrita: ou tudo acontece, ou nada.
    pub async fn mover_titulo<F, E>(&self, de: Colecao, para: Colecao, id: Uuid, alterar: F) -> Result<Titulo, E>
    where
        F: FnOnce(&mut Titulo) -> Result<(), E>,
        E: From<StoreError>,
    {
        let movido = {
            let mut tabelas = self.tabelas.write().await;
            let mut copia = match tabelas.colecao(de).get(&id) {
                Some(titulo) => titulo.clone(),
                None => return Err(tabelas.erro_fora_da_colecao(id, de).into()),
            };

            alterar(&mut copia)?;
            copia.updated_at = Utc::now();

            if copia.status.colecao() != para {
                return Err(StoreError::ForaDaColecao {
                    id,
                    esperada: para.tabela(),
                    status_atual: copia.status.to_string(),
                }
                .into());
            }

            tabelas.colecao_mut(de).remove(&id);
            tabelas.colecao_mut(para).insert(id, copia.clone());
            tabelas.com_obra_nome(copia)
        };

        self.publicar([
            ChangeEvent::new(para.into(), TipoEvento::Insert, Some(id)).da_obra(movido.obra_id),
            ChangeEvent::new(de.into(), TipoEvento::Delete, Some(id)).da_obra(movido.obra_id),
        ]);
        Ok(movido)
    }

    /// Contagem por coleção, usada em /status
    pub async fn contar_titulos(&self) -> (usize, usize) {
        let tabelas = self.tabelas.read().await;
        (tabelas.titulos_pendentes.len(), tabelas.titulos.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::realtime::ChangeFeed;
    use crate::test_support::titulo_exemplo;
    use crate::utils::AppError;

    #[tokio::test]
    async fn test_mover_titulo_nunca_duplica() {
        let db = Database::new(ChangeFeed::new(16));
        let mut titulo = titulo_exemplo(Uuid::new_v4());
        titulo.status = TituloStatus::Aprovado;
        let id = titulo.id;
        db.inserir_pendente(titulo).await.unwrap();

        let pago = db
            .mover_titulo::<_, StoreError>(Colecao::Pendentes, Colecao::Finalizados, id, |t| {
                t.status = TituloStatus::Pago;
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(pago.status, TituloStatus::Pago);
        assert!(db.listar_titulos(Colecao::Pendentes, None, None).await.is_empty());
        assert_eq!(db.listar_titulos(Colecao::Finalizados, None, None).await.len(), 1);
        assert_eq!(db.buscar_titulo(id).await.map(|(c, _)| c), Some(Colecao::Finalizados));
    }

    #[tokio::test]
    async fn test_mover_com_erro_nao_altera_nada() {
        let db = Database::new(ChangeFeed::new(16));
        let titulo = titulo_exemplo(Uuid::new_v4());
        let id = titulo.id;
        db.inserir_pendente(titulo).await.unwrap();

        let resultado = db
            .mover_titulo(Colecao::Pendentes, Colecao::Finalizados, id, |_| {
                Err::<(), AppError>(AppError::TransicaoInvalida("não aprovado".into()))
            })
            .await;

        assert!(resultado.is_err());
        assert_eq!(db.contar_titulos().await, (1, 0));
    }

    #[tokio::test]
    async fn test_atualizar_fora_da_colecao() {
        let db = Database::new(ChangeFeed::new(16));
        let mut titulo = titulo_exemplo(Uuid::new_v4());
        titulo.status = TituloStatus::Aprovado;
        let id = titulo.id;
        db.inserir_pendente(titulo).await.unwrap();
        db.mover_titulo::<_, StoreError>(Colecao::Pendentes, Colecao::Finalizados, id, |t| {
            t.status = TituloStatus::Pago;
            Ok(())
        })
        .await
        .unwrap();

        let err = db
            .atualizar_titulo::<_, StoreError>(Colecao::Pendentes, id, |_| Ok(()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ForaDaColecao { .. }));

        let err = db
            .atualizar_titulo::<_, StoreError>(Colecao::Pendentes, Uuid::new_v4(), |_| Ok(()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NaoEncontrado { .. }));
    }

    #[tokio::test]
    async fn test_publica_eventos_na_movimentacao() {
        let feed = ChangeFeed::new(16);
        let mut rx = feed.assinar();
        let db = Database::new(feed);
        let mut titulo = titulo_exemplo(Uuid::new_v4());
        titulo.status = TituloStatus::Aprovado;
        let id = titulo.id;
        db.inserir_pendente(titulo).await.unwrap();
        db.mover_titulo::<_, StoreError>(Colecao::Pendentes, Colecao::Finalizados, id, |t| {
            t.status = TituloStatus::Pago;
            Ok(())
        })
        .await
        .unwrap();

        let tipos: Vec<(Tabela, TipoEvento)> = (0..3)
            .map(|_| rx.try_recv().map(|e| (e.tabela, e.tipo)).unwrap())
            .collect();
        assert_eq!(
            tipos,
            vec![
                (Tabela::TitulosPendentes, TipoEvento::Insert),
                (Tabela::Titulos, TipoEvento::Insert),
                (Tabela::TitulosPendentes, TipoEvento::Delete),
            ]
        );
    }
}
