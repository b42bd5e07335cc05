use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Extension,
};
use futures_util::stream::{self, Stream};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::models::{ChangeEvent, Sessao, Tabela};
use crate::utils::logging::log_request_received;
use crate::AppState;

/// Equipe de obra só recebe eventos das obras vinculadas
///
/// Alterações de usuário chegam só para o próprio usuário e para quem
/// gerencia usuários; o cadastro de credores é comum a todos.
pub fn evento_visivel(sessao: &Sessao, evento: &ChangeEvent) -> bool {
    match evento.tabela {
        Tabela::SiengeCredores => true,
        Tabela::Profiles | Tabela::UserRoles | Tabela::UserObras => {
            sessao.capacidades.gerenciar_usuarios || evento.id == Some(sessao.id())
        }
        Tabela::TitulosPendentes | Tabela::Titulos | Tabela::Obras | Tabela::ObraEtapas => {
            sessao.capacidades.ver_todas_obras
                || evento
                    .obra_id
                    .map_or(false, |obra| sessao.capacidades.acessa_obra(obra))
        }
    }
}

/// Repassa o feed de alterações como Server-Sent Events
///
/// O evento leva apenas tabela, tipo e ids; o cliente refaz a leitura. Um
/// evento `resync` avisa que eventos foram perdidos. As capacidades são as
/// da sessão no momento da conexão.
pub async fn stream_alteracoes(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    log_request_received("/realtime", "GET");

    let rx = state.db.feed().assinar();
    let eventos = stream::unfold((rx, sessao), |(mut rx, sessao)| async move {
        loop {
            match rx.recv().await {
                Ok(evento) if evento_visivel(&sessao, &evento) => {
                    let sse = Event::default().event(evento.tabela.as_str()).json_data(&evento);
                    return Some((sse, (rx, sessao)));
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(perdidos)) => {
                    let sse = Event::default().event("resync").data(perdidos.to_string());
                    return Some((Ok(sse), (rx, sessao)));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(eventos).keep_alive(KeepAlive::default())
}
