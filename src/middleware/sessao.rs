//! Resolve o usuário da requisição a partir do header X-User-Id
//!
//! O gateway de autenticação na frente do serviço coloca o id do usuário
//! logado; aqui ele vira uma `Sessao` com as capacidades já calculadas.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::Sessao;
use crate::utils::AppError;
use crate::AppState;

pub const HEADER_USER_ID: &str = "X-User-Id";

pub async fn require_sessao(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let usuario_id = request
        .headers()
        .get(HEADER_USER_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .ok_or(AppError::Unauthorized)?;

    let usuario = state.db.carregar_usuario(usuario_id).await.ok_or_else(|| {
        tracing::warn!("❌ Usuário desconhecido no header {}: {}", HEADER_USER_ID, usuario_id);
        AppError::Unauthorized
    })?;

    request.extensions_mut().insert(Sessao::new(usuario));
    Ok(next.run(request).await)
}
