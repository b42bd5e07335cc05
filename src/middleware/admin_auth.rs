/// Middleware de autenticação para endpoints administrativos
///
/// Valida que a requisição contém a chave configurada em `admin.api_key`
/// (ou `ADMIN_API_KEY`) no header X-Admin-Key.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::AppState;

pub const HEADER_ADMIN_KEY: &str = "X-Admin-Key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcessoAdmin {
    Liberado,
    /// Chave ausente ou incorreta
    Negado,
    /// Produção sem chave configurada
    Indisponivel,
}

/// Decide o acesso a partir da chave esperada, da fornecida e do ambiente
///
/// Em desenvolvimento, sem chave configurada, o acesso é liberado com warning.
pub fn avaliar_acesso(esperada: Option<&str>, fornecida: Option<&str>, producao: bool) -> AcessoAdmin {
    match (esperada, fornecida, producao) {
        // Caso 1: chave configurada e correta
        (Some(esperada), Some(fornecida), _) if esperada == fornecida => {
            tracing::debug!("✅ Admin access granted");
            AcessoAdmin::Liberado
        }

        // Caso 2: chave configurada mas incorreta/ausente
        (Some(_), fornecida, _) => {
            tracing::warn!(
                "❌ Admin access denied - Invalid or missing X-Admin-Key: {:?}",
                fornecida.map(|_| "<redacted>")
            );
            AcessoAdmin::Negado
        }

        // Caso 3: sem chave em desenvolvimento
        (None, _, false) => {
            tracing::warn!(
                "⚠️  ADMIN_API_KEY not configured - Allowing access in development mode. \
                 Configure ADMIN_API_KEY in production!"
            );
            AcessoAdmin::Liberado
        }

        // Caso 4: sem chave em produção
        (None, _, true) => {
            tracing::error!("🚨 ADMIN_API_KEY not configured in production! Blocking admin access.");
            AcessoAdmin::Indisponivel
        }
    }
}

/// Middleware que exige X-Admin-Key nos endpoints /admin/*
///
/// ```bash
/// curl -X POST -H "X-Admin-Key: $ADMIN_API_KEY" -d @credores.json \
///   https://app.run.app/admin/credores/sync
/// ```
pub async fn require_admin_key(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let fornecida = headers.get(HEADER_ADMIN_KEY).and_then(|v| v.to_str().ok());

    match avaliar_acesso(
        state.settings.admin.api_key.as_deref(),
        fornecida,
        state.settings.server.is_production(),
    ) {
        AcessoAdmin::Liberado => Ok(next.run(request).await),
        AcessoAdmin::Negado => Err(unauthorized_response()),
        AcessoAdmin::Indisponivel => Err(service_unavailable_response()),
    }
}

/// Resposta de erro 401 Unauthorized
fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "Unauthorized",
            "message": "Missing or invalid X-Admin-Key header",
            "hint": "Include X-Admin-Key header with valid API key"
        })),
    )
        .into_response()
}

/// Resposta de erro 503 Service Unavailable (config inválida)
fn service_unavailable_response() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "error": "Service Unavailable",
            "message": "ADMIN_API_KEY not configured on server",
            "hint": "Contact administrator to configure ADMIN_API_KEY"
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_key_validation_logic() {
        assert_eq!(avaliar_acesso(Some("k-123"), Some("k-123"), true), AcessoAdmin::Liberado);
        assert_eq!(avaliar_acesso(Some("k-123"), Some("errada"), false), AcessoAdmin::Negado);
        assert_eq!(avaliar_acesso(Some("k-123"), None, false), AcessoAdmin::Negado);
    }

    #[test]
    fn test_sem_chave_configurada() {
        assert_eq!(avaliar_acesso(None, None, false), AcessoAdmin::Liberado);
        assert_eq!(avaliar_acesso(None, Some("qualquer"), true), AcessoAdmin::Indisponivel);
    }
}
