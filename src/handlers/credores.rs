use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::models::Credor;
use crate::utils::logging::{log_info, log_request_received};
use crate::utils::AppError;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct BuscaCredores {
    #[serde(default)]
    pub q: String,
}

/// Autocomplete do formulário; termos com menos de 2 caracteres devolvem vazio
pub async fn buscar_credores(
    State(state): State<Arc<AppState>>,
    Query(busca): Query<BuscaCredores>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/credores", "GET");

    let credores = state.credores.buscar(&busca.q).await;
    Ok(Json(json!({
        "count": credores.len(),
        "credores": credores
    })))
}

pub async fn buscar_credor(
    State(state): State<Arc<AppState>>,
    Path(creditor_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/credores/:creditor_id", "GET");

    let credor = state
        .credores
        .buscar_por_id(creditor_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Credor não encontrado: {}", creditor_id)))?;
    Ok(Json(json!({ "credor": credor })))
}

/// Substitui o espelho de credores do Sienge (rota administrativa)
pub async fn sincronizar_credores(
    State(state): State<Arc<AppState>>,
    Json(credores): Json<Vec<Credor>>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/admin/credores/sync", "POST");

    let total = state.credores.sincronizar(credores).await;
    log_info(&format!("📇 {} credores sincronizados", total));

    Ok(Json(json!({
        "status": "success",
        "total": total,
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
