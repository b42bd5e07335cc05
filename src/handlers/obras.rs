//! Obras e etapas por obra

use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{AtualizacaoObra, NovaEtapa, NovaObra, Sessao};
use crate::utils::logging::log_request_received;
use crate::utils::AppError;
use crate::AppState;

/// Imagem da planilha de etapas em base64
#[derive(Debug, Deserialize)]
pub struct ImportacaoImagem {
    pub content_type: String,
    pub imagem_base64: String,
}

pub async fn listar_obras(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/obras", "GET");

    let obras = state.obras.listar(&sessao).await;
    Ok(Json(json!({
        "count": obras.len(),
        "obras": obras
    })))
}

pub async fn buscar_obra(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/obras/:id", "GET");

    let obra = state.obras.buscar(&sessao, id).await?;
    Ok(Json(json!({ "obra": obra })))
}

pub async fn criar_obra(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
    Json(nova): Json<NovaObra>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/obras", "POST");

    let obra = state.obras.criar(&sessao, nova).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Obra criada com sucesso!",
        "obra": obra
    })))
}

pub async fn atualizar_obra(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
    Path(id): Path<Uuid>,
    Json(alteracao): Json<AtualizacaoObra>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/obras/:id", "PATCH");

    let obra = state.obras.atualizar(&sessao, id, alteracao).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Obra atualizada com sucesso!",
        "obra": obra
    })))
}

pub async fn listar_etapas(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
    Path(obra_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/obras/:id/etapas", "GET");

    let etapas = state.etapas.listar(&sessao, obra_id).await?;
    Ok(Json(json!({
        "count": etapas.len(),
        "etapas": etapas
    })))
}

pub async fn criar_etapa(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
    Path(obra_id): Path<Uuid>,
    Json(nova): Json<NovaEtapa>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/obras/:id/etapas", "POST");

    let etapa = state.etapas.criar(&sessao, obra_id, nova).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Etapa cadastrada com sucesso!",
        "etapa": etapa
    })))
}

pub async fn remover_etapa(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
    Path((obra_id, etapa_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/obras/:id/etapas/:etapa_id", "DELETE");

    state.etapas.remover(&sessao, obra_id, etapa_id).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Etapa removida com sucesso!"
    })))
}

pub async fn importar_etapas(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
    Path(obra_id): Path<Uuid>,
    Json(body): Json<ImportacaoImagem>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/obras/:id/etapas/importar", "POST");

    let imagem = STANDARD
        .decode(body.imagem_base64.trim())
        .map_err(|_| AppError::ValidationError("Conteúdo do arquivo inválido".to_string()))?;

    let resultado = state
        .etapas
        .importar_imagem(&sessao, obra_id, &imagem, &body.content_type)
        .await?;
    Ok(Json(json!({
        "status": "success",
        "message": resultado.mensagem,
        "inseridas": resultado.inseridas,
        "ignoradas": resultado.ignoradas
    })))
}
