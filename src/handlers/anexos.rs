use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::models::Sessao;
use crate::services::anexos::UploadArquivo;
use crate::utils::logging::log_request_received;
use crate::utils::AppError;
use crate::AppState;

pub async fn enviar_anexo(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
    Json(upload): Json<UploadArquivo>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/anexos", "POST");

    let arquivo = state.anexos.salvar(sessao.id(), &upload).await?;
    Ok(Json(json!({
        "status": "success",
        "arquivo": arquivo
    })))
}

/// Serve o arquivo pela URL pública gerada no upload
pub async fn servir_arquivo(
    State(state): State<Arc<AppState>>,
    Path(caminho): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (conteudo, content_type) = state.anexos.ler(&caminho).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], conteudo))
}
