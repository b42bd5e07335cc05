//! Cadastro de usuários (admin) e perfil do usuário logado

use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{ConclusaoPerfil, NovoUsuario, Sessao};
use crate::services::usuarios::AlteracaoAcesso;
use crate::utils::logging::log_request_received;
use crate::utils::AppError;
use crate::AppState;

pub async fn listar_usuarios(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/usuarios", "GET");

    let usuarios = state.usuarios.listar(&sessao).await?;
    Ok(Json(json!({
        "count": usuarios.len(),
        "usuarios": usuarios
    })))
}

pub async fn criar_usuario(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
    Json(novo): Json<NovoUsuario>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/usuarios", "POST");

    let usuario = state.usuarios.criar(&sessao, novo).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Usuário criado com sucesso!",
        "usuario": usuario
    })))
}

pub async fn alterar_acesso(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
    Path(id): Path<Uuid>,
    Json(alteracao): Json<AlteracaoAcesso>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/usuarios/:id", "PATCH");

    let usuario = state.usuarios.alterar_acesso(&sessao, id, alteracao).await?;
    Ok(Json(json!({
        "status": "success",
        "usuario": usuario
    })))
}

/// Perfil, papel e capacidades do usuário logado
pub async fn meu_perfil(Extension(sessao): Extension<Sessao>) -> Json<Value> {
    log_request_received("/perfil", "GET");

    Json(json!({
        "perfil": sessao.usuario.perfil,
        "papel": sessao.usuario.papel,
        "capacidades": sessao.capacidades
    }))
}

pub async fn concluir_perfil(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
    Json(dados): Json<ConclusaoPerfil>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/perfil", "PATCH");

    let perfil = state.usuarios.concluir_perfil(&sessao, dados).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Cadastro concluído!",
        "perfil": perfil
    })))
}
