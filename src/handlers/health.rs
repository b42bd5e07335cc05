use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::utils::logging::*;
use crate::AppState;

const SERVICE: &str = "grifo-titulos";

pub async fn health_check() -> Json<Value> {
    log_health_check();

    Json(json!({
        "status": "healthy",
        "service": SERVICE,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Pronto quando a invalidação por feed está ativa
pub async fn ready_check(State(state): State<Arc<AppState>>) -> Result<Json<Value>, StatusCode> {
    log_health_check();

    let realtime_ativo = state.realtime.ativa();
    if !realtime_ativo {
        log_warning("⚠️ Assinatura do feed de alterações encerrada");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(Json(json!({
        "ready": true,
        "service": SERVICE,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "dependencies": {
            "realtime": { "status": "subscribed", "assinantes": state.db.feed().assinantes() }
        }
    })))
}

pub async fn status_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    log_health_check();

    let (pendentes, finalizados) = state.db.contar_titulos().await;
    let cache = state.consulta.cache().stats().await;
    let integracoes = &state.settings.integracoes;

    Json(json!({
        "service": SERVICE,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": state.settings.server.ambiente,
        "titulos": {
            "titulos_pendentes": pendentes,
            "titulos": finalizados
        },
        "credores": state.db.contar_credores().await,
        "cache": cache,
        "realtime": {
            "ativo": state.realtime.ativa(),
            "assinantes": state.db.feed().assinantes()
        },
        "integrations": {
            "sienge_lancamento": integracoes.sienge_lancamento_url.is_some(),
            "sienge_atualizacao": integracoes.sienge_atualizacao_url.is_some(),
            "asaas": integracoes.asaas_pagamento_url.is_some(),
            "extracao_etapas": integracoes.extracao_etapas_url.is_some(),
            "comprovantes": integracoes.comprovante_url.is_some()
        }
    }))
}
