//! Endpoints de títulos: leituras (com filtro/paginação) e transições

use axum::{
    extract::{Path, Query, State},
    response::Json,
    Extension,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{NovoTitulo, Sessao, TipoDocumentoFiscal, Titulo, TituloStatus};
use crate::services::anexos::UploadArquivo;
use crate::services::filtros::FiltroTitulos;
use crate::services::fluxo_titulos::ResultadoOperacao;
use crate::utils::logging::log_request_received;
use crate::utils::{AppError, AppResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PorObra {
    pub obra_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AprovarBody {
    pub id_sienge: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ReprovarBody {
    #[serde(default)]
    pub motivo: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PagarBody {
    pub obs: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReplicarBody {
    pub data_vencimento: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct DocumentoSiengeBody {
    pub tipo_documento: TipoDocumentoFiscal,
    pub numero_documento: String,
}

fn exigir_obra(sessao: &Sessao, obra_id: Option<Uuid>) -> AppResult<()> {
    match obra_id {
        Some(id) if !sessao.capacidades.acessa_obra(id) => Err(AppError::Forbidden),
        _ => Ok(()),
    }
}

/// Equipe de obra só enxerga títulos das obras vinculadas
fn visiveis(sessao: &Sessao, titulos: Vec<Titulo>) -> Vec<Titulo> {
    if sessao.capacidades.ver_todas_obras {
        return titulos;
    }
    titulos
        .into_iter()
        .filter(|t| sessao.capacidades.acessa_obra(t.obra_id))
        .collect()
}

fn pagina_json(sessao: &Sessao, filtro: &FiltroTitulos, titulos: Vec<Titulo>) -> Json<Value> {
    let pagina = filtro.aplicar(visiveis(sessao, titulos));
    Json(json!({
        "titulos": pagina.itens,
        "total": pagina.total,
        "pagina": pagina.pagina,
        "por_pagina": pagina.por_pagina,
        "total_paginas": pagina.total_paginas,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub async fn listar_pendentes(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
    Query(filtro): Query<FiltroTitulos>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/titulos/pendentes", "GET");
    exigir_obra(&sessao, filtro.obra_id)?;

    let titulos = state.consulta.pendentes(filtro.obra_id).await;
    Ok(pagina_json(&sessao, &filtro, titulos))
}

pub async fn listar_finalizados(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
    Query(filtro): Query<FiltroTitulos>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/titulos/finalizados", "GET");
    exigir_obra(&sessao, filtro.obra_id)?;

    let titulos = state.consulta.finalizados(filtro.obra_id).await;
    Ok(pagina_json(&sessao, &filtro, titulos))
}

pub async fn listar_combinados(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
    Query(filtro): Query<FiltroTitulos>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/titulos", "GET");
    exigir_obra(&sessao, filtro.obra_id)?;

    let titulos = state.consulta.combinados(filtro.obra_id).await;
    Ok(pagina_json(&sessao, &filtro, titulos))
}

pub async fn listar_por_status(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
    Path(status): Path<String>,
    Query(por_obra): Query<PorObra>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/titulos/status/:status", "GET");
    let status = TituloStatus::parse(&status)
        .ok_or_else(|| AppError::ValidationError(format!("Status inválido: {}", status)))?;
    exigir_obra(&sessao, por_obra.obra_id)?;

    let titulos = visiveis(&sessao, state.consulta.por_status(status, por_obra.obra_id).await);
    Ok(Json(json!({
        "status": status,
        "colecao": status.colecao().tabela(),
        "count": titulos.len(),
        "titulos": titulos
    })))
}

pub async fn estatisticas(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
    Query(por_obra): Query<PorObra>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/titulos/estatisticas", "GET");
    exigir_obra(&sessao, por_obra.obra_id)?;

    // Sem obra escolhida, a equipe de obra vê só o agregado das suas
    let stats = if sessao.capacidades.ver_todas_obras || por_obra.obra_id.is_some() {
        state.consulta.estatisticas(por_obra.obra_id).await
    } else {
        let titulos = visiveis(&sessao, state.consulta.combinados(None).await);
        crate::models::DashboardStats::calcular(&titulos)
    };

    Ok(Json(json!({
        "estatisticas": stats,
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

pub async fn buscar(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/titulos/:id", "GET");

    let titulo = state
        .consulta
        .buscar(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Título não encontrado: {}", id)))?;
    exigir_obra(&sessao, Some(titulo.obra_id))?;

    Ok(Json(json!({ "titulo": titulo })))
}

pub async fn criar(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
    Json(novo): Json<NovoTitulo>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/titulos", "POST");

    let titulo = state.fluxo.criar(&sessao, novo).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Título enviado com sucesso!",
        "titulo": titulo
    })))
}

/// Operações com sistema externo: "partial" quando só o lado externo gravou
fn resultado_json(resultado: ResultadoOperacao) -> Json<Value> {
    Json(json!({
        "status": if resultado.sincronizado_localmente { "success" } else { "partial" },
        "message": resultado.mensagem,
        "sincronizado_localmente": resultado.sincronizado_localmente,
        "titulo": resultado.titulo
    }))
}

fn transicao_json(titulo: Titulo) -> Json<Value> {
    Json(json!({
        "status": "success",
        "message": titulo.status.mensagem_sucesso(),
        "titulo": titulo
    }))
}

pub async fn aprovar(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
    Path(id): Path<Uuid>,
    body: Option<Json<AprovarBody>>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/titulos/:id/aprovar", "POST");
    let Json(body) = body.unwrap_or_default();

    let resultado = state.fluxo.aprovar(&sessao, id, body.id_sienge).await?;
    Ok(resultado_json(resultado))
}

pub async fn reprovar(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
    Path(id): Path<Uuid>,
    Json(body): Json<ReprovarBody>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/titulos/:id/reprovar", "POST");

    let titulo = state.fluxo.reprovar(&sessao, id, &body.motivo).await?;
    Ok(transicao_json(titulo))
}

pub async fn pagar(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
    Path(id): Path<Uuid>,
    body: Option<Json<PagarBody>>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/titulos/:id/pagar", "POST");
    let Json(body) = body.unwrap_or_default();

    let titulo = state.fluxo.pagar(&sessao, id, body.obs).await?;
    Ok(transicao_json(titulo))
}

pub async fn pagamento_asaas(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/titulos/:id/pagamento-asaas", "POST");

    let resultado = state.fluxo.iniciar_pagamento_asaas(&sessao, id).await?;
    Ok(resultado_json(resultado))
}

pub async fn reenviar(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/titulos/:id/reenviar", "POST");

    let titulo = state.fluxo.reenviar(&sessao, id).await?;
    Ok(transicao_json(titulo))
}

pub async fn replicar(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
    Path(id): Path<Uuid>,
    body: Option<Json<ReplicarBody>>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/titulos/:id/replicar", "POST");
    let Json(body) = body.unwrap_or_default();

    let titulo = state.fluxo.replicar(&sessao, id, body.data_vencimento).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Título replicado com sucesso!",
        "titulo": titulo
    })))
}

pub async fn documento_sienge(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
    Path(id): Path<Uuid>,
    Json(body): Json<DocumentoSiengeBody>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/titulos/:id/documento-sienge", "POST");

    let resultado = state
        .fluxo
        .atualizar_documento_sienge(&sessao, id, body.tipo_documento, &body.numero_documento)
        .await?;
    Ok(resultado_json(resultado))
}

pub async fn enviar_comprovante(
    State(state): State<Arc<AppState>>,
    Extension(sessao): Extension<Sessao>,
    Path(id): Path<Uuid>,
    Json(upload): Json<UploadArquivo>,
) -> Result<Json<Value>, AppError> {
    log_request_received("/titulos/:id/comprovante", "POST");

    let titulo = state
        .consulta
        .buscar(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Título não encontrado: {}", id)))?;
    exigir_obra(&sessao, Some(titulo.obra_id))?;

    let arquivo = state.anexos.enviar_comprovante(&sessao, &titulo, &upload).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Comprovante enviado com sucesso!",
        "arquivo": arquivo
    })))
}
