use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{anexos, credores, health, obras, realtime, titulos, usuarios};
use crate::config::Settings;
use crate::middleware::{require_admin_key, require_sessao};
use crate::services::etapas::MAX_IMAGEM_BYTES;
use crate::AppState;

/// Limite do corpo JSON nas rotas de upload
///
/// Arquivos chegam em base64 (4 bytes para cada 3). O teto é o dobro do
/// tamanho máximo aceito, para que arquivos um pouco acima do limite cheguem
/// ao handler e recebam a mensagem de validação em vez de um 413.
pub fn limite_corpo_upload(settings: &Settings) -> usize {
    let maximo = settings.armazenamento.max_bytes.max(MAX_IMAGEM_BYTES);
    (maximo * 2).div_ceil(3) * 4 + 64 * 1024
}

pub fn build_router(state: Arc<AppState>) -> Router {
    // Health checks e arquivos públicos
    let publicas = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/status", get(health::status_check))
        .route("/arquivos/*caminho", get(anexos::servir_arquivo));

    // Rotas do usuário logado (X-User-Id)
    let protegidas = Router::new()
        .route("/titulos", get(titulos::listar_combinados).post(titulos::criar))
        .route("/titulos/pendentes", get(titulos::listar_pendentes))
        .route("/titulos/finalizados", get(titulos::listar_finalizados))
        .route("/titulos/estatisticas", get(titulos::estatisticas))
        .route("/titulos/status/:status", get(titulos::listar_por_status))
        .route("/titulos/:id", get(titulos::buscar))
        .route("/titulos/:id/aprovar", post(titulos::aprovar))
        .route("/titulos/:id/reprovar", post(titulos::reprovar))
        .route("/titulos/:id/pagar", post(titulos::pagar))
        .route("/titulos/:id/pagamento-asaas", post(titulos::pagamento_asaas))
        .route("/titulos/:id/reenviar", post(titulos::reenviar))
        .route("/titulos/:id/replicar", post(titulos::replicar))
        .route("/titulos/:id/documento-sienge", post(titulos::documento_sienge))
        .route("/obras", get(obras::listar_obras).post(obras::criar_obra))
        .route("/obras/:id", get(obras::buscar_obra).patch(obras::atualizar_obra))
        .route("/obras/:id/etapas", get(obras::listar_etapas).post(obras::criar_etapa))
        .route("/obras/:id/etapas/:etapa_id", delete(obras::remover_etapa))
        .route("/credores", get(credores::buscar_credores))
        .route("/credores/:creditor_id", get(credores::buscar_credor))
        .route("/usuarios", get(usuarios::listar_usuarios).post(usuarios::criar_usuario))
        .route("/usuarios/:id", patch(usuarios::alterar_acesso))
        .route("/perfil", get(usuarios::meu_perfil).patch(usuarios::concluir_perfil))
        .route("/realtime", get(realtime::stream_alteracoes))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_sessao));

    // Uploads em base64 passam do limite padrão de 2MB do axum
    let uploads = Router::new()
        .route("/anexos", post(anexos::enviar_anexo))
        .route("/titulos/:id/comprovante", post(titulos::enviar_comprovante))
        .route("/obras/:id/etapas/importar", post(obras::importar_etapas))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_sessao))
        .layer(DefaultBodyLimit::max(limite_corpo_upload(&state.settings)));

    // ✅ Rotas administrativas protegidas com API key
    let admin = Router::new()
        .route("/admin/credores/sync", post(credores::sincronizar_credores))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin_key));

    Router::new()
        .merge(publicas)
        .merge(protegidas)
        .merge(uploads)
        .merge(admin)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
