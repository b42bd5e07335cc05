use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::models::TituloStatus;
use crate::utils::formatacao::formatar_moeda;

pub fn log_request_received(endpoint: &str, method: &str) {
    info!("Request received: {} {}", method, endpoint);
}

pub fn log_titulo_criado(id: Uuid, credor: &str, obra_codigo: &str, valor: f64) {
    info!(
        "📄 Título criado: {} - Credor: {} - Obra: {} - {}",
        id,
        credor,
        obra_codigo,
        formatar_moeda(valor)
    );
}

pub fn log_transicao(id: Uuid, de: TituloStatus, para: TituloStatus, usuario: Uuid) {
    info!("🔁 Título {}: {} → {} (usuário {})", id, de, para, usuario);
}

pub fn log_integracao_error(integracao: &str, status: Option<u16>, error: &str) {
    error!("Integration error: {} - Status: {:?} - Error: {}", integracao, status, error);
}

pub fn log_cache_invalidado(tag: &str, removidos: usize) {
    debug!("Cache invalidado: {} ({} entradas)", tag, removidos);
}

pub fn log_config_loaded(env: &str) {
    info!("Configuration loaded successfully for environment: {}", env);
}

pub fn log_server_startup(port: u16) {
    info!("🚀 Grifo títulos server starting on port {}", port);
}

pub fn log_server_ready(port: u16) {
    info!("✅ Server ready and listening on http://0.0.0.0:{}", port);
}

pub fn log_health_check() {
    debug!("Health check requested");
}

pub fn log_validation_error(field: &str, message: &str) {
    warn!("Validation error: {} - {}", field, message);
}

pub fn log_info(message: &str) {
    info!("{}", message);
}

pub fn log_error(message: &str) {
    error!("{}", message);
}

pub fn log_warning(message: &str) {
    warn!("{}", message);
}
