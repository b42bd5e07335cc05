//! Tipos de erro para o crate integracoes

use thiserror::Error;

/// Erros ao chamar os webhooks externos
#[derive(Debug, Error)]
pub enum IntegracaoError {
    /// Erro de requisição HTTP (rede, timeout, TLS)
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// O webhook respondeu com status não-2xx
    #[error("Webhook error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Erro de parsing JSON
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Resposta 2xx mas sem o conteúdo esperado
    #[error("Resposta inesperada: {0}")]
    RespostaInvalida(String),

    /// Webhook não configurado
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl IntegracaoError {
    /// Status HTTP devolvido pelo webhook, quando houver
    pub fn status(&self) -> Option<u16> {
        match self {
            IntegracaoError::ApiError { status, .. } => Some(*status),
            IntegracaoError::HttpError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Tipo Result padrão para o crate
pub type Result<T> = std::result::Result<T, IntegracaoError>;
