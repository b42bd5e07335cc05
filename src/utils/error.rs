use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use integracoes::IntegracaoError;
use serde_json::json;
use std::fmt;

use crate::store::StoreError;

/// Código de violação de unicidade devolvido pelo store
pub const CODIGO_DUPLICADO: &str = "23505";

#[derive(Debug)]
pub enum AppError {
    /// Campo obrigatório, soma de rateio, tipo/tamanho de arquivo
    ValidationError(String),
    NotFound(String),
    /// Violação de unicidade já traduzida para o usuário
    Conflict(String),
    /// Título fora do status/coleção esperados para a operação
    TransicaoInvalida(String),
    Unauthorized,
    /// Papel sem permissão; o cliente redireciona sem exibir erro
    Forbidden,
    /// Falha em webhook externo
    Integracao { contexto: String, erro: IntegracaoError },
    ConfigError(String),
    JsonError(serde_json::Error),
    HttpError(reqwest::Error),
    InternalError(String),
}

impl AppError {
    pub fn integracao(contexto: impl Into<String>, erro: IntegracaoError) -> Self {
        AppError::Integracao {
            contexto: contexto.into(),
            erro,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ValidationError(msg) => write!(f, "{}", msg),
            AppError::NotFound(msg) => write!(f, "{}", msg),
            AppError::Conflict(msg) => write!(f, "{}", msg),
            AppError::TransicaoInvalida(msg) => write!(f, "{}", msg),
            AppError::Unauthorized => write!(f, "Não autorizado"),
            AppError::Forbidden => write!(f, "Acesso negado"),
            AppError::Integracao { contexto, erro } => {
                write!(f, "{}. Tente novamente. {}", contexto, erro)
            }
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::JsonError(err) => write!(f, "JSON error: {}", err),
            AppError::HttpError(err) => write!(f, "HTTP error: {}", err),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::JsonError(err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::HttpError(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        if err.codigo() == Some(CODIGO_DUPLICADO) {
            let mensagem = match &err {
                StoreError::Duplicado { tabela, .. } if *tabela == "obra_etapas" => {
                    "Código de etapa já existe nesta obra".to_string()
                }
                StoreError::Duplicado { tabela, .. } if *tabela == "obras" => {
                    "Já existe uma obra com este código".to_string()
                }
                StoreError::Duplicado { tabela, .. } if *tabela == "profiles" => {
                    "Já existe um usuário com este email".to_string()
                }
                outro => outro.to_string(),
            };
            return AppError::Conflict(mensagem);
        }

        match err {
            StoreError::NaoEncontrado { .. } => AppError::NotFound(err.to_string()),
            StoreError::ForaDaColecao { .. } => AppError::TransicaoInvalida(err.to_string()),
            StoreError::Duplicado { .. } => AppError::Conflict(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::TransicaoInvalida(_) => StatusCode::CONFLICT,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => return StatusCode::FORBIDDEN.into_response(),
            AppError::Integracao { .. } | AppError::HttpError(_) => StatusCode::BAD_GATEWAY,
            AppError::JsonError(_) => StatusCode::BAD_REQUEST,
            AppError::ConfigError(_) | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = json!({
            "error": self.to_string(),
            "status": status.as_u16()
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
