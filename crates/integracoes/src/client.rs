//! Cliente HTTP compartilhado pelos webhooks (n8n e funções de relay)

use crate::error::{IntegracaoError, Result};
use reqwest::{Client as HttpClient, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Cliente para POSTs JSON nos webhooks externos
///
/// Cada webhook tem sua própria URL completa; o cliente só centraliza
/// timeouts e o tratamento de respostas de erro.
#[derive(Clone)]
pub struct WebhookClient {
    http_client: HttpClient,
}

impl WebhookClient {
    /// Cria um novo cliente
    ///
    /// # Timeouts
    ///
    /// - Total: 30s
    /// - Connect: 5s
    pub fn new() -> Result<Self> {
        Self::with_timeouts(30, 5)
    }

    /// Cria um novo cliente com timeouts customizados
    pub fn with_timeouts(total_timeout_secs: u64, connect_timeout_secs: u64) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(total_timeout_secs))
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .build()
            .map_err(|e| IntegracaoError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }

    /// Executa um POST com corpo JSON
    pub async fn post<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<Response> {
        tracing::debug!("POST {}", url);

        let response = self
            .http_client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        handle_response(response).await
    }

    /// Executa um POST e parseia a resposta como JSON
    pub async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.post(url, body).await?;
        let text = response.text().await?;
        let parsed = serde_json::from_str(&text)?;
        Ok(parsed)
    }

    /// Executa um POST e devolve o corpo como texto (webhooks n8n nem sempre respondem JSON)
    pub async fn post_text<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<String> {
        let response = self.post(url, body).await?;
        Ok(response.text().await?)
    }
}

/// Processa a resposta HTTP e converte status de erro em `ApiError`
async fn handle_response(response: Response) -> Result<Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let status_code = status.as_u16();
    let error_body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

    tracing::error!("Webhook error ({}): {}", status_code, error_body);

    Err(IntegracaoError::ApiError {
        status: status_code,
        message: extrair_mensagem_erro(&error_body),
    })
}

/// Tenta extrair `error`/`message` de um corpo JSON; senão usa o texto cru
fn extrair_mensagem_erro(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => json
            .get("error")
            .or_else(|| json.get("message"))
            .or_else(|| json.get("err"))
            .and_then(|v| v.as_str())
            .unwrap_or(body)
            .to_string(),
        Err(_) => body.to_string(),
    }
}
