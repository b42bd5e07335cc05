//! Notificação de importação de comprovante de pagamento

use crate::client::WebhookClient;
use crate::error::{IntegracaoError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NotificacaoComprovante {
    pub titulo_id: String,
    pub caminho: String,
    pub url_publica: String,
    pub enviado_por: String,
    pub enviado_em: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ComprovanteNotifier {
    client: WebhookClient,
    url: Option<String>,
}

impl ComprovanteNotifier {
    pub fn new(client: WebhookClient, url: Option<String>) -> Self {
        Self {
            client,
            url: url.filter(|u| !u.trim().is_empty()),
        }
    }

    pub async fn notificar(&self, notificacao: &NotificacaoComprovante) -> Result<()> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| IntegracaoError::ConfigError("Webhook de comprovantes não configurado".to_string()))?;

        self.client.post_text(url, notificacao).await?;
        Ok(())
    }

    /// Dispara a notificação em background; falhas só vão para o log
    pub fn notificar_em_background(&self, notificacao: NotificacaoComprovante) {
        if self.url.is_none() {
            tracing::debug!("Webhook de comprovantes não configurado, notificação ignorada");
            return;
        }

        let notifier = self.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.notificar(&notificacao).await {
                tracing::warn!(
                    "⚠️ Falha ao notificar importação do comprovante do título {}: {}",
                    notificacao.titulo_id,
                    e
                );
            }
        });
    }
}
