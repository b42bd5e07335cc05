//! Ordem de pagamento automática no Asaas (relay via n8n)

use crate::client::WebhookClient;
use crate::error::{IntegracaoError, Result};
use serde::{Deserialize, Serialize};

/// Payload da ordem de pagamento
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrdemPagamento {
    pub id: String,
    pub id_sienge: Option<i64>,
    pub valor_total: f64,
    pub dados_bancarios: Option<String>,
    pub credor: String,
    pub obra_codigo: String,
    pub descricao: Option<String>,
}

/// Resposta do relay: status devolvido pelo processador e corpo cru
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RespostaPagamento {
    pub status: u16,
    pub body: String,
}

#[derive(Clone)]
pub struct AsaasClient {
    client: WebhookClient,
    url: Option<String>,
}

impl AsaasClient {
    pub fn new(client: WebhookClient, url: Option<String>) -> Self {
        Self {
            client,
            url: url.filter(|u| !u.trim().is_empty()),
        }
    }

    pub fn habilitado(&self) -> bool {
        self.url.is_some()
    }

    /// Dispara a ordem de pagamento; qualquer status não-2xx vira erro
    pub async fn iniciar_pagamento(&self, ordem: &OrdemPagamento) -> Result<RespostaPagamento> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| IntegracaoError::ConfigError("Webhook do Asaas não configurado".to_string()))?;

        tracing::info!(
            "💸 Enviando ordem de pagamento ao Asaas: título {} (R$ {:.2})",
            ordem.id,
            ordem.valor_total
        );

        let response = self.client.post(url, ordem).await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(RespostaPagamento { status, body })
    }
}
