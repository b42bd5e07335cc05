//! Integração com o Sienge (ERP) via webhooks n8n
//!
//! - Lançamento do título aprovado: devolve o `id_sienge` emitido pelo ERP
//! - Atualização de tipo/número do documento de um título já lançado

use crate::client::WebhookClient;
use crate::error::{IntegracaoError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Dados do título enviados ao Sienge no lançamento
///
/// O webhook espera tudo dentro de `record`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LancamentoTitulo {
    pub id: String,
    pub empresa: String,
    pub credor: String,
    pub credor_id: Option<i64>,
    pub documento_tipo: String,
    pub documento_numero: String,
    pub obra_codigo: String,
    pub centro_custo: String,
    pub etapa: String,
    pub codigo_etapa: Option<String>,
    pub valor_total: f64,
    pub descontos: f64,
    pub parcelas: u32,
    pub tipo_documento: String,
    pub numero_documento: String,
    pub data_emissao: NaiveDate,
    pub data_vencimento: NaiveDate,
    pub plano_financeiro: String,
    pub dados_bancarios: Option<String>,
    pub documento_url: Option<String>,
    pub descricao: Option<String>,
    pub rateio_financeiro: Value,
    pub aprop_obra: Value,
}

#[derive(Serialize)]
struct EnvelopeLancamento<'a> {
    record: &'a LancamentoTitulo,
}

/// Alteração de documento de um título já lançado
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AtualizacaoDocumento {
    pub id_sienge: i64,
    #[serde(rename = "documentIdentificationId")]
    pub document_identification_id: String,
    #[serde(rename = "documentNumber")]
    pub document_number: String,
}

/// Cliente dos webhooks do Sienge
#[derive(Clone)]
pub struct SiengeClient {
    client: WebhookClient,
    url_lancamento: Option<String>,
    url_atualizacao: Option<String>,
}

impl SiengeClient {
    pub fn new(
        client: WebhookClient,
        url_lancamento: Option<String>,
        url_atualizacao: Option<String>,
    ) -> Self {
        Self {
            client,
            url_lancamento: url_lancamento.filter(|u| !u.trim().is_empty()),
            url_atualizacao: url_atualizacao.filter(|u| !u.trim().is_empty()),
        }
    }

    /// Indica se o lançamento automático está configurado
    pub fn lancamento_habilitado(&self) -> bool {
        self.url_lancamento.is_some()
    }

    /// Lança o título no Sienge e devolve o id emitido
    ///
    /// Retorna `Ok(None)` quando o webhook responde 2xx sem id reconhecível.
    pub async fn lancar_titulo(&self, titulo: &LancamentoTitulo) -> Result<Option<i64>> {
        let url = self
            .url_lancamento
            .as_deref()
            .ok_or_else(|| IntegracaoError::ConfigError("Webhook de lançamento do Sienge não configurado".to_string()))?;

        tracing::info!("📤 Lançando título {} no Sienge", titulo.id);

        let body = self
            .client
            .post_text(url, &EnvelopeLancamento { record: titulo })
            .await?;

        let id = serde_json::from_str::<Value>(&body)
            .ok()
            .as_ref()
            .and_then(extrair_id_sienge);

        match id {
            Some(id) => tracing::info!("✅ Título {} lançado no Sienge com id {}", titulo.id, id),
            None => tracing::warn!("⚠️ Sienge não devolveu id para o título {}: {}", titulo.id, body),
        }

        Ok(id)
    }

    /// Atualiza tipo e número do documento no Sienge
    pub async fn atualizar_documento(&self, atualizacao: &AtualizacaoDocumento) -> Result<()> {
        let url = self
            .url_atualizacao
            .as_deref()
            .ok_or_else(|| IntegracaoError::ConfigError("Webhook de atualização do Sienge não configurado".to_string()))?;

        self.client.post_text(url, atualizacao).await?;
        Ok(())
    }
}

/// Procura o id emitido pelo Sienge na resposta do webhook
///
/// Aceita objeto (`id_sienge`, `idSienge`, `id`), lista com o primeiro
/// elemento nesse formato, número puro ou string numérica.
pub fn extrair_id_sienge(resposta: &Value) -> Option<i64> {
    match resposta {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Array(items) => items.first().and_then(extrair_id_sienge),
        Value::Object(map) => ["id_sienge", "idSienge", "id"]
            .iter()
            .filter_map(|chave| map.get(*chave))
            .find_map(|v| match v {
                Value::Number(_) | Value::String(_) => extrair_id_sienge(v),
                _ => None,
            })
            .or_else(|| map.get("body").and_then(extrair_id_sienge)),
        _ => None,
    }
}
