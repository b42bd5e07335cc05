//! Extração de etapas de obra a partir de imagem (serviço de IA)

use crate::client::WebhookClient;
use crate::error::{IntegracaoError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Par código/nome devolvido pela extração
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EtapaExtraida {
    pub codigo: String,
    pub nome: String,
}

#[derive(Clone)]
pub struct ExtracaoEtapasClient {
    client: WebhookClient,
    url: Option<String>,
}

impl ExtracaoEtapasClient {
    pub fn new(client: WebhookClient, url: Option<String>) -> Self {
        Self {
            client,
            url: url.filter(|u| !u.trim().is_empty()),
        }
    }

    /// Envia a imagem como data URL base64 e devolve as etapas encontradas
    pub async fn extrair(&self, imagem: &[u8], content_type: &str) -> Result<Vec<EtapaExtraida>> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| IntegracaoError::ConfigError("Serviço de extração de etapas não configurado".to_string()))?;

        let data_url = format!("data:{};base64,{}", content_type, STANDARD.encode(imagem));
        let resposta: Value = self
            .client
            .post_json(url, &json!({ "imageBase64": data_url }))
            .await?;

        parse_etapas(resposta)
    }
}

/// Aceita `{"etapas": [...]}`, lista pura ou `{"error": "..."}`
fn parse_etapas(resposta: Value) -> Result<Vec<EtapaExtraida>> {
    if let Some(erro) = resposta.get("error").and_then(|e| e.as_str()) {
        return Err(IntegracaoError::RespostaInvalida(erro.to_string()));
    }

    let lista = match resposta {
        Value::Array(_) => resposta,
        Value::Object(mut map) => map.remove("etapas").unwrap_or(Value::Array(vec![])),
        _ => return Err(IntegracaoError::RespostaInvalida("formato de etapas desconhecido".to_string())),
    };

    let etapas: Vec<EtapaExtraida> = serde_json::from_value(lista)?;

    Ok(etapas
        .into_iter()
        .map(|e| EtapaExtraida {
            codigo: e.codigo.trim().to_string(),
            nome: e.nome.trim().to_string(),
        })
        .filter(|e| !e.codigo.is_empty() && !e.nome.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn test_parse_etapas_formatos() {
        let etapas = parse_etapas(json!({ "etapas": [{ "codigo": " 01 ", "nome": "Fundação" }] })).unwrap();
        assert_eq!(etapas, vec![EtapaExtraida { codigo: "01".into(), nome: "Fundação".into() }]);

        let etapas = parse_etapas(json!([{ "codigo": "02", "nome": "Estrutura" }, { "codigo": "", "nome": "x" }])).unwrap();
        assert_eq!(etapas.len(), 1);

        assert!(parse_etapas(json!({ "error": "Imagem ilegível" })).is_err());
        assert!(parse_etapas(json!({})).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_extrair_envia_data_url() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/functions/v1/extract-etapas")
                    .json_body(json!({ "imageBase64": "data:image/png;base64,AQID" }));
                then.status(200)
                    .json_body(json!({ "etapas": [{ "codigo": "03", "nome": "Alvenaria" }] }));
            })
            .await;

        let client = ExtracaoEtapasClient::new(
            WebhookClient::new().unwrap(),
            Some(server.url("/functions/v1/extract-etapas")),
        );
        let etapas = client.extrair(&[1, 2, 3], "image/png").await.unwrap();

        assert_eq!(etapas[0].codigo, "03");
        mock.assert_async().await;
    }
}
