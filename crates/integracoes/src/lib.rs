//! Clientes dos webhooks externos usados pelo fluxo de títulos
//!
//! Todos os endpoints são POST JSON sobre HTTPS, em geral workflows n8n
//! que repassam para o sistema de destino:
//!
//! - **Sienge**: lançamento do título aprovado (devolve `id_sienge`) e
//!   atualização de tipo/número do documento
//! - **Asaas**: ordem de pagamento automática
//! - **Extração de etapas**: imagem de uma lista de etapas → pares código/nome
//! - **Comprovantes**: aviso de importação de comprovante (fire-and-forget)
//!
//! # Exemplo Básico
//!
//! ```rust,ignore
//! use integracoes::{WebhookClient, sienge::SiengeClient};
//!
//! let client = WebhookClient::new()?;
//! let sienge = SiengeClient::new(client, Some(url_lancamento), None);
//! let id_sienge = sienge.lancar_titulo(&lancamento).await?;
//! ```

pub mod asaas;
pub mod client;
pub mod comprovantes;
pub mod error;
pub mod extracao;
pub mod sienge;

pub use client::WebhookClient;
pub use error::{IntegracaoError, Result};
