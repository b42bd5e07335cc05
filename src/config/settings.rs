use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub integracoes: IntegracoesSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub armazenamento: ArmazenamentoSettings,
    #[serde(default)]
    pub admin: AdminSettings,
    #[serde(default)]
    pub realtime: RealtimeSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// `development` ou `production`
    pub ambiente: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            ambiente: "development".to_string(),
        }
    }
}

impl ServerSettings {
    pub fn is_production(&self) -> bool {
        self.ambiente.eq_ignore_ascii_case("production")
    }
}

/// URLs dos webhooks externos; ausente = integração desabilitada
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct IntegracoesSettings {
    pub sienge_lancamento_url: Option<String>,
    pub sienge_atualizacao_url: Option<String>,
    pub asaas_pagamento_url: Option<String>,
    pub extracao_etapas_url: Option<String>,
    pub comprovante_url: Option<String>,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for IntegracoesSettings {
    fn default() -> Self {
        Self {
            sienge_lancamento_url: None,
            sienge_atualizacao_url: None,
            asaas_pagamento_url: None,
            extracao_etapas_url: None,
            comprovante_url: None,
            timeout_secs: 30,
            connect_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CacheSettings {
    pub titulos_ttl_secs: u64,
    pub credores_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            titulos_ttl_secs: 300,
            credores_ttl_secs: 1800,
        }
    }
}

impl CacheSettings {
    pub fn titulos_ttl(&self) -> Duration {
        Duration::from_secs(self.titulos_ttl_secs)
    }

    pub fn credores_ttl(&self) -> Duration {
        Duration::from_secs(self.credores_ttl_secs)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ArmazenamentoSettings {
    pub diretorio: String,
    pub url_publica_base: String,
    pub max_bytes: usize,
}

impl Default for ArmazenamentoSettings {
    fn default() -> Self {
        Self {
            diretorio: "data/anexos".to_string(),
            url_publica_base: "http://localhost:8080/arquivos".to_string(),
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AdminSettings {
    /// Chave exigida no header X-Admin-Key
    pub api_key: Option<String>,
    /// Administrador criado na subida se o email ainda não existir
    pub email_inicial: Option<String>,
    pub nome_inicial: String,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            email_inicial: None,
            nome_inicial: "Administrador".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct RealtimeSettings {
    pub capacidade_feed: usize,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self { capacidade_feed: 256 }
    }
}

/// Variáveis de ambiente avulsas aceitas além do prefixo GRIFO__
const OVERRIDES: [(&str, &str); 8] = [
    ("SIENGE_WEBHOOK_URL", "integracoes.sienge_lancamento_url"),
    ("SIENGE_UPDATE_WEBHOOK_URL", "integracoes.sienge_atualizacao_url"),
    ("ASAAS_WEBHOOK_URL", "integracoes.asaas_pagamento_url"),
    ("EXTRACAO_ETAPAS_WEBHOOK_URL", "integracoes.extracao_etapas_url"),
    ("COMPROVANTE_WEBHOOK_URL", "integracoes.comprovante_url"),
    ("ADMIN_API_KEY", "admin.api_key"),
    ("ADMIN_EMAIL", "admin.email_inicial"),
    ("RUST_ENV", "server.ambiente"),
];

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            // Arquivo de configuração base
            .add_source(File::with_name("config/default").required(false))
            // Arquivo específico do ambiente
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(
                Environment::with_prefix("GRIFO")
                    .separator("__")
                    .try_parsing(true),
            );

        for (variavel, chave) in OVERRIDES {
            if let Ok(valor) = std::env::var(variavel) {
                if !valor.trim().is_empty() {
                    builder = builder.set_override(chave, valor)?;
                }
            }
        }

        // Cloud Run injeta PORT
        if let Ok(port) = std::env::var("PORT") {
            builder = builder.set_override("server.port", port)?;
        }

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_sem_arquivos() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert!(!settings.server.is_production());
        assert_eq!(settings.cache.titulos_ttl(), Duration::from_secs(300));
        assert_eq!(settings.cache.credores_ttl(), Duration::from_secs(1800));
        assert_eq!(settings.armazenamento.max_bytes, 10 * 1024 * 1024);
        assert!(settings.integracoes.sienge_lancamento_url.is_none());
    }

    #[test]
    fn test_secao_parcial_usa_defaults() {
        let settings: Settings = Config::builder()
            .add_source(config::File::from_str(
                "[server]\nport = 9000\n\n[integracoes]\nasaas_pagamento_url = \"https://n8n.test/asaas\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.integracoes.asaas_pagamento_url.as_deref(), Some("https://n8n.test/asaas"));
        assert_eq!(settings.integracoes.timeout_secs, 30);
    }
}
