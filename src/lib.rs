// Serviço de aprovação e pagamento de títulos da Grifo
// Expõe módulos para uso em testes e no binário

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod router;
pub mod services;
pub mod store;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

use integracoes::asaas::AsaasClient;
use integracoes::comprovantes::ComprovanteNotifier;
use integracoes::extracao::ExtracaoEtapasClient;
use integracoes::sienge::SiengeClient;
use integracoes::WebhookClient;
use std::sync::Arc;

use services::{
    AnexosService, ChangeFeed, ConsultaTitulos, CredorDirectory, EtapasService, FluxoTitulos, ObrasService,
    ReadCache, RealtimeHandle, RealtimeSync, UsuariosService,
};
use store::Database;
use utils::{AppError, AppResult};

pub use router::build_router;

// AppState é definido aqui para ser compartilhado entre handlers e testes
pub struct AppState {
    pub settings: config::Settings,
    pub db: Arc<Database>,
    pub consulta: ConsultaTitulos,
    pub fluxo: FluxoTitulos,
    pub credores: CredorDirectory,
    pub etapas: EtapasService,
    pub anexos: AnexosService,
    pub usuarios: UsuariosService,
    pub obras: ObrasService,
    /// Mantém a invalidação por feed viva enquanto o estado existir
    pub realtime: RealtimeHandle,
}

impl AppState {
    /// Monta store, clientes externos e serviços; precisa de um runtime tokio
    pub fn new(settings: config::Settings) -> AppResult<Self> {
        let integracoes = &settings.integracoes;
        let client = WebhookClient::with_timeouts(integracoes.timeout_secs, integracoes.connect_timeout_secs)
            .map_err(|e| AppError::ConfigError(format!("Failed to create webhook client: {}", e)))?;

        let db = Arc::new(Database::new(ChangeFeed::new(settings.realtime.capacidade_feed)));
        let cache = ReadCache::new(settings.cache.titulos_ttl());
        let realtime = RealtimeSync::assinar(db.feed(), cache.clone());
        let consulta = ConsultaTitulos::new(db.clone(), cache);

        let fluxo = FluxoTitulos::new(
            db.clone(),
            consulta.clone(),
            SiengeClient::new(
                client.clone(),
                integracoes.sienge_lancamento_url.clone(),
                integracoes.sienge_atualizacao_url.clone(),
            ),
            AsaasClient::new(client.clone(), integracoes.asaas_pagamento_url.clone()),
        );
        let etapas = EtapasService::new(
            db.clone(),
            ExtracaoEtapasClient::new(client.clone(), integracoes.extracao_etapas_url.clone()),
        );
        let anexos = AnexosService::new(
            settings.armazenamento.diretorio.clone(),
            settings.armazenamento.url_publica_base.clone(),
            settings.armazenamento.max_bytes,
            ComprovanteNotifier::new(client, integracoes.comprovante_url.clone()),
        );

        Ok(Self {
            credores: CredorDirectory::new(db.clone(), settings.cache.credores_ttl()),
            usuarios: UsuariosService::new(db.clone()),
            obras: ObrasService::new(db.clone()),
            settings,
            db,
            consulta,
            fluxo,
            etapas,
            anexos,
            realtime,
        })
    }
}
