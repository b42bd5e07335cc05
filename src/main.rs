/// Serviço de títulos da Grifo
///
/// - Envio, aprovação, reprovação e pagamento de títulos por obra
/// - Relay dos webhooks do Sienge e do Asaas
/// - Leituras em cache invalidadas pelo feed de alterações (SSE em /realtime)

use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use grifo_titulos::{build_router, config::Settings, utils::logging::*, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 🔧 Carregar variáveis de ambiente do arquivo .env (se existir)
    let dotenv_carregado = dotenvy::dotenv().is_ok();

    // Inicializar tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if dotenv_carregado {
        tracing::info!("✅ Arquivo .env carregado com sucesso");
    } else {
        // Em produção (Cloud Run), não existe .env - variáveis vêm do ambiente
        tracing::debug!("Arquivo .env não encontrado - usando variáveis de ambiente do sistema");
    }

    // Carregar configurações
    let settings = Settings::new().context("Failed to load settings")?;

    log_config_loaded(&settings.server.ambiente);

    let integracoes = &settings.integracoes;
    if integracoes.sienge_lancamento_url.is_none() {
        log_warning("⚠️ SIENGE_WEBHOOK_URL não configurada. Títulos serão aprovados sem lançamento no Sienge.");
    }
    if integracoes.asaas_pagamento_url.is_none() {
        log_warning("⚠️ ASAAS_WEBHOOK_URL não configurada. Pagamento via Asaas desabilitado.");
    }

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let admin_inicial = settings.admin.email_inicial.clone();
    let nome_admin = settings.admin.nome_inicial.clone();

    // Inicializar estado da aplicação
    let app_state = Arc::new(AppState::new(settings).context("Failed to build application state")?);
    log_info("📡 Invalidação de leituras assinada no feed de alterações");

    if let Some(email) = admin_inicial {
        if let Some(admin) = app_state.usuarios.garantir_admin(&email, &nome_admin).await? {
            log_info(&format!("👤 Use X-User-Id: {} para o primeiro acesso", admin.perfil.id));
        }
    }

    let app = build_router(app_state);

    // Iniciar servidor
    let listener = TcpListener::bind(format!("{}:{}", host, port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;

    log_server_startup(port);
    log_server_ready(port);

    // Graceful shutdown com signal handling
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log_info("🛑 Server shut down gracefully");
    Ok(())
}

/// Signal handler para graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log_error(&format!("Failed to install Ctrl+C handler: {}", e));
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sinal) => {
                sinal.recv().await;
            }
            Err(e) => {
                log_error(&format!("Failed to install SIGTERM handler: {}", e));
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log_info("🛑 Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            log_info("🛑 Received SIGTERM, shutting down gracefully...");
        }
    }
}
