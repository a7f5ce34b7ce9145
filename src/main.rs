use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use sms_gateway::Carrier;
use sms_gateway::authority::HttpAccountAuthority;
use sms_gateway::carrier::{ChuanglanProvider, Provider, YunpianProvider};
use sms_gateway::client::ReqwestTransport;
use sms_gateway::config::GatewayConfig;
use sms_gateway::ledger::QuotaLedger;
use sms_gateway::orchestrator::SendOrchestrator;
use sms_gateway::reconcile::ReceiptReconciler;
use sms_gateway::registry::ProviderRegistry;
use sms_gateway::server::{AppState, build_router};
use sms_gateway::store::{InMemoryStore, SeedData};
use sms_gateway::verification::VerificationCodes;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "sms gateway stopped");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sms_gateway=info,warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

async fn run() -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = GatewayConfig::from_env()?;

    let http = Arc::new(
        ReqwestTransport::builder()
            .timeout(config.http_timeout)
            .user_agent(config.user_agent.clone())
            .build()?,
    );
    let authority = Arc::new(HttpAccountAuthority::new(
        config.authority_url.clone(),
        http.clone(),
    ));
    let seed = match &config.seed_file {
        Some(path) => SeedData::load(path)?,
        None => SeedData::default(),
    };
    info!(
        providers = seed.providers.len(),
        templates = seed.templates.len(),
        "store seeded"
    );
    let store = Arc::new(InMemoryStore::seeded(seed));

    let registry = Arc::new(ProviderRegistry::new(authority.clone(), store.clone()));
    let chuanglan = Arc::new(ChuanglanProvider::new(registry.clone(), http.clone()));
    let yunpian = Arc::new(YunpianProvider::new(registry, http));
    let active: Arc<dyn Provider> = match config.carrier {
        Carrier::Chuanglan => chuanglan.clone(),
        Carrier::Yunpian => yunpian.clone(),
    };

    let orchestrator = SendOrchestrator::new(
        active,
        QuotaLedger::new(authority),
        store.clone(),
        store.clone(),
        Arc::new(VerificationCodes::new(config.code_ttl)),
    );
    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        chuanglan,
        yunpian,
        reconciler: Arc::new(ReceiptReconciler::new(store)),
    };

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!(addr = %config.listen, carrier = %config.carrier, "sms gateway listening");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("sms gateway shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
    }
}
