use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, info, warn};
use tracing_subscriber::fmt::format::FmtSpan;

use creator_rewards::{
    ApiState, ContractGateway, DatabasePool, DisabledGateway, MemoryStore, RewardsConfig,
    RewardsContract, SecurityMiddlewareConfig, SecurityState, Store, create_app,
    config::sanitize_for_logging,
};

const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first - this validates all settings
    let config = RewardsConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {:#}", e);
        eprintln!("Please check environment variables.");
        e
    })?;

    init_secure_logging(&config)?;

    info!("Starting creator rewards server");
    info!(
        "Security settings: Auth enabled: {}, Admin key configured: {}",
        config.security.enable_auth,
        !config.security.admin_api_key.is_empty()
    );

    let store = create_store(&config).await?;
    let gateway = create_gateway(&config)?;

    let state = ApiState::new(
        store,
        config.scoring(),
        config.transition_policy(),
        gateway,
        Some(config.security.admin_api_key.clone()),
    );
    info!(
        "Reward ledger ready: base amount={}, require approval={}",
        config.rewards.base_reward_amount, config.rewards.require_approval
    );

    match config.sweep_interval() {
        Some(period) => {
            state.sweeper.clone().spawn_periodic(period);
        }
        None => info!("Periodic reward sweep disabled"),
    }

    let security_state = SecurityState::new(SecurityMiddlewareConfig::from_config(&config));
    spawn_rate_limit_cleanup(&security_state);
    log_credentials(&config);

    let app = create_app(state, security_state);

    // Start the server on configured host/port
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    info!("Creator rewards server listening on {}", bind_addr);
    info!(
        "Security middleware: Auth={}, Rate limit={}/min, Max body={}KB",
        config.security.enable_auth,
        config.security.rate_limit_per_minute,
        config.security.max_request_size / 1024
    );

    // Serve with connect info for client IP extraction
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Initialize secure logging with sanitization
fn init_secure_logging(config: &RewardsConfig) -> Result<()> {
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(if config.logging.log_requests {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        })
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    if config.logging.sanitize_logs {
        info!("Secure logging initialized with data sanitization enabled");
    }

    Ok(())
}

async fn create_store(config: &RewardsConfig) -> Result<Arc<dyn Store>> {
    if !config.database.enabled {
        warn!("Database disabled - using in-memory store, data is lost on restart");
        return Ok(Arc::new(MemoryStore::new()));
    }

    info!("Connecting to database {}", config.database_url_for_logging());
    let pool = DatabasePool::new(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to database")?;
    pool.init_schema()
        .await
        .context("Failed to initialize database schema")?;
    Ok(Arc::new(pool))
}

fn create_gateway(config: &RewardsConfig) -> Result<Arc<dyn ContractGateway>> {
    if !config.blockchain.enabled {
        info!("Blockchain integration disabled");
        return Ok(Arc::new(DisabledGateway));
    }

    let contract = RewardsContract::new(&config.blockchain)
        .context("Failed to create rewards contract client")?;
    info!(
        "Rewards contract {} via {}",
        config.blockchain.contract_address, config.blockchain.rpc_url
    );
    Ok(Arc::new(contract))
}

fn spawn_rate_limit_cleanup(security: &SecurityState) {
    let limiter = security.rate_limiter.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(RATE_LIMIT_CLEANUP_INTERVAL);
        loop {
            ticker.tick().await;
            limiter.cleanup();
        }
    });
}

fn log_credentials(config: &RewardsConfig) {
    if !config.logging.sanitize_logs {
        warn!("Log sanitization disabled - credentials are not logged");
        return;
    }
    if !config.security.admin_api_key.is_empty() {
        info!(
            "Admin API key: {}",
            sanitize_for_logging(&config.security.admin_api_key)
        );
    }
    for key in &config.security.api_keys {
        info!("API key loaded: {}", sanitize_for_logging(key));
    }
}
