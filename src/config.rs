use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::rewards::{ScoringConfig, TierMultipliers, TransitionPolicy};

/// Service configuration, loaded from the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardsConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Security configuration
    pub security: SecurityConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Reward scoring and lifecycle
    pub rewards: RewardSettings,
    /// Payout chain
    pub blockchain: BlockchainConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Enable API key authentication
    pub enable_auth: bool,
    /// Accepted API keys
    pub api_keys: Vec<String>,
    /// Key required in `x-admin-key` for admin operations
    pub admin_api_key: String,
    /// Rate limit per minute per IP
    pub rate_limit_per_minute: u32,
    /// Maximum request body size in bytes
    pub max_request_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    pub url: String,
    /// Enable PostgreSQL (if false, uses the in-memory store)
    pub enabled: bool,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug)
    pub level: String,
    /// Enable request/response logging
    pub log_requests: bool,
    /// Mask secrets in startup logs
    pub sanitize_logs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardSettings {
    pub base_reward_amount: Decimal,
    pub tier_multipliers: TierMultipliers,
    /// Rewards must be approved before they can be paid
    pub require_approval: bool,
    /// Automatic sweep period in seconds; 0 disables it
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockchainConfig {
    pub enabled: bool,
    pub rpc_url: String,
    pub contract_address: String,
    /// Node-managed account that signs contract calls
    pub operator_address: String,
    pub gas_limit: u64,
    pub receipt_timeout_secs: u64,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            security: SecurityConfig {
                enable_auth: true,
                api_keys: Vec::new(),
                admin_api_key: String::new(),
                rate_limit_per_minute: 120,
                max_request_size: 1024 * 1024, // 1MB
            },
            database: DatabaseConfig {
                url: "postgresql://localhost:5432/creator_rewards".to_string(),
                enabled: false,
                max_connections: 10,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                log_requests: false,
                sanitize_logs: true,
            },
            rewards: RewardSettings {
                base_reward_amount: Decimal::ONE,
                tier_multipliers: TierMultipliers::default(),
                require_approval: false,
                sweep_interval_secs: 0,
            },
            blockchain: BlockchainConfig {
                enabled: false,
                rpc_url: "http://localhost:8545".to_string(),
                contract_address: String::new(),
                operator_address: String::new(),
                gas_limit: 500_000,
                receipt_timeout_secs: 120,
            },
        }
    }
}

fn parse_var<T>(value: &str, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid {} value", name))
}

fn is_address(value: &str) -> bool {
    value.len() == 42
        && value.starts_with("0x")
        && value[2..].chars().all(|c| c.is_ascii_hexdigit())
}

impl RewardsConfig {
    /// Load configuration from environment variables and validate it
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        // Server configuration
        if let Some(host) = var("REWARDS_HOST") {
            config.server.host = host;
        }
        if let Some(port) = var("REWARDS_PORT") {
            config.server.port = parse_var(&port, "REWARDS_PORT")?;
        }

        // Security configuration
        if let Some(enable_auth) = var("REWARDS_ENABLE_AUTH") {
            config.security.enable_auth = parse_var(&enable_auth, "REWARDS_ENABLE_AUTH")?;
        }
        if let Some(keys) = var("REWARDS_API_KEYS") {
            config.security.api_keys = keys
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(admin_key) = var("REWARDS_ADMIN_API_KEY") {
            config.security.admin_api_key = admin_key;
        }
        if let Some(rate_limit) = var("REWARDS_RATE_LIMIT_PER_MINUTE") {
            config.security.rate_limit_per_minute =
                parse_var(&rate_limit, "REWARDS_RATE_LIMIT_PER_MINUTE")?;
        }
        if let Some(size) = var("REWARDS_MAX_REQUEST_SIZE") {
            config.security.max_request_size = parse_var(&size, "REWARDS_MAX_REQUEST_SIZE")?;
        }

        // Database configuration
        if let Some(url) = var("DATABASE_URL") {
            config.database.url = url;
        }
        if let Some(enabled) = var("DATABASE_ENABLED") {
            config.database.enabled = parse_var(&enabled, "DATABASE_ENABLED")?;
        }
        if let Some(max) = var("DATABASE_MAX_CONNECTIONS") {
            config.database.max_connections = parse_var(&max, "DATABASE_MAX_CONNECTIONS")?;
        }

        // Logging configuration
        if let Some(level) = var("REWARDS_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(log_requests) = var("REWARDS_LOG_REQUESTS") {
            config.logging.log_requests = parse_var(&log_requests, "REWARDS_LOG_REQUESTS")?;
        }
        if let Some(sanitize) = var("REWARDS_SANITIZE_LOGS") {
            config.logging.sanitize_logs = parse_var(&sanitize, "REWARDS_SANITIZE_LOGS")?;
        }

        // Reward configuration
        if let Some(base) = var("BASE_REWARD_AMOUNT") {
            config.rewards.base_reward_amount = parse_var(&base, "BASE_REWARD_AMOUNT")?;
        }
        let tiers = &mut config.rewards.tier_multipliers;
        for (name, slot) in [
            ("REWARDS_TIER_BRONZE", &mut tiers.bronze),
            ("REWARDS_TIER_SILVER", &mut tiers.silver),
            ("REWARDS_TIER_GOLD", &mut tiers.gold),
            ("REWARDS_TIER_PLATINUM", &mut tiers.platinum),
        ] {
            if let Some(value) = var(name) {
                *slot = parse_var(&value, name)?;
            }
        }
        if let Some(require) = var("REWARDS_REQUIRE_APPROVAL") {
            config.rewards.require_approval = parse_var(&require, "REWARDS_REQUIRE_APPROVAL")?;
        }
        if let Some(secs) = var("REWARDS_SWEEP_INTERVAL_SECS") {
            config.rewards.sweep_interval_secs = parse_var(&secs, "REWARDS_SWEEP_INTERVAL_SECS")?;
        }

        // Blockchain configuration
        if let Some(enabled) = var("BLOCKCHAIN_ENABLED") {
            config.blockchain.enabled = parse_var(&enabled, "BLOCKCHAIN_ENABLED")?;
        }
        if let Some(url) = var("BLOCKCHAIN_RPC_URL") {
            config.blockchain.rpc_url = url;
        }
        if let Some(address) = var("SMART_CONTRACT_ADDRESS") {
            config.blockchain.contract_address = address;
        }
        if let Some(address) = var("BLOCKCHAIN_OPERATOR_ADDRESS") {
            config.blockchain.operator_address = address;
        }
        if let Some(gas) = var("GAS_LIMIT") {
            config.blockchain.gas_limit = parse_var(&gas, "GAS_LIMIT")?;
        }
        if let Some(secs) = var("BLOCKCHAIN_RECEIPT_TIMEOUT_SECS") {
            config.blockchain.receipt_timeout_secs =
                parse_var(&secs, "BLOCKCHAIN_RECEIPT_TIMEOUT_SECS")?;
        }

        if config.security.enable_auth && config.security.api_keys.is_empty() {
            warn!("REWARDS_API_KEYS is empty while auth is enabled; every protected request will be rejected");
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for consistency
    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(anyhow::anyhow!("Server host cannot be empty"));
        }
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port must be non-zero"));
        }
        if self.security.rate_limit_per_minute == 0 {
            return Err(anyhow::anyhow!("Rate limit must be non-zero"));
        }
        if self.security.max_request_size == 0 {
            return Err(anyhow::anyhow!("Maximum request size must be non-zero"));
        }

        if self.database.enabled {
            if self.database.url.is_empty() {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL is required when the database is enabled"
                ));
            }
            if self.database.max_connections == 0 {
                return Err(anyhow::anyhow!("Database max connections must be non-zero"));
            }
        }

        if self.rewards.base_reward_amount < Decimal::new(1, 2) {
            return Err(anyhow::anyhow!(
                "BASE_REWARD_AMOUNT must be at least 0.01, got {}",
                self.rewards.base_reward_amount
            ));
        }
        let tiers = &self.rewards.tier_multipliers;
        for (name, multiplier) in [
            ("bronze", tiers.bronze),
            ("silver", tiers.silver),
            ("gold", tiers.gold),
            ("platinum", tiers.platinum),
        ] {
            if multiplier <= Decimal::ZERO {
                return Err(anyhow::anyhow!(
                    "Tier multiplier for {} must be positive, got {}",
                    name,
                    multiplier
                ));
            }
        }

        if self.blockchain.enabled {
            if self.blockchain.rpc_url.is_empty() {
                return Err(anyhow::anyhow!("BLOCKCHAIN_RPC_URL cannot be empty"));
            }
            url::Url::parse(&self.blockchain.rpc_url).with_context(|| {
                format!("Invalid BLOCKCHAIN_RPC_URL: {}", self.blockchain.rpc_url)
            })?;
            if !is_address(&self.blockchain.contract_address) {
                return Err(anyhow::anyhow!(
                    "SMART_CONTRACT_ADDRESS must be 0x followed by 40 hex digits"
                ));
            }
            if !is_address(&self.blockchain.operator_address) {
                return Err(anyhow::anyhow!(
                    "BLOCKCHAIN_OPERATOR_ADDRESS must be 0x followed by 40 hex digits"
                ));
            }
            if self.blockchain.gas_limit == 0 {
                return Err(anyhow::anyhow!("GAS_LIMIT must be non-zero"));
            }
        }

        Ok(())
    }

    pub fn scoring(&self) -> ScoringConfig {
        ScoringConfig {
            base_reward_amount: self.rewards.base_reward_amount,
            tier_multipliers: self.rewards.tier_multipliers,
        }
    }

    pub fn transition_policy(&self) -> TransitionPolicy {
        TransitionPolicy {
            require_approval: self.rewards.require_approval,
        }
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.rewards.sweep_interval_secs > 0)
            .then(|| Duration::from_secs(self.rewards.sweep_interval_secs))
    }

    /// Database URL with any password masked
    pub fn database_url_for_logging(&self) -> String {
        mask_url_credentials(&self.database.url)
    }
}

fn mask_url_credentials(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut parsed) if parsed.password().is_some() => {
            if parsed.set_password(Some("***")).is_ok() {
                parsed.to_string()
            } else {
                sanitize_for_logging(raw)
            }
        }
        Ok(_) => raw.to_string(),
        Err(_) => sanitize_for_logging(raw),
    }
}

/// Mask a secret for logging, keeping a short prefix and suffix
pub fn sanitize_for_logging(data: &str) -> String {
    let chars: Vec<char> = data.chars().collect();
    if chars.len() <= 4 {
        return "***".to_string();
    }
    let keep = if chars.len() > 20 { 6 } else { 2 };
    let head: String = chars[..keep].iter().collect();
    let tail: String = chars[chars.len() - keep..].iter().collect();
    format!("{}***{}", head, tail)
}
