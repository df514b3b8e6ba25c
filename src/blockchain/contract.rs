//! Rewards contract bindings

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::blockchain::abi::{self, Token};
use crate::blockchain::client::RpcClient;
use crate::config::BlockchainConfig;
use crate::error::{AppError, AppResult};

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

const DISTRIBUTE_REWARD: &str = "distributeReward(address,uint256,string)";
const STAKE_FOR_VERIFICATION: &str = "stakeForVerification(address,uint256)";
const GET_CREATOR_EARNINGS: &str = "getCreatorEarnings(address)";
const GET_PLATFORM_STATS: &str = "getPlatformStats()";
const ADD_REWARD_TOKENS: &str = "addRewardTokens(uint256)";
const GET_CONTRACT_BALANCE: &str = "getContractVibeCoinBalance()";
const GET_TOKEN_ADDRESS: &str = "getVibeCoinAddress()";

#[derive(Debug, Clone, Serialize)]
pub struct PlatformStats {
    pub total_rewards_distributed: Decimal,
    pub total_creators: u64,
    pub total_staked: Decimal,
}

/// On-chain side of payouts and creator verification.
#[async_trait]
pub trait ContractGateway: Send + Sync {
    /// Pays `amount` tokens to `wallet`; returns the confirmed transaction hash.
    async fn distribute_reward(
        &self,
        wallet: &str,
        amount: Decimal,
        reward_id: &str,
    ) -> AppResult<String>;
    async fn stake_for_verification(&self, wallet: &str, amount: Decimal) -> AppResult<String>;
    async fn creator_earnings(&self, wallet: &str) -> AppResult<Decimal>;
    async fn platform_stats(&self) -> AppResult<PlatformStats>;
    async fn add_reward_tokens(&self, amount: Decimal) -> AppResult<String>;
    async fn contract_balance(&self) -> AppResult<Decimal>;
    async fn token_address(&self) -> AppResult<String>;
    /// True iff the transaction was mined with status 1.
    async fn verify_transaction(&self, hash: &str) -> AppResult<bool>;
}

/// Stand-in used when no chain is configured; every call fails.
pub struct DisabledGateway;

fn disabled<T>() -> AppResult<T> {
    Err(AppError::Blockchain(
        "blockchain integration is disabled".to_string(),
    ))
}

#[async_trait]
impl ContractGateway for DisabledGateway {
    async fn distribute_reward(&self, _: &str, _: Decimal, _: &str) -> AppResult<String> {
        disabled()
    }
    async fn stake_for_verification(&self, _: &str, _: Decimal) -> AppResult<String> {
        disabled()
    }
    async fn creator_earnings(&self, _: &str) -> AppResult<Decimal> {
        disabled()
    }
    async fn platform_stats(&self) -> AppResult<PlatformStats> {
        disabled()
    }
    async fn add_reward_tokens(&self, _: Decimal) -> AppResult<String> {
        disabled()
    }
    async fn contract_balance(&self) -> AppResult<Decimal> {
        disabled()
    }
    async fn token_address(&self) -> AppResult<String> {
        disabled()
    }
    async fn verify_transaction(&self, _: &str) -> AppResult<bool> {
        disabled()
    }
}

pub struct RewardsContract {
    rpc: RpcClient,
    address: String,
    operator: String,
    gas_limit: u64,
    receipt_timeout: Duration,
}

impl RewardsContract {
    pub fn new(config: &BlockchainConfig) -> AppResult<Self> {
        abi::parse_address(&config.contract_address)?;
        abi::parse_address(&config.operator_address)?;
        Ok(Self {
            rpc: RpcClient::new(&config.rpc_url)?,
            address: config.contract_address.clone(),
            operator: config.operator_address.clone(),
            gas_limit: config.gas_limit,
            receipt_timeout: Duration::from_secs(config.receipt_timeout_secs),
        })
    }

    async fn read(&self, signature: &str, tokens: &[Token]) -> AppResult<Vec<[u8; abi::WORD]>> {
        let data = abi::encode_call(signature, tokens);
        let output = self.rpc.eth_call(&self.address, &data).await?;
        abi::decode_words(&output)
    }

    async fn read_uint(&self, signature: &str, tokens: &[Token]) -> AppResult<u128> {
        let words = self.read(signature, tokens).await?;
        let first = words
            .first()
            .ok_or_else(|| AppError::Blockchain(format!("{} returned no data", signature)))?;
        abi::word_to_uint(first)
    }

    /// Submits a transaction and waits for a successful receipt.
    async fn send_and_confirm(&self, signature: &str, tokens: &[Token]) -> AppResult<String> {
        let data = abi::encode_call(signature, tokens);
        let hash = self
            .rpc
            .send_transaction(&self.operator, &self.address, &data, self.gas_limit)
            .await?;
        debug!(tx_hash = %hash, call = signature, "Transaction submitted");

        let deadline = Instant::now() + self.receipt_timeout;
        loop {
            if let Some(receipt) = self.rpc.transaction_receipt(&hash).await? {
                if !receipt.succeeded() {
                    warn!(tx_hash = %hash, call = signature, "Transaction reverted");
                    return Err(AppError::Blockchain(format!(
                        "transaction {} reverted",
                        hash
                    )));
                }
                info!(
                    tx_hash = %hash,
                    call = signature,
                    block = receipt.block_number.as_deref().unwrap_or("?"),
                    "Transaction confirmed"
                );
                return Ok(hash);
            }
            if Instant::now() >= deadline {
                return Err(AppError::Blockchain(format!(
                    "no receipt for {} after {}s",
                    hash,
                    self.receipt_timeout.as_secs()
                )));
            }
            sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl ContractGateway for RewardsContract {
    async fn distribute_reward(
        &self,
        wallet: &str,
        amount: Decimal,
        reward_id: &str,
    ) -> AppResult<String> {
        let tokens = [
            Token::Address(abi::parse_address(wallet)?),
            Token::Uint(abi::to_wei(amount)?),
            Token::String(reward_id.to_string()),
        ];
        self.send_and_confirm(DISTRIBUTE_REWARD, &tokens).await
    }

    async fn stake_for_verification(&self, wallet: &str, amount: Decimal) -> AppResult<String> {
        let tokens = [
            Token::Address(abi::parse_address(wallet)?),
            Token::Uint(abi::to_wei(amount)?),
        ];
        self.send_and_confirm(STAKE_FOR_VERIFICATION, &tokens).await
    }

    async fn creator_earnings(&self, wallet: &str) -> AppResult<Decimal> {
        let wei = self
            .read_uint(
                GET_CREATOR_EARNINGS,
                &[Token::Address(abi::parse_address(wallet)?)],
            )
            .await?;
        abi::from_wei(wei)
    }

    async fn platform_stats(&self) -> AppResult<PlatformStats> {
        let words = self.read(GET_PLATFORM_STATS, &[]).await?;
        let [distributed, creators, staked] = words.as_slice() else {
            return Err(AppError::Blockchain(format!(
                "getPlatformStats returned {} words, expected 3",
                words.len()
            )));
        };
        Ok(PlatformStats {
            total_rewards_distributed: abi::from_wei(abi::word_to_uint(distributed)?)?,
            total_creators: u64::try_from(abi::word_to_uint(creators)?)
                .map_err(|_| AppError::Blockchain("creator count out of range".to_string()))?,
            total_staked: abi::from_wei(abi::word_to_uint(staked)?)?,
        })
    }

    async fn add_reward_tokens(&self, amount: Decimal) -> AppResult<String> {
        self.send_and_confirm(ADD_REWARD_TOKENS, &[Token::Uint(abi::to_wei(amount)?)])
            .await
    }

    async fn contract_balance(&self) -> AppResult<Decimal> {
        abi::from_wei(self.read_uint(GET_CONTRACT_BALANCE, &[]).await?)
    }

    async fn token_address(&self) -> AppResult<String> {
        let words = self.read(GET_TOKEN_ADDRESS, &[]).await?;
        let first = words
            .first()
            .ok_or_else(|| AppError::Blockchain("getVibeCoinAddress returned no data".to_string()))?;
        Ok(abi::format_address(&abi::word_to_address(first)))
    }

    async fn verify_transaction(&self, hash: &str) -> AppResult<bool> {
        Ok(self
            .rpc
            .transaction_receipt(hash)
            .await?
            .is_some_and(|r| r.succeeded()))
    }
}
