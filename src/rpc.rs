use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use solana_commitment_config::CommitmentConfig;
use solana_rpc_client::api::config::RpcTransactionConfig;
use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::signature::Signature;
use solana_transaction_status::{
    EncodedConfirmedTransactionWithStatusMeta, EncodedTransactionWithStatusMeta,
    UiTransactionEncoding,
};

/// A confirmed transaction as returned by the node, with the passthrough
/// fields lifted out of the payload.
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub slot: u64,
    pub block_time: Option<i64>,
    pub fee: u64,
    pub transaction: EncodedTransactionWithStatusMeta,
}

impl TryFrom<EncodedConfirmedTransactionWithStatusMeta> for TransactionRecord {
    type Error = anyhow::Error;

    fn try_from(raw: EncodedConfirmedTransactionWithStatusMeta) -> Result<Self> {
        let fee = raw
            .transaction
            .meta
            .as_ref()
            .map(|meta| meta.fee)
            .ok_or_else(|| anyhow!("Transaction status metadata unavailable"))?;
        Ok(Self {
            slot: raw.slot,
            block_time: raw.block_time,
            fee,
            transaction: raw.transaction,
        })
    }
}

#[async_trait]
pub trait TransactionSource: Send + Sync {
    async fn fetch_transaction(&self, signature: &Signature) -> Result<TransactionRecord>;
}

pub struct RpcTransactionSource {
    client: RpcClient,
}

impl RpcTransactionSource {
    pub fn new(rpc_url: &str, timeout: Duration) -> Self {
        let client = RpcClient::new_with_timeout_and_commitment(
            rpc_url.to_string(),
            timeout,
            CommitmentConfig::confirmed(),
        );
        Self { client }
    }
}

pub fn transaction_config() -> RpcTransactionConfig {
    RpcTransactionConfig {
        encoding: Some(UiTransactionEncoding::JsonParsed),
        commitment: Some(CommitmentConfig::confirmed()),
        max_supported_transaction_version: Some(0),
    }
}

#[async_trait]
impl TransactionSource for RpcTransactionSource {
    async fn fetch_transaction(&self, signature: &Signature) -> Result<TransactionRecord> {
        let tx = self
            .client
            .get_transaction_with_config(signature, transaction_config())
            .await
            .with_context(|| format!("Failed to fetch transaction {signature}"))?;
        TransactionRecord::try_from(tx)
    }
}
