use std::{str::FromStr, sync::Arc};

use serde::Serialize;
use serde_json::Value;
use solana_sdk::signature::Signature;
use thiserror::Error;

use crate::rpc::{TransactionRecord, TransactionSource};
use crate::tx_format::ParserFactory;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("txHash parameter is required")]
    MissingSignature,
    #[error("invalid txHash format")]
    InvalidSignature,
    #[error("error fetching transaction: {0}")]
    Upstream(String),
    #[error("error creating transaction parser: {0}")]
    ParserCreation(String),
    #[error("error parsing transaction: {0}")]
    Parse(String),
    #[error("error processing swap data: {0}")]
    SwapExtraction(String),
}

impl LookupError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingSignature => "txHash parameter is required",
            Self::InvalidSignature => "invalid txHash format",
            Self::Upstream(_) => "error fetching transaction",
            Self::ParserCreation(_) => "error creating transaction parser",
            Self::Parse(_) => "error parsing transaction",
            Self::SwapExtraction(_) => "error processing swap data",
        }
    }

    pub fn details(&self) -> Option<&str> {
        match self {
            Self::MissingSignature | Self::InvalidSignature => None,
            Self::Upstream(details)
            | Self::ParserCreation(details)
            | Self::Parse(details)
            | Self::SwapExtraction(details) => Some(details),
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::MissingSignature | Self::InvalidSignature)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub transaction_data: Value,
    pub swap_data: Value,
    pub slot: u64,
    pub block_time: Option<i64>,
    pub fee: u64,
}

pub fn parse_signature(tx_hash: Option<&str>) -> Result<Signature, LookupError> {
    let tx_hash = tx_hash
        .filter(|hash| !hash.is_empty())
        .ok_or(LookupError::MissingSignature)?;
    Signature::from_str(tx_hash).map_err(|_| LookupError::InvalidSignature)
}

pub struct LookupService {
    source: Arc<dyn TransactionSource>,
    parsers: Arc<dyn ParserFactory>,
}

impl LookupService {
    pub fn new(source: Arc<dyn TransactionSource>, parsers: Arc<dyn ParserFactory>) -> Self {
        Self { source, parsers }
    }

    pub async fn lookup(&self, tx_hash: Option<&str>) -> Result<TransactionView, LookupError> {
        let signature = parse_signature(tx_hash)?;
        let record = self
            .source
            .fetch_transaction(&signature)
            .await
            .map_err(|err| LookupError::Upstream(format!("{err:#}")))?;
        self.assemble(&record)
    }

    fn assemble(&self, record: &TransactionRecord) -> Result<TransactionView, LookupError> {
        let parser = self
            .parsers
            .create(record)
            .map_err(|err| LookupError::ParserCreation(format!("{err:#}")))?;
        let transaction_data = parser
            .parse_transaction()
            .map_err(|err| LookupError::Parse(format!("{err:#}")))?;
        let swap_data = parser
            .process_swap_data(&transaction_data)
            .map_err(|err| LookupError::SwapExtraction(format!("{err:#}")))?;

        Ok(TransactionView {
            transaction_data,
            swap_data,
            slot: record.slot,
            block_time: record.block_time,
            fee: record.fee,
        })
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use solana_sdk::signature::Signature;
    use solana_transaction_status::{EncodedTransaction, EncodedTransactionWithStatusMeta};

    use super::LookupService;
    use crate::rpc::{TransactionRecord, TransactionSource};
    use crate::tx_format::{ParserFactory, TransactionParser};

    pub fn valid_signature() -> String {
        Signature::from([7u8; 64]).to_string()
    }

    pub fn sample_record() -> TransactionRecord {
        TransactionRecord {
            slot: 301_234_567,
            block_time: Some(1_726_000_000),
            fee: 5_000,
            transaction: EncodedTransactionWithStatusMeta {
                transaction: EncodedTransaction::LegacyBinary(String::new()),
                meta: None,
                version: None,
            },
        }
    }

    pub struct FakeSource {
        pub result: Result<TransactionRecord, String>,
        pub calls: AtomicUsize,
    }

    impl FakeSource {
        pub fn ok(record: TransactionRecord) -> Self {
            Self {
                result: Ok(record),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                result: Err(message.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TransactionSource for FakeSource {
        async fn fetch_transaction(&self, _signature: &Signature) -> Result<TransactionRecord> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone().map_err(|message| anyhow!(message))
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum FailAt {
        Nothing,
        Create,
        Parse,
        Swap,
    }

    pub struct FakeParsers {
        pub fail_at: FailAt,
        pub calls: AtomicUsize,
    }

    impl FakeParsers {
        pub fn new(fail_at: FailAt) -> Self {
            Self {
                fail_at,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    pub fn parsed_data() -> Value {
        json!({"instructions": [{"programId": "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4"}]})
    }

    pub fn swap_data() -> Value {
        json!({"tokenIn": {"mint": "USDC", "amount": "10"}, "tokenOut": {"mint": "SOL", "amount": "1"}})
    }

    struct FakeParser {
        fail_at: FailAt,
    }

    impl TransactionParser for FakeParser {
        fn parse_transaction(&self) -> Result<Value> {
            if self.fail_at == FailAt::Parse {
                return Err(anyhow!("unsupported instruction layout"));
            }
            Ok(parsed_data())
        }

        fn process_swap_data(&self, transaction_data: &Value) -> Result<Value> {
            if self.fail_at == FailAt::Swap {
                return Err(anyhow!("no swap instructions found"));
            }
            assert_eq!(transaction_data, &parsed_data());
            Ok(swap_data())
        }
    }

    impl ParserFactory for FakeParsers {
        fn create<'a>(
            &self,
            _record: &'a TransactionRecord,
        ) -> Result<Box<dyn TransactionParser + 'a>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_at == FailAt::Create {
                return Err(anyhow!("malformed transaction payload"));
            }
            Ok(Box::new(FakeParser {
                fail_at: self.fail_at,
            }))
        }
    }

    pub fn service(source: &Arc<FakeSource>, parsers: &Arc<FakeParsers>) -> LookupService {
        LookupService::new(source.clone(), parsers.clone())
    }
}
