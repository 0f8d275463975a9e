use anyhow::Result;
use serde_json::Value;

use crate::rpc::TransactionRecord;

pub mod parse_tx;
pub mod swap;

pub use parse_tx::JsonTransactionParser;

/// Parser bound to a single fetched transaction.
pub trait TransactionParser: Send {
    fn parse_transaction(&self) -> Result<Value>;

    fn process_swap_data(&self, transaction_data: &Value) -> Result<Value>;
}

pub trait ParserFactory: Send + Sync {
    fn create<'a>(&self, record: &'a TransactionRecord) -> Result<Box<dyn TransactionParser + 'a>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonParserFactory;

impl ParserFactory for JsonParserFactory {
    fn create<'a>(&self, record: &'a TransactionRecord) -> Result<Box<dyn TransactionParser + 'a>> {
        Ok(Box::new(JsonTransactionParser::new(record)?))
    }
}
