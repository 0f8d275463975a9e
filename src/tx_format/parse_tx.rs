use std::{collections::BTreeMap, str::FromStr};

use anyhow::{Result, anyhow, bail};
use serde_json::{Value, json};
use solana_sdk::pubkey::Pubkey;
use solana_transaction_status::{
    EncodedTransaction, UiInnerInstructions, UiInstruction, UiLoadedAddresses, UiMessage,
    UiParsedInstruction, UiParsedMessage, UiRawMessage, UiTransaction, UiTransactionReturnData,
    UiTransactionStatusMeta, UiTransactionTokenBalance,
};

use crate::rpc::TransactionRecord;
use crate::tx_format::{TransactionParser, swap::extract_swap};
use crate::utils::{amount_change, decode_base58_to_hex, decode_base64_to_hex};

#[derive(Debug, Clone)]
struct AccountInfo {
    pubkey: String,
    signer: bool,
    writable: bool,
}

fn accounts_from_parsed(message: &UiParsedMessage) -> Vec<AccountInfo> {
    message
        .account_keys
        .iter()
        .map(|acc| AccountInfo {
            pubkey: acc.pubkey.clone(),
            signer: acc.signer,
            writable: acc.writable,
        })
        .collect()
}

// Static keys first, then lookup-table keys: writable before readonly.
fn accounts_from_raw(message: &UiRawMessage, loaded: Option<&UiLoadedAddresses>) -> Vec<AccountInfo> {
    let header = &message.header;
    let num_signers = header.num_required_signatures as usize;
    let num_readonly_signed = header.num_readonly_signed_accounts as usize;
    let num_readonly_unsigned = header.num_readonly_unsigned_accounts as usize;
    let num_static = message.account_keys.len();

    let mut out = Vec::with_capacity(num_static);
    for (idx, key) in message.account_keys.iter().enumerate() {
        let is_signer = idx < num_signers;
        let is_writable = if is_signer {
            idx < num_signers.saturating_sub(num_readonly_signed)
        } else {
            idx < num_static.saturating_sub(num_readonly_unsigned)
        };
        out.push(AccountInfo {
            pubkey: key.clone(),
            signer: is_signer,
            writable: is_writable,
        });
    }

    if let Some(loaded) = loaded {
        for (keys, writable) in [(&loaded.writable, true), (&loaded.readonly, false)] {
            out.extend(keys.iter().map(|key| AccountInfo {
                pubkey: key.clone(),
                signer: false,
                writable,
            }));
        }
    }
    out
}

fn parsed_accounts(parsed: &Value) -> Vec<String> {
    parsed
        .get("info")
        .and_then(Value::as_object)
        .map(|map| {
            map.values()
                .filter_map(Value::as_str)
                .filter(|value| Pubkey::from_str(value).is_ok())
                .map(|value| value.to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn normalize_instruction(ix: &UiInstruction, accounts: &[AccountInfo]) -> Result<Value> {
    let pubkey_at = |index: u8| -> Result<String> {
        accounts
            .get(index as usize)
            .map(|acc| acc.pubkey.clone())
            .ok_or_else(|| anyhow!("Account index {index} out of range"))
    };

    let (program_id, program, accounts_list, data) = match ix {
        UiInstruction::Compiled(compiled) => {
            let program_id = pubkey_at(compiled.program_id_index)?;
            let accounts_list = compiled
                .accounts
                .iter()
                .map(|index| pubkey_at(*index))
                .collect::<Result<Vec<_>>>()?;
            (
                program_id,
                None,
                accounts_list,
                Value::String(decode_base58_to_hex(&compiled.data)?),
            )
        }
        UiInstruction::Parsed(UiParsedInstruction::Parsed(parsed)) => (
            parsed.program_id.clone(),
            Some(parsed.program.clone()),
            parsed_accounts(&parsed.parsed),
            parsed.parsed.clone(),
        ),
        UiInstruction::Parsed(UiParsedInstruction::PartiallyDecoded(partial)) => (
            partial.program_id.clone(),
            None,
            partial.accounts.clone(),
            Value::String(decode_base58_to_hex(&partial.data)?),
        ),
    };

    Ok(json!({
        "programId": program_id,
        "program": program,
        "accounts": accounts_list,
        "data": data,
    }))
}

/// Default parser over `json`/`jsonParsed` encoded transactions.
pub struct JsonTransactionParser<'a> {
    record: &'a TransactionRecord,
    transaction: &'a UiTransaction,
}

impl<'a> JsonTransactionParser<'a> {
    pub fn new(record: &'a TransactionRecord) -> Result<Self> {
        match &record.transaction.transaction {
            EncodedTransaction::Json(transaction) => Ok(Self {
                record,
                transaction,
            }),
            _ => bail!("Transaction encoding is not JSON"),
        }
    }

    fn meta(&self) -> Option<&'a UiTransactionStatusMeta> {
        self.record.transaction.meta.as_ref()
    }

    fn account_infos(&self) -> Vec<AccountInfo> {
        match &self.transaction.message {
            UiMessage::Parsed(msg) => accounts_from_parsed(msg),
            UiMessage::Raw(msg) => {
                let loaded = self.meta().and_then(|meta| {
                    Option::<UiLoadedAddresses>::from(meta.loaded_addresses.clone())
                });
                accounts_from_raw(msg, loaded.as_ref())
            }
        }
    }

    fn instructions(&self) -> Vec<UiInstruction> {
        match &self.transaction.message {
            UiMessage::Parsed(msg) => msg.instructions.clone(),
            UiMessage::Raw(msg) => msg
                .instructions
                .iter()
                .cloned()
                .map(UiInstruction::Compiled)
                .collect(),
        }
    }

    fn accounts_json(&self, accounts: &[AccountInfo]) -> Vec<Value> {
        let pre_balances = self
            .meta()
            .map(|meta| meta.pre_balances.clone())
            .unwrap_or_default();
        let post_balances = self
            .meta()
            .map(|meta| meta.post_balances.clone())
            .unwrap_or_default();

        accounts
            .iter()
            .enumerate()
            .map(|(idx, acc)| {
                let pre = pre_balances.get(idx).copied();
                let post = post_balances.get(idx).copied();
                let change = match (pre, post) {
                    (Some(pre), Some(post)) => post as i64 - pre as i64,
                    _ => 0,
                };
                json!({
                    "pubkey": acc.pubkey,
                    "isSigner": acc.signer,
                    "isWritable": acc.writable,
                    "preBalance": pre,
                    "postBalance": post,
                    "balanceChange": change,
                })
            })
            .collect()
    }

    fn instructions_json(&self, accounts: &[AccountInfo]) -> Result<Vec<Value>> {
        let inner = self
            .meta()
            .and_then(|meta| {
                Option::<Vec<UiInnerInstructions>>::from(meta.inner_instructions.clone())
            })
            .unwrap_or_default();

        self.instructions()
            .iter()
            .enumerate()
            .map(|(idx, ix)| {
                let mut entry = normalize_instruction(ix, accounts)?;
                let inner_json = inner
                    .iter()
                    .filter(|set| set.index as usize == idx)
                    .flat_map(|set| set.instructions.iter())
                    .map(|inner_ix| normalize_instruction(inner_ix, accounts))
                    .collect::<Result<Vec<_>>>()?;
                if let Value::Object(map) = &mut entry {
                    map.insert("innerInstructions".to_string(), Value::Array(inner_json));
                }
                Ok(entry)
            })
            .collect()
    }

    fn token_balance_changes(&self, accounts: &[AccountInfo]) -> Result<Vec<Value>> {
        let Some(meta) = self.meta() else {
            return Ok(Vec::new());
        };
        let pre = Option::<Vec<UiTransactionTokenBalance>>::from(meta.pre_token_balances.clone())
            .unwrap_or_default();
        let post =
            Option::<Vec<UiTransactionTokenBalance>>::from(meta.post_token_balances.clone())
                .unwrap_or_default();

        let mut paired: BTreeMap<
            u8,
            (
                Option<UiTransactionTokenBalance>,
                Option<UiTransactionTokenBalance>,
            ),
        > = BTreeMap::new();
        for balance in pre {
            let index = balance.account_index;
            paired.entry(index).or_default().0 = Some(balance);
        }
        for balance in post {
            let index = balance.account_index;
            paired.entry(index).or_default().1 = Some(balance);
        }

        paired
            .into_iter()
            .filter_map(|(index, (pre, post))| {
                let reference = post.as_ref().or(pre.as_ref())?.clone();
                Some((index, pre, post, reference))
            })
            .map(|(index, pre, post, reference)| {
                let pre_amount = pre
                    .map(|balance| balance.ui_token_amount.amount)
                    .unwrap_or_else(|| "0".to_string());
                let post_amount = post
                    .map(|balance| balance.ui_token_amount.amount)
                    .unwrap_or_else(|| "0".to_string());
                let change = amount_change(&pre_amount, &post_amount)?;
                Ok(json!({
                    "accountIndex": index,
                    "account": accounts.get(index as usize).map(|acc| acc.pubkey.clone()),
                    "mint": reference.mint,
                    "owner": Option::<String>::from(reference.owner),
                    "decimals": reference.ui_token_amount.decimals,
                    "preAmount": pre_amount,
                    "postAmount": post_amount,
                    "change": change.to_string(),
                }))
            })
            .collect()
    }
}

impl TransactionParser for JsonTransactionParser<'_> {
    fn parse_transaction(&self) -> Result<Value> {
        let accounts = self.account_infos();
        if accounts.is_empty() {
            bail!("Transaction message has no account keys");
        }

        let signers: Vec<String> = accounts
            .iter()
            .filter(|acc| acc.signer)
            .map(|acc| acc.pubkey.clone())
            .collect();

        let instructions = self.instructions_json(&accounts)?;
        let token_balance_changes = self.token_balance_changes(&accounts)?;

        let meta = self.meta();
        let logs = meta
            .and_then(|meta| Option::<Vec<String>>::from(meta.log_messages.clone()))
            .unwrap_or_default();
        let error = match meta {
            Some(meta) => serde_json::to_value(&meta.err)?,
            None => Value::Null,
        };
        let compute_units =
            meta.and_then(|meta| Option::<u64>::from(meta.compute_units_consumed.clone()));
        let return_data = meta
            .and_then(|meta| Option::<UiTransactionReturnData>::from(meta.return_data.clone()))
            .map(|data| -> Result<Value> {
                Ok(json!({
                    "programId": data.program_id,
                    "data": decode_base64_to_hex(&data.data.0)?,
                }))
            })
            .transpose()?;

        Ok(json!({
            "signatures": self.transaction.signatures,
            "signers": signers,
            "accounts": self.accounts_json(&accounts),
            "instructions": instructions,
            "tokenBalanceChanges": token_balance_changes,
            "logs": logs,
            "error": error,
            "computeUnitsConsumed": compute_units,
            "returnData": return_data,
            "version": serde_json::to_value(&self.record.transaction.version)?,
        }))
    }

    fn process_swap_data(&self, transaction_data: &Value) -> Result<Value> {
        extract_swap(transaction_data, self.record.fee)
    }
}
