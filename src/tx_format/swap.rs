use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow, bail};
use serde_json::{Value, json};

use crate::accounts::{
    SYSTEM_PROGRAM_ID, WRAPPED_SOL_DECIMALS, WRAPPED_SOL_MINT, swap_program_name,
};

#[derive(Debug, Clone, PartialEq)]
struct TokenLeg {
    mint: String,
    amount: u128,
    decimals: u8,
}

impl TokenLeg {
    fn native(amount: u128) -> Self {
        Self {
            mint: WRAPPED_SOL_MINT.to_string(),
            amount,
            decimals: WRAPPED_SOL_DECIMALS,
        }
    }

    fn to_json(&self) -> Value {
        json!({
            "mint": self.mint,
            "amount": self.amount.to_string(),
            "decimals": self.decimals,
        })
    }
}

fn array<'v>(value: &'v Value, key: &str) -> &'v [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn swap_protocols(transaction_data: &Value) -> Vec<&'static str> {
    let mut protocols = Vec::new();
    for ix in array(transaction_data, "instructions") {
        for candidate in std::iter::once(ix).chain(array(ix, "innerInstructions")) {
            let name = candidate
                .get("programId")
                .and_then(Value::as_str)
                .and_then(swap_program_name);
            if let Some(name) = name.filter(|name| !protocols.contains(name)) {
                protocols.push(name);
            }
        }
    }
    protocols
}

fn token_changes(transaction_data: &Value, owner: &str) -> Result<BTreeMap<String, (i128, u8)>> {
    let mut changes: BTreeMap<String, (i128, u8)> = BTreeMap::new();
    for entry in array(transaction_data, "tokenBalanceChanges") {
        if entry.get("owner").and_then(Value::as_str) != Some(owner) {
            continue;
        }
        let mint = entry
            .get("mint")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("Token balance change without mint"))?;
        let decimals = entry.get("decimals").and_then(Value::as_u64).unwrap_or(0) as u8;
        let raw_change = entry
            .get("change")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("Token balance change without amount for {mint}"))?;
        let change: i128 = raw_change
            .parse()
            .with_context(|| format!("Invalid token amount change: {raw_change}"))?;
        changes.entry(mint.to_string()).or_insert((0, decimals)).0 += change;
    }
    Ok(changes)
}

fn is_swap_instruction(ix: &Value) -> bool {
    std::iter::once(ix)
        .chain(array(ix, "innerInstructions"))
        .any(|candidate| {
            candidate
                .get("programId")
                .and_then(Value::as_str)
                .and_then(swap_program_name)
                .is_some()
        })
}

fn system_transfer(ix: &Value) -> Option<(&str, &str, u64)> {
    if ix.get("programId").and_then(Value::as_str) != Some(SYSTEM_PROGRAM_ID) {
        return None;
    }
    let data = ix.get("data")?;
    if data.get("type").and_then(Value::as_str) != Some("transfer") {
        return None;
    }
    let info = data.get("info")?;
    Some((
        info.get("source")?.as_str()?,
        info.get("destination")?.as_str()?,
        info.get("lamports")?.as_u64()?,
    ))
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct NativeFlow {
    sent: u128,
    received: u128,
}

// SOL moved by system transfers issued from within swap instructions.
fn swap_native_flow(transaction_data: &Value, signer: &str) -> NativeFlow {
    let mut flow = NativeFlow::default();
    let transfers = array(transaction_data, "instructions")
        .iter()
        .filter(|ix| is_swap_instruction(ix))
        .flat_map(|ix| array(ix, "innerInstructions"))
        .filter_map(system_transfer);
    for (source, destination, lamports) in transfers {
        if source == signer && destination != signer {
            flow.sent += lamports as u128;
        } else if destination == signer && source != signer {
            flow.received += lamports as u128;
        }
    }
    flow
}

// Lamport change of the signer with the network fee and the rent of
// accounts opened by this transaction added back.
fn native_change(transaction_data: &Value, signer: &str, fee: u64) -> i128 {
    let accounts = array(transaction_data, "accounts");
    let balance = |acc: &Value, key: &str| acc.get(key).and_then(Value::as_u64);
    let rent: i128 = accounts
        .iter()
        .filter(|acc| acc.get("pubkey").and_then(Value::as_str) != Some(signer))
        .filter(|acc| balance(*acc, "preBalance") == Some(0))
        .filter_map(|acc| balance(acc, "postBalance"))
        .map(|post| post as i128)
        .sum();
    accounts
        .iter()
        .find(|acc| acc.get("pubkey").and_then(Value::as_str) == Some(signer))
        .and_then(|acc| acc.get("balanceChange").and_then(Value::as_i64))
        .map(|change| change as i128 + fee as i128 + rent)
        .unwrap_or(0)
}

/// Derives the token sent and received by the fee payer of a swap.
pub fn extract_swap(transaction_data: &Value, fee: u64) -> Result<Value> {
    let signer = array(transaction_data, "signers")
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("Transaction has no signer"))?;

    let protocols = swap_protocols(transaction_data);
    if protocols.is_empty() {
        bail!("No swap instructions found");
    }

    let changes = token_changes(transaction_data, signer)?;
    let leg = |(mint, (change, decimals)): (&String, &(i128, u8))| TokenLeg {
        mint: mint.clone(),
        amount: change.unsigned_abs(),
        decimals: *decimals,
    };
    let mut token_in = changes
        .iter()
        .filter(|(_, (change, _))| *change < 0)
        .max_by_key(|(_, (change, _))| change.unsigned_abs())
        .map(leg);
    let mut token_out = changes
        .iter()
        .filter(|(_, (change, _))| *change > 0)
        .max_by_key(|(_, (change, _))| change.unsigned_abs())
        .map(leg);

    let flow = swap_native_flow(transaction_data, signer);
    let native = native_change(transaction_data, signer, fee);
    if token_in.is_none() {
        token_in = match flow.sent {
            0 if native < 0 => Some(TokenLeg::native(native.unsigned_abs())),
            0 => None,
            sent => Some(TokenLeg::native(sent)),
        };
    }
    if token_out.is_none() {
        token_out = match flow.received {
            0 if native > 0 => Some(TokenLeg::native(native.unsigned_abs())),
            0 => None,
            received => Some(TokenLeg::native(received)),
        };
    }

    match (token_in, token_out) {
        (Some(token_in), Some(token_out)) => Ok(json!({
            "signer": signer,
            "protocols": protocols,
            "tokenIn": token_in.to_json(),
            "tokenOut": token_out.to_json(),
        })),
        _ => bail!("Unable to determine swap amounts for {signer}"),
    }
}
