use anyhow::{Context, Result, anyhow};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use url::Url;

pub fn decode_base58_to_hex(data: &str) -> Result<String> {
    let bytes = bs58::decode(data)
        .into_vec()
        .map_err(|_| anyhow!("Invalid base58 data: {data}"))?;
    Ok(format!("0x{}", hex::encode(bytes)))
}

pub fn decode_base64_to_hex(data: &str) -> Result<String> {
    let bytes = STANDARD
        .decode(data)
        .map_err(|_| anyhow!("Invalid base64 data: {data}"))?;
    Ok(format!("0x{}", hex::encode(bytes)))
}

/// Signed difference between two raw token amounts as reported by the node.
pub fn amount_change(pre: &str, post: &str) -> Result<i128> {
    let pre: u64 = pre
        .parse()
        .with_context(|| format!("Invalid token amount: {pre}"))?;
    let post: u64 = post
        .parse()
        .with_context(|| format!("Invalid token amount: {post}"))?;
    Ok(post as i128 - pre as i128)
}

/// Strips credentials from an RPC url so it can be logged.
pub fn redact_url(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return "<invalid url>".to_string();
    };
    if url.query().is_some() {
        url.set_query(Some("redacted"));
    }
    if url.password().is_some() {
        url.set_password(Some("redacted")).ok();
    }
    url.to_string()
}
