//! Minimal ABI encoding of constructor arguments.
//!
//! Constructor arguments arrive as a JSON array (after placeholder
//! expansion) and are encoded against the constructor's ABI inputs, then
//! appended to the deployment bytecode. Only statically-sized types are
//! supported; contracts with dynamic constructor arguments must be deployed
//! with pre-linked bytecode.

use alloy_core::primitives::U256;
use serde_json::Value;

use crate::contract::AbiParam;
use crate::error::{Error, Result};

const WORD: usize = 32;

/// Encode a JSON argument array against the constructor `inputs`.
///
/// An empty or blank `json_params` is treated as no arguments.
pub fn encode_constructor_args(inputs: &[AbiParam], json_params: &str) -> Result<Vec<u8>> {
    let params = json_params.trim();
    let values: Vec<Value> = if params.is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(params)
            .map_err(|err| Error::Options(format!("constructor params must be a JSON array: {err}")))?
    };

    if values.len() != inputs.len() {
        return Err(Error::Options(format!(
            "constructor expects {} argument(s), got {}",
            inputs.len(),
            values.len()
        )));
    }

    let mut encoded = Vec::with_capacity(values.len() * WORD);
    for (input, value) in inputs.iter().zip(&values) {
        let word = encode_word(input, value)?;
        encoded.extend_from_slice(&word);
    }

    Ok(encoded)
}

fn encode_word(input: &AbiParam, value: &Value) -> Result<[u8; WORD]> {
    let kind = input.kind.as_str();

    if kind == "address" {
        return encode_address(input, value);
    }
    if kind == "bool" {
        let b = value
            .as_bool()
            .ok_or_else(|| type_mismatch(input, value))?;
        let mut word = [0u8; WORD];
        word[WORD - 1] = b as u8;
        return Ok(word);
    }
    if kind.starts_with("uint") || kind.starts_with("int") {
        return encode_uint(input, value);
    }
    if let Some(n) = kind.strip_prefix("bytes").and_then(|n| n.parse::<usize>().ok()) {
        return encode_fixed_bytes(input, value, n);
    }

    Err(Error::Options(format!(
        "unsupported constructor argument type {} for {}",
        input.kind, input.name
    )))
}

fn encode_address(input: &AbiParam, value: &Value) -> Result<[u8; WORD]> {
    let s = value.as_str().ok_or_else(|| type_mismatch(input, value))?;
    let bytes = decode_hex(input, s)?;
    if bytes.len() != 20 {
        return Err(Error::Options(format!(
            "argument {} is not a 20-byte address: {s}",
            input.name
        )));
    }

    let mut word = [0u8; WORD];
    word[WORD - 20..].copy_from_slice(&bytes);
    Ok(word)
}

fn encode_uint(input: &AbiParam, value: &Value) -> Result<[u8; WORD]> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().map(U256::from),
        // Large values may arrive as decimal or 0x-hex strings.
        Value::String(s) => {
            let s = s.trim();
            if let Some(hex) = s.strip_prefix("0x") {
                U256::from_str_radix(hex, 16).ok()
            } else {
                U256::from_str_radix(s, 10).ok()
            }
        }
        _ => None,
    };

    let parsed = parsed.ok_or_else(|| type_mismatch(input, value))?;
    Ok(parsed.to_be_bytes::<WORD>())
}

fn encode_fixed_bytes(input: &AbiParam, value: &Value, n: usize) -> Result<[u8; WORD]> {
    if n == 0 || n > WORD {
        return Err(Error::Options(format!(
            "unsupported constructor argument type {} for {}",
            input.kind, input.name
        )));
    }

    let s = value.as_str().ok_or_else(|| type_mismatch(input, value))?;
    let bytes = decode_hex(input, s)?;
    if bytes.len() != n {
        return Err(Error::Options(format!(
            "argument {} expects {n} byte(s), got {}",
            input.name,
            bytes.len()
        )));
    }

    let mut word = [0u8; WORD];
    word[..n].copy_from_slice(&bytes);
    Ok(word)
}

fn decode_hex(input: &AbiParam, s: &str) -> Result<Vec<u8>> {
    hex::decode(s.strip_prefix("0x").unwrap_or(s))
        .map_err(|err| Error::Options(format!("argument {} is not valid hex: {err}", input.name)))
}

fn type_mismatch(input: &AbiParam, value: &Value) -> Error {
    Error::Options(format!(
        "argument {} does not match ABI type {}: {value}",
        input.name, input.kind
    ))
}
