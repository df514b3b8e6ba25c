//! Minimal Solidity ABI codec
//!
//! Covers the argument kinds the rewards contract uses: `address`,
//! `uint256` (held as `u128`) and `string`.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sha3::{Digest, Keccak256};

use crate::error::{AppError, AppResult};

pub const WORD: usize = 32;
pub const TOKEN_DECIMALS: u32 = 18;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Address([u8; 20]),
    Uint(u128),
    String(String),
}

/// First four bytes of `keccak256(signature)`
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&digest[..4]);
    out
}

fn uint_word(value: u128) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

fn address_word(address: &[u8; 20]) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[12..].copy_from_slice(address);
    word
}

/// Head/tail encoding of a call's arguments.
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let head_len = tokens.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        match token {
            Token::Address(address) => head.extend_from_slice(&address_word(address)),
            Token::Uint(value) => head.extend_from_slice(&uint_word(*value)),
            Token::String(text) => {
                head.extend_from_slice(&uint_word((head_len + tail.len()) as u128));
                let bytes = text.as_bytes();
                tail.extend_from_slice(&uint_word(bytes.len() as u128));
                tail.extend_from_slice(bytes);
                let padding = (WORD - bytes.len() % WORD) % WORD;
                tail.resize(tail.len() + padding, 0);
            }
        }
    }

    head.extend_from_slice(&tail);
    head
}

/// `0x`-prefixed calldata for `signature(tokens...)`
pub fn encode_call(signature: &str, tokens: &[Token]) -> String {
    let mut data = selector(signature).to_vec();
    data.extend_from_slice(&encode(tokens));
    format!("0x{}", hex::encode(data))
}

fn strip_0x(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

pub fn parse_address(value: &str) -> AppResult<[u8; 20]> {
    let raw = strip_0x(value);
    if raw.len() != 40 {
        return Err(AppError::validation(format!("invalid address '{}'", value)));
    }
    let bytes = hex::decode(raw)
        .map_err(|_| AppError::validation(format!("invalid address '{}'", value)))?;
    let mut address = [0u8; 20];
    address.copy_from_slice(&bytes);
    Ok(address)
}

pub fn format_address(address: &[u8; 20]) -> String {
    format!("0x{}", hex::encode(address))
}

/// Splits an `eth_call` result into 32-byte words.
pub fn decode_words(data: &str) -> AppResult<Vec<[u8; WORD]>> {
    let bytes = hex::decode(strip_0x(data))
        .map_err(|e| AppError::Blockchain(format!("malformed return data: {}", e)))?;
    if bytes.len() % WORD != 0 {
        return Err(AppError::Blockchain(format!(
            "return data length {} is not word aligned",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(WORD)
        .map(|chunk| {
            let mut word = [0u8; WORD];
            word.copy_from_slice(chunk);
            word
        })
        .collect())
}

pub fn word_to_uint(word: &[u8; WORD]) -> AppResult<u128> {
    if word[..16].iter().any(|b| *b != 0) {
        return Err(AppError::Blockchain(
            "uint256 value exceeds 128 bits".to_string(),
        ));
    }
    let mut low = [0u8; 16];
    low.copy_from_slice(&word[16..]);
    Ok(u128::from_be_bytes(low))
}

pub fn word_to_address(word: &[u8; WORD]) -> [u8; 20] {
    let mut address = [0u8; 20];
    address.copy_from_slice(&word[12..]);
    address
}

/// Token units to base units, truncating past 18 decimals.
pub fn to_wei(amount: Decimal) -> AppResult<u128> {
    if amount.is_sign_negative() {
        return Err(AppError::validation("token amount cannot be negative"));
    }
    let scale = Decimal::from(10u64.pow(TOKEN_DECIMALS));
    amount
        .checked_mul(scale)
        .and_then(|wei| wei.trunc().to_u128())
        .ok_or_else(|| AppError::validation(format!("token amount {} is too large", amount)))
}

pub fn from_wei(wei: u128) -> AppResult<Decimal> {
    let value = i128::try_from(wei)
        .map_err(|_| AppError::Blockchain(format!("token amount {} out of range", wei)))?;
    Decimal::try_from_i128_with_scale(value, TOKEN_DECIMALS)
        .map(|d| d.normalize())
        .map_err(|e| AppError::Blockchain(format!("token amount {} out of range: {}", wei, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_known_selectors() {
        assert_eq!(hex::encode(selector("transfer(address,uint256)")), "a9059cbb");
        assert_eq!(hex::encode(selector("balanceOf(address)")), "70a08231");
    }

    #[test]
    fn test_static_arguments() {
        let address = parse_address("0x00000000000000000000000000000000000000ff").unwrap();
        let data = encode(&[Token::Address(address), Token::Uint(1)]);
        assert_eq!(data.len(), 64);
        assert_eq!(data[31], 0xff);
        assert_eq!(data[63], 1);
    }

    #[test]
    fn test_string_argument_goes_to_tail() {
        let data = encode(&[Token::Uint(7), Token::String("abc".to_string())]);
        // head: uint, offset; tail: length, padded bytes
        assert_eq!(data.len(), 4 * WORD);
        assert_eq!(word_to_uint(&decode_words(&hex::encode(&data)).unwrap()[1]).unwrap(), 64);
        assert_eq!(data[3 * WORD - 1], 3);
        assert_eq!(&data[3 * WORD..3 * WORD + 3], b"abc");
        assert!(data[3 * WORD + 3..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_wei_conversion() {
        let amount = Decimal::from_str("84.38").unwrap();
        let wei = to_wei(amount).unwrap();
        assert_eq!(wei, 84_380_000_000_000_000_000);
        assert_eq!(from_wei(wei).unwrap(), amount);
        assert!(to_wei(Decimal::from(-1)).is_err());
    }

    #[test]
    fn test_decode_rejects_misaligned_data() {
        assert!(decode_words("0x1234").is_err());
        let words = decode_words(&format!("0x{}", "00".repeat(31) + "2a")).unwrap();
        assert_eq!(word_to_uint(&words[0]).unwrap(), 42);
    }

    #[test]
    fn test_bad_address() {
        assert!(parse_address("0x1234").is_err());
        assert!(parse_address(&format!("0x{}", "zz".repeat(20))).is_err());
    }
}
