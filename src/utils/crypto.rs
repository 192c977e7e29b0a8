//! Hashing and address helpers shared by the deriver, the ABI layer and the CLI.

use ethers_core::types::{Address, H256};
use tiny_keccak::{Hasher, Keccak};

/// Keccak256 hash (used for salts, ids, topics and CREATE2)
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// Keccak256 as a typed 32-byte hash
pub fn keccak256_h256(data: &[u8]) -> H256 {
    H256::from(keccak256(data))
}

/// Convert raw address bytes to checksummed (EIP-55) Ethereum address
pub fn to_checksum_address(address: &[u8]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());

    let mut result = String::from("0x");
    for (i, ch) in lower.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };

        if ch.is_ascii_digit() || nibble < 8 {
            result.push(ch);
        } else {
            result.push(ch.to_ascii_uppercase());
        }
    }

    result
}

/// EIP-55 rendering of a typed address
pub fn checksum(address: &Address) -> String {
    to_checksum_address(address.as_bytes())
}

/// Strict address check: `0x` + 40 hex digits, and if mixed-case the EIP-55
/// checksum must hold.
pub fn is_address(candidate: &str) -> bool {
    let Some(body) = candidate.strip_prefix("0x").or_else(|| candidate.strip_prefix("0X")) else {
        return false;
    };
    if body.len() != 40 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }

    let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return match hex::decode(body) {
            Ok(bytes) => to_checksum_address(&bytes)[2..] == *body,
            Err(_) => false,
        };
    }
    true
}

/// Parse an address string that has passed `is_address`
pub fn parse_address(candidate: &str) -> Option<Address> {
    if !is_address(candidate) {
        return None;
    }
    let bytes = hex::decode(&candidate[2..]).ok()?;
    Some(Address::from_slice(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256() {
        let hash = keccak256(b"");
        assert_eq!(
            hex::encode(hash),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_checksum_address() {
        let addr_bytes = hex::decode("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        assert_eq!(
            to_checksum_address(&addr_bytes),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
    }

    #[test]
    fn test_is_address() {
        assert!(is_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"));
        assert!(is_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"));
        assert!(is_address("0x5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED"));
        // broken checksum
        assert!(!is_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD"));
        assert!(!is_address("alice@example.com"));
        assert!(!is_address("0x1234"));
        assert!(!is_address("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"));
    }

    #[test]
    fn test_parse_address() {
        let parsed = parse_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap();
        assert_eq!(checksum(&parsed), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
        assert!(parse_address("bob@example.com").is_none());
    }
}
