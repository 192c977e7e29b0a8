use ethers_core::types::{Address, H256, U256};
use hexlink_core::chain::{GOERLI, MUMBAI};
use hexlink_core::utils::{keccak256, keccak256_h256, parse_address, to_checksum_address};
use hexlink_core::wallet::{derive_salt, normalize_amount_to_send, parse_amount, wallet_implementation_address};
use hexlink_core::{redpacket_id, RedPacket};
use proptest::prelude::*;

fn any_address() -> impl Strategy<Value = Address> {
    prop::array::uniform20(any::<u8>()).prop_map(Address::from)
}

fn any_email() -> impl Strategy<Value = String> {
    ("[a-z0-9._]{1,12}", "[a-z]{1,10}", "(com|io|org)").prop_map(|(local, domain, tld)| format!("{}@{}.{}", local, domain, tld))
}

fn any_packet() -> impl Strategy<Value = RedPacket> {
    (any_address(), prop::array::uniform32(any::<u8>()), any::<u64>(), any_address(), 1u32..1000, 0u8..3).prop_map(
        |(token, salt, balance, validator, split, mode)| RedPacket {
            token,
            salt: H256::from(salt),
            balance: U256::from(balance),
            validator,
            split,
            mode,
        },
    )
}

proptest! {
    #[test]
    fn salt_ignores_case_and_surrounding_whitespace(email in any_email(), pad in "[ \t\n]{0,3}") {
        let expected = keccak256_h256(format!("mailto:{}", email).as_bytes());
        prop_assert_eq!(derive_salt(&email), expected);

        let shouted = format!("{}{}{}", pad, email.to_ascii_uppercase(), pad);
        prop_assert_eq!(derive_salt(&shouted), expected);
    }

    #[test]
    fn distinct_emails_get_distinct_salts(a in any_email(), b in any_email()) {
        prop_assume!(a != b);
        prop_assert_ne!(derive_salt(&a), derive_salt(&b));
    }

    #[test]
    fn implementation_address_is_create2(admin in any_address(), bytecode in prop::collection::vec(any::<u8>(), 1..256)) {
        let mut preimage = vec![0xff];
        preimage.extend_from_slice(admin.as_bytes());
        preimage.extend_from_slice(&[0u8; 32]);
        preimage.extend_from_slice(&keccak256(&bytecode));
        let expected = Address::from_slice(&keccak256(&preimage)[12..]);

        prop_assert_eq!(wallet_implementation_address(admin, &bytecode), expected);
        prop_assert_eq!(wallet_implementation_address(admin, &bytecode), wallet_implementation_address(admin, &bytecode));
    }

    #[test]
    fn amount_normalization_is_exact(amount in any::<u64>(), decimals in 0u8..=30) {
        let expected = U256::from(amount) * U256::exp10(decimals as usize);
        prop_assert_eq!(normalize_amount_to_send(amount, decimals).unwrap(), expected);
        prop_assert_eq!(parse_amount(&amount.to_string(), decimals).unwrap(), expected);
    }

    #[test]
    fn redpacket_id_is_bound_to_chain_and_creator(packet in any_packet(), contract in any_address(), creator in any_address(), other in any_address()) {
        let id = redpacket_id(&GOERLI, contract, creator, &packet);
        prop_assert_eq!(id, redpacket_id(&GOERLI, contract, creator, &packet));
        prop_assert_ne!(id, redpacket_id(&MUMBAI, contract, creator, &packet));
        prop_assume!(other != creator);
        prop_assert_ne!(id, redpacket_id(&GOERLI, contract, other, &packet));
    }

    #[test]
    fn checksum_addresses_parse_back(bytes in prop::array::uniform20(any::<u8>())) {
        let checksummed = to_checksum_address(&bytes);
        prop_assert!(checksummed.starts_with("0x"));
        prop_assert_eq!(parse_address(&checksummed), Some(Address::from(bytes)));
        prop_assert_eq!(parse_address(&checksummed.to_ascii_lowercase()), Some(Address::from(bytes)));
    }
}

#[test]
fn amount_normalization_examples() {
    assert_eq!(normalize_amount_to_send(1, 6).unwrap(), U256::from(1_000_000u64));
    assert_eq!(normalize_amount_to_send(0, 18).unwrap(), U256::zero());
}
