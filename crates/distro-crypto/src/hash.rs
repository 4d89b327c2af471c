//! BLAKE3 hashing and canonical instruction payloads
//!
//! An instruction is signed over the BLAKE3 digest of an unambiguous
//! encoding of `(date, amount, recipient, nonce)`:
//!
//! ```text
//! len(domain) ‖ domain ‖ len(date) ‖ date ‖ len(8) ‖ amount_be ‖ len(recipient) ‖ recipient ‖ len(nonce) ‖ nonce
//! ```
//!
//! Every length is an 8-byte big-endian prefix, so no choice of field values
//! can shift bytes from one field into its neighbour.

/// Domain tag prepended to every instruction payload
pub const INSTRUCTION_DOMAIN: &[u8] = b"distro.instruction.v1";

/// Hash data using BLAKE3 (256-bit output)
pub fn hash_blake3(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Hash length-prefixed items together
pub fn hash_fields(items: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for item in items {
        hasher.update(&(item.len() as u64).to_be_bytes());
        hasher.update(item);
    }
    *hasher.finalize().as_bytes()
}

/// Canonical signing payload of one instruction
pub fn instruction_payload(date: &str, amount: u64, recipient: &str, nonce: &str) -> Vec<u8> {
    let amount_bytes = amount.to_be_bytes();
    let fields = instruction_fields(date, &amount_bytes, recipient, nonce);

    let mut out = Vec::with_capacity(fields.iter().map(|f| f.len() + 8).sum());
    for field in fields {
        out.extend_from_slice(&(field.len() as u64).to_be_bytes());
        out.extend_from_slice(field);
    }
    out
}

/// Digest that is actually signed
pub fn instruction_digest(date: &str, amount: u64, recipient: &str, nonce: &str) -> [u8; 32] {
    let amount_bytes = amount.to_be_bytes();
    hash_fields(&instruction_fields(date, &amount_bytes, recipient, nonce))
}

fn instruction_fields<'a>(
    date: &'a str,
    amount_be: &'a [u8; 8],
    recipient: &'a str,
    nonce: &'a str,
) -> [&'a [u8]; 5] {
    [
        INSTRUCTION_DOMAIN,
        date.as_bytes(),
        amount_be,
        recipient.as_bytes(),
        nonce.as_bytes(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_blake3_hash() {
        let hash1 = hash_blake3(b"test");
        let hash2 = hash_blake3(b"test");
        let hash3 = hash_blake3(b"different");

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
    }

    #[test]
    fn test_digest_matches_hashed_payload() {
        let payload = instruction_payload("2025-03-01", 500, "0xabc", "17");
        assert_eq!(
            instruction_digest("2025-03-01", 500, "0xabc", "17"),
            hash_blake3(&payload)
        );
        assert_eq!(
            hash_fields(&[INSTRUCTION_DOMAIN, b"2025-03-01", &500u64.to_be_bytes(), b"0xabc", b"17"]),
            hash_blake3(&payload)
        );
    }

    #[test]
    fn test_field_boundaries_are_unambiguous() {
        // Naive concatenation would make these two identical
        let a = instruction_digest("2025-03-01", 1, "0xab", "c1");
        let b = instruction_digest("2025-03-01", 1, "0xabc", "1");
        assert_ne!(a, b);
    }

    #[test]
    fn test_every_field_is_bound() {
        let base = instruction_digest("2025-03-01", 500, "0xabc", "17");
        assert_ne!(base, instruction_digest("2025-03-02", 500, "0xabc", "17"));
        assert_ne!(base, instruction_digest("2025-03-01", 501, "0xabc", "17"));
        assert_ne!(base, instruction_digest("2025-03-01", 500, "0xabd", "17"));
        assert_ne!(base, instruction_digest("2025-03-01", 500, "0xabc", "18"));
    }

    proptest! {
        #[test]
        fn prop_recipient_nonce_split_is_bound(
            recipient in "[a-f0-9]{1,16}",
            nonce in "[0-9]{1,8}",
            split in 0usize..8,
        ) {
            let joined = format!("{}{}", recipient, nonce);
            let cut = split.min(joined.len());
            let (r2, n2) = joined.split_at(cut);
            prop_assume!(r2 != recipient);
            prop_assert_ne!(
                instruction_digest("2025-03-01", 1, &recipient, &nonce),
                instruction_digest("2025-03-01", 1, r2, n2)
            );
        }
    }
}
