use serde_json::Value;
use sha2::{Digest, Sha256};

/// SHA-256 over the canonical form of `inputs`.
///
/// Each input is rendered as JSON (objects with sorted keys), the rendered
/// strings are sorted and joined with a single space before hashing, so the
/// digest does not depend on argument order. Every peer must hash exactly
/// this way or cross-node verification breaks.
pub fn crypto_hash_bytes(inputs: &[Value]) -> [u8; 32] {
    let mut parts: Vec<String> = inputs.iter().map(Value::to_string).collect();
    parts.sort();

    let mut hasher = Sha256::new();
    hasher.update(parts.join(" ").as_bytes());
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..]);
    out
}

/// Lowercase hex form of [`crypto_hash_bytes`].
pub fn crypto_hash(inputs: &[Value]) -> String {
    hex::encode(crypto_hash_bytes(inputs))
}

/// Number of leading zero bits in the binary expansion of a hex digest.
/// Malformed hex counts as zero bits.
pub fn leading_zero_bits(hash_hex: &str) -> u32 {
    let Ok(bytes) = hex::decode(hash_hex) else {
        return 0;
    };
    let mut total = 0u32;
    for b in &bytes {
        if *b == 0 {
            total += 8;
        } else {
            total += b.leading_zeros();
            break;
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn produces_sha256_hex() {
        let h = crypto_hash(&[json!("foo")]);
        assert_eq!(h.len(), 64);
        // sha256 of "\"foo\""
        assert_eq!(
            h,
            "b2213295d564916f89a6a42455567c87c3f480fcd7a1c15e220f17d7169a790b"
        );
    }

    #[test]
    fn same_hash_regardless_of_argument_order() {
        let a = crypto_hash(&[json!("one"), json!(2), json!(["three"])]);
        let b = crypto_hash(&[json!(["three"]), json!("one"), json!(2)]);
        assert_eq!(a, b);
    }

    #[test]
    fn hash_changes_with_object_content() {
        let a = crypto_hash(&[json!({ "a": 1 })]);
        let b = crypto_hash(&[json!({ "a": 2 })]);
        assert_ne!(a, b);
    }

    #[test]
    fn object_keys_are_order_independent() {
        let a: Value = serde_json::from_str(r#"{"x":1,"y":2}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"y":2,"x":1}"#).unwrap();
        assert_eq!(crypto_hash(&[a]), crypto_hash(&[b]));
    }

    #[test]
    fn counts_leading_zero_bits() {
        assert_eq!(leading_zero_bits(&"0".repeat(64)), 256);
        assert_eq!(leading_zero_bits("0f"), 4);
        assert_eq!(leading_zero_bits("0080"), 8);
        assert_eq!(leading_zero_bits("ff"), 0);
        assert_eq!(leading_zero_bits("not-hex"), 0);
    }
}
