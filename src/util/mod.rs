pub mod hash;

pub use hash::{crypto_hash, crypto_hash_bytes, leading_zero_bits};
