//! Fuzz target for key derivation
//!
//! Derivation must be deterministic and must reject short secrets without
//! panicking.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ske_crypto::{DerivationKey, MIN_DERIVATION_KEY_SIZE, derive_key_pair};

#[derive(Debug, Arbitrary)]
struct KdfInput {
    secret: Vec<u8>,
    entropy: Vec<u8>,
}

fuzz_target!(|input: KdfInput| {
    let secret_len = input.secret.len();
    let Ok(secret) = DerivationKey::new(input.secret) else {
        assert!(secret_len < MIN_DERIVATION_KEY_SIZE);
        return;
    };

    let a = derive_key_pair(Some(input.entropy.as_slice()), &secret);
    let b = derive_key_pair(Some(input.entropy.as_slice()), &secret);
    assert_eq!(a, b);
});
