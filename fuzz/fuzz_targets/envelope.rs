//! Fuzz target for the envelope cipher
//!
//! Encrypt/decrypt must never panic, sealed data must always open with the
//! same key pair, and arbitrary bytes must never authenticate.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ske_crypto::envelope::{Envelope, Iv, decrypt, encrypt};
use ske_crypto::{ENVELOPE_OVERHEAD, KeyPair};

#[derive(Debug, Arbitrary)]
struct EnvelopeInput {
    enc_key: [u8; 32],
    mac_key: [u8; 32],
    iv: Option<[u8; 16]>,
    plaintext: Vec<u8>,
    flip: Option<(usize, u8)>,
}

fuzz_target!(|input: EnvelopeInput| {
    let keys = KeyPair::new(input.enc_key, input.mac_key);
    let iv = input.iv.map(Iv::from_bytes);

    // Only drawing a random IV can fail
    let sealed = match (encrypt(&input.plaintext, &keys, iv.as_ref()), iv) {
        (Ok(sealed), _) => Some(sealed),
        (Err(err), Some(_)) => panic!("encrypt with a fixed IV failed: {err}"),
        (Err(_), None) => None,
    };

    if let Some(mut sealed) = sealed {
        assert_eq!(sealed.len(), input.plaintext.len() + ENVELOPE_OVERHEAD);
        assert_eq!(decrypt(&sealed, &keys).as_deref(), Ok(input.plaintext.as_slice()));

        if let Some((position, bit)) = input.flip {
            let at = position % sealed.len();
            sealed[at] ^= 1 << (bit % 8);
            assert!(decrypt(&sealed, &keys).is_err());
        }
    }

    // Parsing arbitrary bytes must never panic
    if let Ok(envelope) = Envelope::parse(&input.plaintext) {
        let _ = envelope.plaintext_len();
        let _ = envelope.verify(&keys);
    }
});
