//! Property-based tests for SKE
//!
//! Uses proptest to verify invariants across large input spaces.

use proptest::prelude::*;

// ============================================================================
// Envelope Properties
// ============================================================================

mod envelope_properties {
    use super::*;
    use ske_crypto::envelope::{Iv, decrypt, encrypt, envelope_len};
    use ske_crypto::{CryptoError, ENVELOPE_OVERHEAD, KeyPair};

    fn key_pair() -> impl Strategy<Value = KeyPair> {
        (any::<[u8; 32]>(), any::<[u8; 32]>()).prop_map(|(enc, mac)| KeyPair::new(enc, mac))
    }

    proptest! {
        /// Round trip: decrypt(encrypt(P, K), K) == P
        #[test]
        fn roundtrip(
            plaintext in prop::collection::vec(any::<u8>(), 0..4096),
            keys in key_pair(),
        ) {
            let sealed = encrypt(&plaintext, &keys, None).unwrap();
            prop_assert_eq!(decrypt(&sealed, &keys).unwrap(), plaintext);
        }

        /// Length law: len(encrypt(P, K)) == len(P) + 48
        #[test]
        fn length_law(len in 0usize..8192, iv in any::<[u8; 16]>()) {
            let keys = KeyPair::new([1; 32], [2; 32]);
            let sealed = encrypt(&vec![0u8; len], &keys, Some(&Iv::from_bytes(iv))).unwrap();
            prop_assert_eq!(sealed.len(), len + ENVELOPE_OVERHEAD);
            prop_assert_eq!(sealed.len(), envelope_len(len));
        }

        /// Flipping any single bit makes decryption fail authentication
        #[test]
        fn single_bit_flip_detected(
            plaintext in prop::collection::vec(any::<u8>(), 0..2048),
            position in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let keys = KeyPair::new([7; 32], [9; 32]);
            let mut sealed = encrypt(&plaintext, &keys, None).unwrap();
            let at = position.index(sealed.len());
            sealed[at] ^= 1 << bit;

            prop_assert_eq!(decrypt(&sealed, &keys), Err(CryptoError::AuthenticationFailed));
        }

        /// Anything shorter than the overhead is rejected before any crypto
        #[test]
        fn short_input_is_invalid(
            bytes in prop::collection::vec(any::<u8>(), 0..ENVELOPE_OVERHEAD),
        ) {
            let keys = KeyPair::new([3; 32], [4; 32]);
            let result = decrypt(&bytes, &keys);
            prop_assert!(matches!(result, Err(CryptoError::InvalidInput(_))));
        }

        /// Arbitrary bytes of a valid length never decrypt
        #[test]
        fn random_envelope_rejected(
            bytes in prop::collection::vec(any::<u8>(), ENVELOPE_OVERHEAD..512),
        ) {
            let keys = KeyPair::new([5; 32], [6; 32]);
            prop_assert_eq!(decrypt(&bytes, &keys), Err(CryptoError::AuthenticationFailed));
        }
    }
}

// ============================================================================
// Key Derivation Properties
// ============================================================================

mod derivation_properties {
    use super::*;
    use ske_crypto::{DerivationKey, KeyPair, derive_key_pair};
    use ske_integration_tests::test_secret;

    proptest! {
        /// Same entropy and secret always give the same key pair
        #[test]
        fn derivation_is_deterministic(entropy in prop::collection::vec(any::<u8>(), 0..256)) {
            let secret = test_secret();
            let a = derive_key_pair(Some(entropy.as_slice()), &secret).unwrap();
            let b = derive_key_pair(Some(entropy.as_slice()), &secret).unwrap();
            prop_assert_eq!(a, b);
        }

        /// Distinct entropy gives distinct key pairs
        #[test]
        fn distinct_entropy_distinct_keys(
            a in prop::collection::vec(any::<u8>(), 0..64),
            b in prop::collection::vec(any::<u8>(), 0..64),
        ) {
            prop_assume!(a != b);
            let secret = test_secret();
            prop_assert_ne!(
                KeyPair::derive(&a, &secret).unwrap(),
                KeyPair::derive(&b, &secret).unwrap()
            );
        }

        /// The secret separates domains: same entropy, different secrets
        #[test]
        fn secret_separates_domains(
            entropy in prop::collection::vec(any::<u8>(), 0..64),
            secret in prop::collection::vec(any::<u8>(), 32..96),
        ) {
            let other = DerivationKey::new(secret).unwrap();
            let ours = KeyPair::derive(&entropy, &test_secret()).unwrap();
            let theirs = KeyPair::derive(&entropy, &other).unwrap();
            prop_assert_ne!(ours, theirs);
        }

        /// Secrets below 32 bytes are refused
        #[test]
        fn short_secret_rejected(secret in prop::collection::vec(any::<u8>(), 0..32)) {
            prop_assert!(DerivationKey::new(secret).is_err());
        }

        /// Split order: bytes 0..32 are the encryption key, 32..64 the MAC key
        #[test]
        fn key_split_order(material in prop::collection::vec(any::<u8>(), 64)) {
            let keys = KeyPair::from_slice(&material).unwrap();
            prop_assert_eq!(&keys.enc_key()[..], &material[..32]);
            prop_assert_eq!(&keys.mac_key()[..], &material[32..]);
        }
    }

    #[test]
    fn random_key_pairs_differ() {
        let secret = test_secret();
        let a = derive_key_pair(None, &secret).unwrap();
        let b = derive_key_pair(None, &secret).unwrap();
        assert_ne!(a, b);
    }
}

// ============================================================================
// File Cipher Properties
// ============================================================================

mod file_properties {
    use super::*;
    use ske_crypto::envelope::Iv;
    use ske_files::{BufferedMapper, FileCipher, MmapMapper};
    use ske_integration_tests::{Workspace, fixed_keys};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Offset composition holds for any header length and payload
        #[test]
        fn offset_roundtrip(
            data in prop::collection::vec(any::<u8>(), 0..8192),
            header in prop::collection::vec(any::<u8>(), 0..300),
        ) {
            let ws = Workspace::new();
            let plain = ws.file("plain", &data);
            let sealed = ws.file("sealed", &header);
            let opened = ws.path("opened");
            let keys = fixed_keys();
            let offset = header.len() as u64;
            let cipher = FileCipher::new(MmapMapper);

            cipher.encrypt_file(&sealed, &plain, &keys, None, offset).unwrap();
            let bytes = ws.read(&sealed);
            prop_assert_eq!(&bytes[..header.len()], header.as_slice());

            cipher.decrypt_file(&opened, &sealed, &keys, offset).unwrap();
            prop_assert_eq!(ws.read(&opened), data);
        }

        /// Both backends write the same bytes for the same inputs
        #[test]
        fn backend_equivalence(
            data in prop::collection::vec(any::<u8>(), 0..8192),
            offset in 0u64..5000,
            iv in any::<[u8; 16]>(),
        ) {
            let ws = Workspace::new();
            let plain = ws.file("plain", &data);
            let a = ws.path("a");
            let b = ws.path("b");
            let keys = fixed_keys();
            let iv = Iv::from_bytes(iv);

            FileCipher::new(MmapMapper)
                .encrypt_file(&a, &plain, &keys, Some(&iv), offset)
                .unwrap();
            FileCipher::new(BufferedMapper)
                .encrypt_file(&b, &plain, &keys, Some(&iv), offset)
                .unwrap();

            prop_assert_eq!(ws.read(&a), ws.read(&b));
        }
    }
}
