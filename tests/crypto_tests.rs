//! Integration tests for the PassLocal crypto module.

use passlocal::crypto::kdf::MIN_MEMORY_KIB;
use passlocal::crypto::{
    decrypt, derive_master_key_with_params, encrypt, generate_salt, Argon2Params, MasterKey,
    NONCE_LEN, SALT_LEN, TAG_LEN,
};
use passlocal::PassLocalError;

/// Cheapest parameters Argon2 params validation accepts.
fn fast_params() -> Argon2Params {
    Argon2Params {
        memory_kib: MIN_MEMORY_KIB,
        iterations: 1,
        parallelism: 1,
    }
}

// ---------------------------------------------------------------------------
// Encryption round-trip
// ---------------------------------------------------------------------------

#[test]
fn encrypt_decrypt_roundtrip() {
    let key = MasterKey::new([0xABu8; 32]);
    let plaintext = br#"{"version":1,"folders":[],"secrets":[]}"#;

    let sealed = encrypt(&key, plaintext, b"aad").expect("encrypt should succeed");
    assert_eq!(sealed.ciphertext.len(), plaintext.len());
    assert_eq!(sealed.nonce.len(), NONCE_LEN);
    assert_eq!(sealed.tag.len(), TAG_LEN);

    let recovered = decrypt(&key, &sealed.nonce, &sealed.ciphertext, &sealed.tag, b"aad")
        .expect("decrypt should succeed");
    assert_eq!(recovered.as_slice(), plaintext);
}

#[test]
fn encrypt_uses_fresh_nonce_each_time() {
    let key = MasterKey::new([0xCDu8; 32]);
    let plaintext = b"same payload";

    let a = encrypt(&key, plaintext, b"").expect("encrypt 1");
    let b = encrypt(&key, plaintext, b"").expect("encrypt 2");

    assert_ne!(a.nonce, b.nonce, "nonces must never repeat under one key");
    assert_ne!(a.ciphertext, b.ciphertext);
}

#[test]
fn decrypt_with_wrong_key_fails() {
    let key = MasterKey::new([0x11u8; 32]);
    let wrong_key = MasterKey::new([0x22u8; 32]);

    let sealed = encrypt(&key, b"top secret", b"").expect("encrypt");
    let result = decrypt(&wrong_key, &sealed.nonce, &sealed.ciphertext, &sealed.tag, b"");

    assert!(matches!(result, Err(PassLocalError::AuthenticationFailed)));
}

#[test]
fn any_single_bit_flip_fails() {
    let key = MasterKey::new([0xBBu8; 32]);
    let sealed = encrypt(&key, b"a value worth protecting", b"hdr").expect("encrypt");

    for i in 0..sealed.ciphertext.len() {
        let mut ct = sealed.ciphertext.clone();
        ct[i] ^= 0x01;
        assert!(
            decrypt(&key, &sealed.nonce, &ct, &sealed.tag, b"hdr").is_err(),
            "flipped ciphertext byte {i} must fail the auth check"
        );
    }

    let mut tag = sealed.tag;
    tag[0] ^= 0x80;
    assert!(decrypt(&key, &sealed.nonce, &sealed.ciphertext, &tag, b"hdr").is_err());

    let mut nonce = sealed.nonce;
    nonce[11] ^= 0x01;
    assert!(decrypt(&key, &nonce, &sealed.ciphertext, &sealed.tag, b"hdr").is_err());
}

#[test]
fn decrypt_rejects_wrong_sized_parts() {
    let key = MasterKey::new([0x01u8; 32]);
    let sealed = encrypt(&key, b"x", b"").expect("encrypt");

    let short_nonce = &sealed.nonce[..8];
    assert!(matches!(
        decrypt(&key, short_nonce, &sealed.ciphertext, &sealed.tag, b""),
        Err(PassLocalError::AuthenticationFailed)
    ));
    let short_tag = &sealed.tag[..15];
    assert!(matches!(
        decrypt(&key, &sealed.nonce, &sealed.ciphertext, short_tag, b""),
        Err(PassLocalError::AuthenticationFailed)
    ));
}

// ---------------------------------------------------------------------------
// Key derivation (Argon2id)
// ---------------------------------------------------------------------------

#[test]
fn same_inputs_same_key() {
    let salt = generate_salt();

    let k1 = derive_master_key_with_params(b"correct-horse", &salt, &fast_params()).expect("derive 1");
    let k2 = derive_master_key_with_params(b"correct-horse", &salt, &fast_params()).expect("derive 2");

    assert_eq!(k1.as_bytes(), k2.as_bytes());
}

#[test]
fn different_salts_different_keys() {
    let k1 = derive_master_key_with_params(b"pw", &generate_salt(), &fast_params()).expect("derive 1");
    let k2 = derive_master_key_with_params(b"pw", &generate_salt(), &fast_params()).expect("derive 2");

    assert_ne!(k1.as_bytes(), k2.as_bytes());
}

#[test]
fn different_passwords_different_keys() {
    let salt = generate_salt();

    let k1 = derive_master_key_with_params(b"password-one", &salt, &fast_params()).expect("derive 1");
    let k2 = derive_master_key_with_params(b"password-two", &salt, &fast_params()).expect("derive 2");

    assert_ne!(k1.as_bytes(), k2.as_bytes());
}

#[test]
fn different_params_different_keys() {
    let salt = generate_salt();
    let slower = Argon2Params {
        iterations: 2,
        ..fast_params()
    };

    let k1 = derive_master_key_with_params(b"pw", &salt, &fast_params()).expect("derive 1");
    let k2 = derive_master_key_with_params(b"pw", &salt, &slower).expect("derive 2");

    assert_ne!(k1.as_bytes(), k2.as_bytes());
}

#[test]
fn salt_has_expected_length_and_varies() {
    let a = generate_salt();
    let b = generate_salt();
    assert_eq!(a.len(), SALT_LEN);
    assert_ne!(a, b);
}

// ---------------------------------------------------------------------------
// End-to-end: password -> key -> encrypt/decrypt
// ---------------------------------------------------------------------------

#[test]
fn password_pipeline_roundtrip() {
    let salt = generate_salt();
    let key = derive_master_key_with_params(b"hunter2", &salt, &fast_params()).expect("derive");

    let sealed = encrypt(&key, b"s3cr3t", &salt).expect("encrypt");

    let again = derive_master_key_with_params(b"hunter2", &salt, &fast_params()).expect("derive");
    let recovered = decrypt(&again, &sealed.nonce, &sealed.ciphertext, &sealed.tag, &salt)
        .expect("decrypt");
    assert_eq!(recovered.as_slice(), b"s3cr3t");

    let wrong = derive_master_key_with_params(b"hunter3", &salt, &fast_params()).expect("derive");
    assert!(decrypt(&wrong, &sealed.nonce, &sealed.ciphertext, &sealed.tag, &salt).is_err());
}
