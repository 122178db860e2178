//! Wallet storage on disk across key store instances.

use mint_bot::keystore::{load_or_generate_key, FileStore, KeySource, KeyStore, KeyStoreError};

mod common;
use common::{key_store_with_wallet, TEST_ADDRESS, TEST_PRIVATE_KEY};

#[test]
fn test_generated_key_unlocks_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let key_file = dir.path().join("wallets").join(".key");
    let wallets = dir.path().join("wallets");

    let (cipher, source) = load_or_generate_key(None, &key_file).unwrap();
    assert_eq!(source, KeySource::Generated);
    key_store_with_wallet(cipher, FileStore::open(&wallets).unwrap());

    // A later process finds the key file and the record
    let (cipher, source) = load_or_generate_key(None, &key_file).unwrap();
    assert_eq!(source, KeySource::KeyFile);
    let key_store = KeyStore::new(cipher, FileStore::open(&wallets).unwrap());

    let names: Vec<_> = key_store.list_wallets().unwrap().into_iter().map(|w| w.name).collect();
    assert_eq!(names, ["main"]);
    assert_eq!(key_store.unlock("main").unwrap().address().to_string(), TEST_ADDRESS);
}

#[test]
fn test_environment_key_takes_precedence() {
    let dir = tempfile::tempdir().unwrap();
    let key_file = dir.path().join(".key");
    let (file_cipher, _) = load_or_generate_key(None, &key_file).unwrap();

    let (env_cipher, _) = load_or_generate_key(None, &dir.path().join("other.key")).unwrap();
    let (cipher, source) = load_or_generate_key(Some(env_cipher.to_base64()), &key_file).unwrap();
    assert_eq!(source, KeySource::Environment);
    assert_eq!(cipher.to_base64(), env_cipher.to_base64());
    assert_ne!(cipher.to_base64(), file_cipher.to_base64());
}

#[test]
fn test_record_file_never_holds_plaintext_key() {
    let dir = tempfile::tempdir().unwrap();
    let (cipher, _) = load_or_generate_key(None, &dir.path().join(".key")).unwrap();
    key_store_with_wallet(cipher, FileStore::open(dir.path()).unwrap());

    let raw = std::fs::read_to_string(dir.path().join("main.json")).unwrap();
    let plain = TEST_PRIVATE_KEY.trim_start_matches("0x");
    assert!(!raw.contains(plain));
    assert!(raw.contains(TEST_ADDRESS));
}

#[test]
fn test_corrupted_record_fails_decryption() {
    let dir = tempfile::tempdir().unwrap();
    let (cipher, _) = load_or_generate_key(None, &dir.path().join(".key")).unwrap();
    let key_store = key_store_with_wallet(cipher, FileStore::open(dir.path()).unwrap());

    let path = dir.path().join("main.json");
    let mut record: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    record["private_key_encrypted"] = serde_json::json!("AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA");
    std::fs::write(&path, record.to_string()).unwrap();

    assert!(matches!(key_store.unlock("main"), Err(KeyStoreError::Decryption(_))));
}
