use taskvault_crypto::{hash_password, verify_password};

#[test]
fn hash_verify_roundtrip() {
    let hash = hash_password("correct-horse-battery-staple").unwrap();
    assert!(verify_password("correct-horse-battery-staple", &hash));
}

#[test]
fn wrong_password_fails() {
    let hash = hash_password("correct-horse-battery-staple").unwrap();
    assert!(!verify_password("wrong-horse-battery-staple", &hash));
}

#[test]
fn hash_is_phc_format() {
    let hash = hash_password("some-password").unwrap();
    assert!(hash.starts_with("$argon2id$"), "got {hash}");
}

#[test]
fn same_password_hashes_differently() {
    // Random salt per hash
    let h1 = hash_password("same-password").unwrap();
    let h2 = hash_password("same-password").unwrap();
    assert_ne!(h1, h2);

    assert!(verify_password("same-password", &h1));
    assert!(verify_password("same-password", &h2));
}

#[test]
fn malformed_hash_verifies_false() {
    assert!(!verify_password("any-password", "not-a-phc-hash"));
    assert!(!verify_password("any-password", ""));
}
