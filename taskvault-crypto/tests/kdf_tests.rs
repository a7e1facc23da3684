use taskvault_crypto::{
    derive_field_key, CryptoError, MasterKey, Salt, KEY_SIZE, MIN_MASTER_KEY_SIZE,
};
use uuid::Uuid;

fn test_master() -> MasterKey {
    MasterKey::new(vec![0x55u8; 32]).unwrap()
}

#[test]
fn derivation_is_deterministic() {
    let master = test_master();
    let user = Uuid::new_v4();
    let salt = Salt::from_bytes([7u8; 16]);

    let k1 = derive_field_key(&master, user, &salt).unwrap();
    let k2 = derive_field_key(&master, user, &salt).unwrap();

    assert_eq!(k1.as_bytes(), k2.as_bytes());
}

#[test]
fn derived_key_is_full_size() {
    let key = derive_field_key(&test_master(), Uuid::new_v4(), &Salt::random()).unwrap();
    assert_eq!(key.as_bytes().len(), KEY_SIZE);
}

#[test]
fn different_users_get_different_keys() {
    let master = test_master();
    let salt = Salt::from_bytes([7u8; 16]);

    let k1 = derive_field_key(&master, Uuid::new_v4(), &salt).unwrap();
    let k2 = derive_field_key(&master, Uuid::new_v4(), &salt).unwrap();

    assert_ne!(k1.as_bytes(), k2.as_bytes());
}

#[test]
fn different_salts_get_different_keys() {
    let master = test_master();
    let user = Uuid::new_v4();

    let k1 = derive_field_key(&master, user, &Salt::from_bytes([1u8; 16])).unwrap();
    let k2 = derive_field_key(&master, user, &Salt::from_bytes([2u8; 16])).unwrap();

    assert_ne!(k1.as_bytes(), k2.as_bytes());
}

#[test]
fn different_masters_get_different_keys() {
    let user = Uuid::new_v4();
    let salt = Salt::from_bytes([7u8; 16]);

    let m1 = MasterKey::new(vec![0x01u8; 32]).unwrap();
    let m2 = MasterKey::new(vec![0x02u8; 32]).unwrap();

    let k1 = derive_field_key(&m1, user, &salt).unwrap();
    let k2 = derive_field_key(&m2, user, &salt).unwrap();

    assert_ne!(k1.as_bytes(), k2.as_bytes());
}

#[test]
fn short_master_key_rejected() {
    let result = MasterKey::new(vec![0u8; MIN_MASTER_KEY_SIZE - 1]);
    assert!(matches!(
        result,
        Err(CryptoError::MasterKeyTooShort { minimum: 32, actual: 31 })
    ));
}

#[test]
fn long_master_key_accepted() {
    let master = MasterKey::new(vec![0u8; 64]).unwrap();
    assert_eq!(master.as_bytes().len(), 64);
}

#[test]
fn random_salts_differ() {
    let s1 = Salt::random();
    let s2 = Salt::random();
    assert_ne!(s1, s2);
}

#[test]
fn salt_from_slice_roundtrip() {
    let salt = Salt::random();
    let restored = Salt::from_slice(salt.as_bytes()).unwrap();
    assert_eq!(restored, salt);
}

#[test]
fn salt_from_slice_rejects_wrong_length() {
    let result = Salt::from_slice(&[0u8; 15]);
    assert!(matches!(
        result,
        Err(CryptoError::InvalidSaltLength { expected: 16, actual: 15 })
    ));
}
