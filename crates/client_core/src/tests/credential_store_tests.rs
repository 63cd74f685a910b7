use shared::{
    domain::{Role, UserId},
    protocol::User,
};

use super::*;

fn credential() -> StoredCredential {
    StoredCredential {
        user: User {
            id: UserId(4),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            phone_number: Some("555-0101".into()),
            role: Some(Role::Admin),
        },
        token: Some("opaque".into()),
    }
}

#[test]
fn file_store_round_trips_and_clears() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileCredentialStore::new(dir.path().join("nested").join("session.json"));

    assert_eq!(store.load().expect("empty load"), None);
    store.save(&credential()).expect("save");
    assert_eq!(store.load().expect("load"), Some(credential()));

    let raw = std::fs::read_to_string(store.path()).expect("raw");
    assert!(raw.contains("\"ADMIN\""));
    assert!(!raw.to_lowercase().contains("password"));

    store.clear().expect("clear");
    store.clear().expect("clearing twice is fine");
    assert_eq!(store.load().expect("load after clear"), None);
}

#[test]
fn corrupt_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{ not json").expect("write");

    let err = FileCredentialStore::new(&path)
        .load()
        .expect_err("corrupt snapshot");
    assert!(err.to_string().contains("corrupt credential file"));
}

#[test]
fn memory_store_mirrors_file_semantics() {
    let store = MemoryCredentialStore::new();
    assert_eq!(store.load().expect("empty"), None);
    store.save(&credential()).expect("save");
    assert_eq!(store.load().expect("load"), Some(credential()));
    store.clear().expect("clear");
    assert_eq!(store.raw(), None);

    let corrupt = MemoryCredentialStore::with_raw("[]");
    assert!(corrupt.load().is_err());
}

#[test]
fn debug_output_hides_the_token() {
    let rendered = format!("{:?}", credential());
    assert!(rendered.contains("<redacted>"));
    assert!(!rendered.contains("opaque"));
}
