// Tests for identity parsing and handle behavior

use std::collections::HashSet;

#[test]
fn test_identity_parse_with_version() {
    let identity: Identity = "com.example:core:1.0".parse().unwrap();
    assert_eq!(identity.group(), "com.example");
    assert_eq!(identity.artifact(), "core");
    assert_eq!(identity.version(), Some("1.0"));
    assert_eq!(identity.to_string(), "com.example:core:1.0");
}

#[test]
fn test_identity_parse_without_version() {
    let identity: Identity = "  com.example:core ".parse().unwrap();
    assert_eq!(identity.version(), None);
    assert_eq!(identity, Identity::new("com.example", "core"));
}

#[test]
fn test_identity_version_is_part_of_equality() {
    let unversioned = Identity::new("com.example", "core");
    let versioned = Identity::new("com.example", "core").with_version("1.0");
    assert_ne!(unversioned, versioned);
}

#[test]
fn test_identity_parse_errors() {
    assert_eq!("".parse::<Identity>(), Err(IdentityError::Empty));
    assert!(matches!(
        "just-a-name".parse::<Identity>(),
        Err(IdentityError::InvalidFormat { .. })
    ));
    assert!(matches!(
        "a:b:c:d".parse::<Identity>(),
        Err(IdentityError::InvalidFormat { .. })
    ));
    assert!(matches!(
        ":core".parse::<Identity>(),
        Err(IdentityError::EmptyPart { part: "group", .. })
    ));
    assert!(matches!(
        "com.example:core:".parse::<Identity>(),
        Err(IdentityError::EmptyPart { part: "version", .. })
    ));
}

#[test]
fn test_identity_serde_as_string() {
    let identity = Identity::new("com.example", "core").with_version("2");
    let json = serde_json::to_string(&identity).unwrap();
    assert_eq!(json, "\"com.example:core:2\"");

    let back: Identity = serde_json::from_str(&json).unwrap();
    assert_eq!(back, identity);

    let bad: Result<Identity, _> = serde_json::from_str("\"broken\"");
    assert!(bad.is_err());
}

#[test]
fn test_module_handle_equality_and_hashing() {
    let a = ModuleHandle::new("app");
    let b = ModuleHandle::from("app".to_string());
    let c = ModuleHandle::from("lib");

    assert_eq!(a, b);
    assert_ne!(a, c);

    let set: HashSet<ModuleHandle> = [a.clone(), b, c].into_iter().collect();
    assert_eq!(set.len(), 2);
    assert_eq!(a.as_str(), "app");
    assert_eq!(format!("{}", a), "app");
}
