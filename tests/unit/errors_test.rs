use edgetabs::types::errors::*;

// === HostError Tests ===

#[test]
fn host_error_tab_not_found_display() {
    let err = HostError::TabNotFound(42);
    assert_eq!(err.to_string(), "Tab not found: 42");
}

#[test]
fn host_error_display_variants() {
    assert_eq!(
        HostError::NoReceiver(7).to_string(),
        "No message receiver in tab: 7"
    );
    assert_eq!(
        HostError::Unavailable("tabs.query failed".to_string()).to_string(),
        "Host unavailable: tabs.query failed"
    );
    assert_eq!(
        HostError::Rejected("tabs.remove failed".to_string()).to_string(),
        "Host rejected request: tabs.remove failed"
    );
}

#[test]
fn host_error_implements_error_trait() {
    let err: Box<dyn std::error::Error> = Box::new(HostError::TabNotFound(1));
    assert!(err.source().is_none());
}

// === StorageError Tests ===

#[test]
fn storage_error_display_variants() {
    assert_eq!(
        StorageError::Database("disk full".to_string()).to_string(),
        "Storage database error: disk full"
    );
    assert_eq!(
        StorageError::Serialization("cachedTabs: expected array".to_string()).to_string(),
        "Storage serialization error: cachedTabs: expected array"
    );
    assert_eq!(
        StorageError::Unavailable("write refused".to_string()).to_string(),
        "Storage unavailable: write refused"
    );
}

// === EngineError Tests ===

#[test]
fn engine_error_is_transparent_over_host_and_storage() {
    let err: EngineError = HostError::TabNotFound(3).into();
    assert_eq!(err.to_string(), "Tab not found: 3");

    let err: EngineError = StorageError::Unavailable("read refused".to_string()).into();
    assert_eq!(err.to_string(), "Storage unavailable: read refused");
}

#[test]
fn engine_error_wraps_settings_error() {
    let err: EngineError = SettingsError::InvalidValue("fixedTabWidth".to_string()).into();
    assert_eq!(err.to_string(), "Invalid settings value: fixedTabWidth");
    assert!(matches!(err, EngineError::Settings(_)));
}

#[test]
fn engine_error_not_initialized_display() {
    assert_eq!(EngineError::NotInitialized.to_string(), "Engine not initialized");
}

// === SettingsError Tests ===

#[test]
fn settings_error_from_storage_error() {
    let err: SettingsError = StorageError::Unavailable("write refused".to_string()).into();
    assert_eq!(
        err.to_string(),
        "Settings storage error: Storage unavailable: write refused"
    );
}

// === ConfigError Tests ===

#[test]
fn config_error_display_variants() {
    assert_eq!(
        ConfigError::Io("permission denied".to_string()).to_string(),
        "Config I/O error: permission denied"
    );
    assert_eq!(
        ConfigError::Parse("expected value".to_string()).to_string(),
        "Config parse error: expected value"
    );
}
