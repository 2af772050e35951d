// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the FarmLink configuration system.

use farmlink_config::diagnostic::ConfigError;
use farmlink_config::model::{FarmlinkConfig, ReplyMode};
use farmlink_config::{load_and_validate_str, load_config, load_config_from_str};
use figment::Jail;

/// Valid TOML with every section deserializes successfully.
#[test]
fn valid_toml_deserializes_into_farmlink_config() {
    let toml = r#"
[server]
host = "127.0.0.1"
port = 8080
log_level = "debug"
public_url = "https://farmlink.example.com"

[storage]
database_path = "/tmp/farmlink-test.db"
wal_mode = false

[whatsapp]
send_timeout_secs = 5
reply_mode = "api"
validate_signatures = true

[[whatsapp.accounts]]
account_sid = "AC1"
auth_token = "tok1"
numbers = ["whatsapp:+14155238886", "+14155238887"]

[grading]
service_url = "http://grader:5000"
timeout_secs = 3

[admin]
bearer_token = "s3cret"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8080);
    assert_eq!(
        config.server.public_url.as_deref(),
        Some("https://farmlink.example.com")
    );
    assert!(!config.storage.wal_mode);
    assert_eq!(config.whatsapp.reply_mode, ReplyMode::Api);
    assert!(config.whatsapp.validate_signatures);
    assert_eq!(config.whatsapp.accounts.len(), 1);
    assert_eq!(config.whatsapp.accounts[0].numbers.len(), 2);
    assert_eq!(config.grading.service_url, "http://grader:5000");
    assert_eq!(config.admin.bearer_token.as_deref(), Some("s3cret"));
}

#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config.server.port, 3001);
    assert_eq!(config.storage.database_path, "farmlink.db");
    assert!(config.whatsapp.accounts.is_empty());
    assert_eq!(config.whatsapp.send_timeout_secs, 15);
    assert_eq!(config.whatsapp.reply_mode, ReplyMode::Twiml);
    assert_eq!(config.grading.service_url, "http://localhost:5000");
    assert!(config.admin.bearer_token.is_none());
}

#[test]
fn unknown_key_gets_a_suggestion() {
    let toml = r#"
[grading]
servce_url = "http://grader:5000"
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "servce_url");
            assert_eq!(suggestion.as_deref(), Some("service_url"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn unknown_reply_mode_is_rejected() {
    let toml = r#"
[whatsapp]
reply_mode = "sms"
"#;
    assert!(load_config_from_str(toml).is_err());
}

#[test]
fn validation_errors_are_collected() {
    let toml = r#"
[server]
port = 0

[grading]
timeout_secs = 0
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert_eq!(errors.len(), 2);
    assert!(
        errors
            .iter()
            .all(|e| matches!(e, ConfigError::Validation { .. }))
    );
}

#[test]
fn prefixed_env_overrides_local_file() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "farmlink.toml",
            r#"
[server]
port = 4000

[whatsapp]
send_timeout_secs = 20
"#,
        )?;
        jail.set_env("FARMLINK_SERVER_PORT", "5000");
        jail.set_env("FARMLINK_WHATSAPP_SEND_TIMEOUT_SECS", "7");

        let config = load_config()?;
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.whatsapp.send_timeout_secs, 7);
        Ok(())
    });
}

#[test]
fn deployment_variables_override_file_but_not_prefixed_env() {
    Jail::expect_with(|jail| {
        jail.create_file("farmlink.toml", "[server]\nport = 4000\n")?;
        jail.set_env("PORT", "6000");
        jail.set_env("AI_SERVICE_URL", "http://ai:9000");
        jail.set_env("BACKEND_PUBLIC_URL", "https://api.example.com");

        let config = load_config()?;
        assert_eq!(config.server.port, 6000);
        assert_eq!(config.grading.service_url, "http://ai:9000");
        assert_eq!(
            config.server.public_url.as_deref(),
            Some("https://api.example.com")
        );

        jail.set_env("FARMLINK_SERVER_PORT", "7000");
        let config = load_config()?;
        assert_eq!(config.server.port, 7000);
        Ok(())
    });
}

#[test]
fn twilio_variables_append_after_toml_accounts() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "farmlink.toml",
            r#"
[[whatsapp.accounts]]
account_sid = "ACfile"
auth_token = "tokfile"
numbers = ["+15550000000"]
"#,
        )?;
        jail.set_env("TWILIO_ACCOUNT_SID", "ACenv1");
        jail.set_env("TWILIO_AUTH_TOKEN", "tokenv1");
        jail.set_env("TWILIO_WHATSAPP_NUMBER", "whatsapp:+14155238886");
        jail.set_env("TWILIO_ACCOUNT_SID_2", "ACenv2");
        jail.set_env("TWILIO_AUTH_TOKEN_2", "tokenv2");
        jail.set_env("TWILIO_WHATSAPP_NUMBER_2", "+14155550001,+14155550002");

        let config = load_config()?;
        let sids: Vec<_> = config
            .whatsapp
            .accounts
            .iter()
            .filter_map(|a| a.account_sid.as_deref())
            .collect();
        assert_eq!(sids, vec!["ACfile", "ACenv1", "ACenv2"]);
        assert_eq!(config.whatsapp.accounts[2].numbers.len(), 2);
        Ok(())
    });
}

#[test]
fn serialized_defaults_validate() {
    let config = FarmlinkConfig::default();
    assert!(farmlink_config::validation::validate_config(&config).is_ok());
}
