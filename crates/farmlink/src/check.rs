// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `farmlink check-config`: print the effective configuration with every
//! secret redacted.

use farmlink_config::FarmlinkConfig;
use farmlink_whatsapp::pool::build_accounts;

/// Run the `farmlink check-config` command.
pub fn run_check(config: &FarmlinkConfig) {
    print!("{}", summary(config));
}

fn set_or_missing(value: Option<&str>) -> &'static str {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => "set",
        _ => "missing",
    }
}

/// Human-readable summary of `config`. Tokens only ever appear as
/// `set` / `missing`.
fn summary(config: &FarmlinkConfig) -> String {
    let mut out = String::new();
    let mut line = |text: String| {
        out.push_str("  ");
        out.push_str(&text);
        out.push('\n');
    };

    line("farmlink check-config: configuration is valid".into());
    line("-".repeat(50));
    line(format!("listen:              {}:{}", config.server.host, config.server.port));
    line(format!(
        "public url:          {}",
        config.server.public_url.as_deref().unwrap_or("(derived from request headers)")
    ));
    line(format!("database:            {}", config.storage.database_path));
    line(format!("reply mode:          {:?}", config.whatsapp.reply_mode));
    line(format!("signature checks:    {}", config.whatsapp.validate_signatures));
    line(format!("media dir:           {}", config.whatsapp.media_dir));
    line(format!("grading service:     {}", config.grading.service_url));
    line(format!(
        "admin token:         {}",
        set_or_missing(config.admin.bearer_token.as_deref())
    ));

    let usable = build_accounts(&config.whatsapp.accounts);
    line(format!(
        "provider accounts:   {} declared, {} usable",
        config.whatsapp.accounts.len(),
        usable.len()
    ));
    for (index, account) in config.whatsapp.accounts.iter().enumerate() {
        let sid = account
            .account_sid
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("(no account sid)");
        let state = if usable.iter().any(|a| a.id() == sid) {
            "usable"
        } else {
            "skipped"
        };
        line(format!(
            "  #{index} {sid} token={} numbers=[{}] {state}",
            set_or_missing(account.auth_token.as_deref()),
            account.numbers.join(", ")
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_redacts_tokens() {
        let config = farmlink_config::load_and_validate_str(
            r#"
[admin]
bearer_token = "admin-secret"

[[whatsapp.accounts]]
account_sid = "AC1"
auth_token = "token-secret"
numbers = ["+14155238886"]

[[whatsapp.accounts]]
account_sid = "AC2"
numbers = ["+15550001111"]
"#,
        )
        .unwrap();

        let text = summary(&config);
        assert!(!text.contains("admin-secret"));
        assert!(!text.contains("token-secret"));
        assert!(text.contains("admin token:         set"));
        assert!(text.contains("2 declared, 1 usable"));
        assert!(text.contains("#0 AC1 token=set numbers=[+14155238886] usable"));
        assert!(text.contains("#1 AC2 token=missing numbers=[+15550001111] skipped"));
    }

    #[test]
    fn blank_values_count_as_missing() {
        assert_eq!(set_or_missing(Some("  ")), "missing");
        assert_eq!(set_or_missing(None), "missing");
        assert_eq!(set_or_missing(Some("x")), "set");
    }
}
