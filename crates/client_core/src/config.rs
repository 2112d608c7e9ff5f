use std::{collections::HashMap, fs, path::Path};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use shared::domain::{Address, ChainId, TokenId};
use tracing::warn;
use url::Url;

use crate::controller::ControllerOptions;

pub const DEFAULT_SETTINGS_FILE: &str = "dao.toml";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub dao_name: String,
    pub gateway_url: String,
    pub wallet_rpc_url: String,
    pub app_address: Option<Address>,
    pub drop_address: Option<Address>,
    pub token_address: Option<Address>,
    pub vote_address: Option<Address>,
    pub supported_chain_id: u64,
    pub membership_token_id: String,
    pub token_decimals: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dao_name: "SurfDAO".into(),
            gateway_url: "http://127.0.0.1:8787".into(),
            wallet_rpc_url: "http://127.0.0.1:1248".into(),
            app_address: None,
            drop_address: None,
            token_address: None,
            vote_address: None,
            supported_chain_id: ChainId::RINKEBY.0,
            membership_token_id: "0".into(),
            token_decimals: 18,
        }
    }
}

impl Settings {
    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            supported_chain: ChainId(self.supported_chain_id),
            membership_token: TokenId::new(self.membership_token_id.clone()),
            token_decimals: self.token_decimals,
        }
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.gateway_url)
            .with_context(|| format!("invalid gateway_url '{}'", self.gateway_url))?;
        Url::parse(&self.wallet_rpc_url)
            .with_context(|| format!("invalid wallet_rpc_url '{}'", self.wallet_rpc_url))?;
        Ok(())
    }

    pub fn require(&self, key: &str) -> Result<Address> {
        let value = match key {
            "app_address" => &self.app_address,
            "drop_address" => &self.drop_address,
            "token_address" => &self.token_address,
            "vote_address" => &self.vote_address,
            other => return Err(anyhow!("unknown module address setting '{other}'")),
        };
        value.clone().ok_or_else(|| {
            anyhow!(
                "{key} is not configured; set it in {DEFAULT_SETTINGS_FILE} or DAO_{}",
                key.to_ascii_uppercase()
            )
        })
    }
}

/// Defaults, then `dao.toml` in the working directory, then environment.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();
    if let Ok(raw) = fs::read_to_string(DEFAULT_SETTINGS_FILE) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

pub fn load_settings_from(path: &Path) -> Result<Settings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
    let mut settings = Settings::default();
    apply_file(&mut settings, &raw);
    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) {
    match toml::from_str::<HashMap<String, toml::Value>>(raw) {
        Ok(file_cfg) => {
            for (key, value) in file_cfg {
                let value = match value {
                    toml::Value::String(s) => s,
                    other => other.to_string(),
                };
                apply_key(settings, &key, value);
            }
        }
        Err(err) => warn!(error = %err, "ignoring unparseable settings file"),
    }
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    const KEYS: &[&str] = &[
        "dao_name",
        "gateway_url",
        "wallet_rpc_url",
        "app_address",
        "drop_address",
        "token_address",
        "vote_address",
        "supported_chain_id",
        "membership_token_id",
        "token_decimals",
    ];

    for key in KEYS {
        let upper = key.to_ascii_uppercase();
        if let Some(v) = lookup(&format!("DAO_{upper}")) {
            apply_key(settings, key, v);
        }
        if let Some(v) = lookup(&format!("APP__{upper}")) {
            apply_key(settings, key, v);
        }
    }
}

fn apply_key(settings: &mut Settings, key: &str, value: String) {
    match key {
        "dao_name" => settings.dao_name = value,
        "gateway_url" => settings.gateway_url = value,
        "wallet_rpc_url" => settings.wallet_rpc_url = value,
        "app_address" => settings.app_address = parse_address(key, &value),
        "drop_address" => settings.drop_address = parse_address(key, &value),
        "token_address" => settings.token_address = parse_address(key, &value),
        "vote_address" => settings.vote_address = parse_address(key, &value),
        "supported_chain_id" => {
            if let Ok(parsed) = value.trim().parse::<u64>() {
                settings.supported_chain_id = parsed;
            } else {
                warn!(key, value = %value, "ignoring non-numeric setting");
            }
        }
        "membership_token_id" => settings.membership_token_id = value,
        "token_decimals" => {
            if let Ok(parsed) = value.trim().parse::<u32>() {
                settings.token_decimals = parsed;
            } else {
                warn!(key, value = %value, "ignoring non-numeric setting");
            }
        }
        other => warn!(key = other, "ignoring unknown setting"),
    }
}

fn parse_address(key: &str, value: &str) -> Option<Address> {
    match Address::parse(value) {
        Ok(address) => Some(address),
        Err(err) => {
            warn!(key, error = %err, "ignoring invalid address setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_values_override_defaults() {
        let mut settings = Settings::default();
        apply_file(
            &mut settings,
            r#"
gateway_url = "https://gateway.example/api"
drop_address = "0xC3107A142ee45118DaE15962a990A31FC03728C2"
supported_chain_id = 5
"#,
        );
        assert_eq!(settings.gateway_url, "https://gateway.example/api");
        assert_eq!(settings.supported_chain_id, 5);
        assert_eq!(
            settings.drop_address.as_ref().map(Address::as_str),
            Some("0xc3107a142ee45118dae15962a990a31fc03728c2")
        );
    }

    #[test]
    fn app_env_prefix_wins_over_dao_prefix() {
        let mut settings = Settings::default();
        let env: HashMap<&str, &str> = [
            ("DAO_TOKEN_DECIMALS", "6"),
            ("APP__TOKEN_DECIMALS", "8"),
            ("DAO_GATEWAY_URL", "http://10.0.0.1:9000"),
        ]
        .into_iter()
        .collect();
        apply_env(&mut settings, |key| env.get(key).map(|v| v.to_string()));
        assert_eq!(settings.token_decimals, 8);
        assert_eq!(settings.gateway_url, "http://10.0.0.1:9000");
    }

    #[test]
    fn invalid_values_are_ignored() {
        let mut settings = Settings::default();
        apply_key(&mut settings, "vote_address", "0x1234".into());
        apply_key(&mut settings, "supported_chain_id", "rinkeby".into());
        assert!(settings.vote_address.is_none());
        assert_eq!(settings.supported_chain_id, 4);
    }

    #[test]
    fn require_names_missing_setting() {
        let err = Settings::default()
            .require("token_address")
            .expect_err("missing");
        assert!(err.to_string().contains("DAO_TOKEN_ADDRESS"));
    }

    #[test]
    fn controller_options_follow_settings() {
        let mut settings = Settings::default();
        settings.supported_chain_id = 1;
        let options = settings.controller_options();
        assert_eq!(options.supported_chain, ChainId(1));
        assert_eq!(options.membership_token, TokenId::membership());
        assert_eq!(options.token_decimals, 18);
    }

    #[test]
    fn validate_rejects_bad_urls() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());
        settings.wallet_rpc_url = "::nope".into();
        assert!(settings.validate().is_err());
    }
}
