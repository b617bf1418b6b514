use serde::Deserialize;
use std::env;
use validator::Validate;

use crate::hub::DEFAULT_PROPOSAL_LIMIT;
use crate::models::DEFAULT_APP;

pub const DEFAULT_HUB: &str = "https://hub.snapshot.org";
pub const DEFAULT_SPACE: &str = "tolena.eth";
pub const DEFAULT_LIMIT: u32 = 9;
pub const DEFAULT_TOKEN_SYMBOL: &str = "TDX";
pub const DEFAULT_TOKEN_DECIMALS: u32 = 18;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct Config {
    #[validate(url)]
    pub hub: String,
    #[validate(length(min = 1))]
    pub space: String,
    /// 0 falls back to the hub default page size
    #[validate(range(max = 1000))]
    pub limit: u32,
    /// Numeric chain id or alias used when the space declares none
    pub network: Option<String>,
    pub app: String,
    #[validate(nested)]
    pub token: TokenConfig,
    #[validate(nested)]
    pub wallet: WalletConfig,
    /// Log filter; `None` keeps the crate default
    pub rust_log: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct TokenConfig {
    /// ERC-20 contract; balance display is off when unset
    pub address: Option<String>,
    pub symbol: String,
    #[validate(range(max = 28))]
    pub decimals: u32,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            address: None,
            symbol: DEFAULT_TOKEN_SYMBOL.to_string(),
            decimals: DEFAULT_TOKEN_DECIMALS,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct WalletConfig {
    /// JSON-RPC endpoint of an external wallet bridge
    pub rpc_url: Option<String>,
    #[validate(range(min = 1))]
    pub poll_interval_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let limit: u32 = match get("SNAPSHOT_LIMIT") {
            Some(v) => v.parse()?,
            None => DEFAULT_LIMIT,
        };
        let decimals: u32 = match get("TOKEN_DECIMALS") {
            Some(v) => v.parse()?,
            None => DEFAULT_TOKEN_DECIMALS,
        };
        let poll_interval_ms: u64 = match get("WALLET_POLL_MS") {
            Some(v) => v.parse()?,
            None => DEFAULT_POLL_INTERVAL_MS,
        };

        let config = Config {
            hub: get("SNAPSHOT_HUB").unwrap_or_else(|| DEFAULT_HUB.to_string()),
            space: get("SNAPSHOT_SPACE").unwrap_or_else(|| DEFAULT_SPACE.to_string()),
            limit,
            network: get("SNAPSHOT_NETWORK"),
            app: get("SNAPSHOT_APP").unwrap_or_else(|| DEFAULT_APP.to_string()),
            token: TokenConfig {
                address: get("TOKEN_ADDRESS"),
                symbol: get("TOKEN_SYMBOL").unwrap_or_else(|| DEFAULT_TOKEN_SYMBOL.to_string()),
                decimals,
            },
            wallet: WalletConfig {
                rpc_url: get("WALLET_RPC_URL"),
                poll_interval_ms,
            },
            rust_log: get("RUST_LOG"),
        };

        config.validate()?;
        Ok(config)
    }

    /// Page size actually requested from the hub
    pub fn effective_limit(&self) -> u32 {
        if self.limit == 0 {
            DEFAULT_PROPOSAL_LIMIT
        } else {
            self.limit
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.hub, DEFAULT_HUB);
        assert_eq!(config.space, "tolena.eth");
        assert_eq!(config.limit, 9);
        assert_eq!(config.effective_limit(), 9);
        assert_eq!(config.app, "snapshot-v2");
        assert_eq!(config.token.symbol, "TDX");
        assert_eq!(config.token.decimals, 18);
        assert!(config.token.address.is_none());
        assert!(config.network.is_none());
        assert!(config.wallet.rpc_url.is_none());
        assert_eq!(config.wallet.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        assert!(config.rust_log.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("SNAPSHOT_HUB", "https://testnet.hub.snapshot.org"),
            ("SNAPSHOT_SPACE", "other.eth"),
            ("SNAPSHOT_LIMIT", "0"),
            ("SNAPSHOT_NETWORK", "bsc"),
            ("TOKEN_ADDRESS", "0x00000000000000000000000000000000000000aa"),
            ("TOKEN_DECIMALS", "6"),
            ("WALLET_RPC_URL", "http://127.0.0.1:8545"),
        ])
        .unwrap();
        assert_eq!(config.space, "other.eth");
        assert_eq!(config.effective_limit(), DEFAULT_PROPOSAL_LIMIT);
        assert_eq!(config.network.as_deref(), Some("bsc"));
        assert_eq!(config.token.decimals, 6);
        assert_eq!(config.wallet.rpc_url.as_deref(), Some("http://127.0.0.1:8545"));
    }

    #[test]
    fn test_blank_values_fall_back() {
        let config = config(&[("SNAPSHOT_SPACE", "  "), ("TOKEN_ADDRESS", "")]).unwrap();
        assert_eq!(config.space, DEFAULT_SPACE);
        assert!(config.token.address.is_none());
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(config(&[("SNAPSHOT_HUB", "not a url")]).is_err());
        assert!(config(&[("SNAPSHOT_LIMIT", "5000")]).is_err());
        assert!(config(&[("SNAPSHOT_LIMIT", "many")]).is_err());
        assert!(config(&[("TOKEN_DECIMALS", "40")]).is_err());
        assert!(config(&[("WALLET_POLL_MS", "0")]).is_err());
    }

    #[test]
    fn test_poll_interval_and_log_filter() {
        let config = config(&[("WALLET_POLL_MS", "500"), ("RUST_LOG", "snapshot_vote=debug")]).unwrap();
        assert_eq!(config.wallet.poll_interval_ms, 500);
        assert_eq!(config.rust_log.as_deref(), Some("snapshot_vote=debug"));
    }
}
