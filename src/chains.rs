//! Static registry of EVM networks a proposal space may require.
//!
//! Each entry carries the parameters passed verbatim to
//! `wallet_addEthereumChain`, plus a table of string aliases used to resolve
//! the free-form `network` field of a space.

use serde::Serialize;

use crate::models::{NetworkId, Space};

/// Native currency descriptor for `wallet_addEthereumChain`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NativeCurrency {
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
}

/// Wallet-add parameters for a known network
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChainParams {
    /// Hex chain id (e.g. "0x38")
    pub chain_id: &'static str,
    pub chain_name: &'static str,
    pub rpc_urls: &'static [&'static str],
    pub native_currency: NativeCurrency,
    pub block_explorer_urls: &'static [&'static str],
}

const ETH: NativeCurrency = NativeCurrency {
    name: "ETH",
    symbol: "ETH",
    decimals: 18,
};

static CHAINS: &[(u64, ChainParams)] = &[
    (
        1,
        ChainParams {
            chain_id: "0x1",
            chain_name: "Ethereum",
            rpc_urls: &["https://rpc.ankr.com/eth"],
            native_currency: ETH,
            block_explorer_urls: &["https://etherscan.io"],
        },
    ),
    (
        56,
        ChainParams {
            chain_id: "0x38",
            chain_name: "BNB Smart Chain",
            rpc_urls: &["https://bsc-dataseed.binance.org"],
            native_currency: NativeCurrency {
                name: "BNB",
                symbol: "BNB",
                decimals: 18,
            },
            block_explorer_urls: &["https://bscscan.com"],
        },
    ),
    (
        97,
        ChainParams {
            chain_id: "0x61",
            chain_name: "BSC Testnet",
            rpc_urls: &["https://data-seed-prebsc-1-s1.binance.org:8545"],
            native_currency: NativeCurrency {
                name: "tBNB",
                symbol: "tBNB",
                decimals: 18,
            },
            block_explorer_urls: &["https://testnet.bscscan.com"],
        },
    ),
    (
        137,
        ChainParams {
            chain_id: "0x89",
            chain_name: "Polygon",
            rpc_urls: &["https://polygon-rpc.com"],
            native_currency: NativeCurrency {
                name: "MATIC",
                symbol: "MATIC",
                decimals: 18,
            },
            block_explorer_urls: &["https://polygonscan.com"],
        },
    ),
    (
        42161,
        ChainParams {
            chain_id: "0xa4b1",
            chain_name: "Arbitrum One",
            rpc_urls: &["https://arb1.arbitrum.io/rpc"],
            native_currency: ETH,
            block_explorer_urls: &["https://arbiscan.io"],
        },
    ),
    (
        11155111,
        ChainParams {
            chain_id: "0xaa36a7",
            chain_name: "Sepolia",
            rpc_urls: &["https://rpc.sepolia.org"],
            native_currency: ETH,
            block_explorer_urls: &["https://sepolia.etherscan.io"],
        },
    ),
];

static ALIASES: &[(&str, u64)] = &[
    ("1", 1),
    ("ethereum", 1),
    ("mainnet", 1),
    ("56", 56),
    ("bsc", 56),
    ("bnb", 56),
    ("bsc mainnet", 56),
    ("bnb smart chain", 56),
    ("97", 97),
    ("bsc-testnet", 97),
    ("137", 137),
    ("polygon", 137),
    ("matic", 137),
    ("42161", 42161),
    ("arbitrum", 42161),
    ("11155111", 11155111),
    ("sepolia", 11155111),
];

/// Look up wallet-add parameters for a chain id
pub fn chain_params(id: u64) -> Option<&'static ChainParams> {
    CHAINS
        .iter()
        .find(|(chain, _)| *chain == id)
        .map(|(_, params)| params)
}

/// Resolve a network alias (case-insensitive) to a chain id
pub fn resolve_alias(name: &str) -> Option<u64> {
    let needle = name.trim().to_lowercase();
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == needle)
        .map(|(_, id)| *id)
}

/// Display name for a chain id, falling back to `Chain <id>`
pub fn display_name(id: u64) -> String {
    chain_params(id)
        .map(|p| p.chain_name.to_string())
        .unwrap_or_else(|| format!("Chain {}", id))
}

/// Parse a wallet-reported chain id. Unparseable input yields 0.
pub fn parse_chain_id(raw: &str) -> u64 {
    let raw = raw.trim();
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => u64::from_str_radix(raw, 16),
    };
    parsed.unwrap_or(0)
}

/// The network a space requires votes to be signed on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredNetwork {
    pub id: u64,
    pub name: String,
}

impl RequiredNetwork {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            name: display_name(id),
        }
    }

    /// True when the registry can supply switch/add parameters
    pub fn is_known(&self) -> bool {
        chain_params(self.id).is_some()
    }
}

/// Resolve the required network from a space, then from a configured alias.
///
/// A positive numeric network is taken as-is even if the registry does not
/// know it; textual networks go through the alias table.
pub fn resolve_required_network(
    space: Option<&Space>,
    fallback_alias: Option<&str>,
) -> Option<RequiredNetwork> {
    let from_space = space
        .and_then(|s| s.network.as_ref())
        .and_then(|network| match network {
            NetworkId::Number(n) if *n > 0 => Some(*n),
            NetworkId::Number(_) => None,
            NetworkId::Name(name) => match name.trim().parse::<u64>() {
                Ok(n) if n > 0 => Some(n),
                _ => resolve_alias(name),
            },
        });

    from_space
        .or_else(|| fallback_alias.and_then(resolve_alias))
        .map(RequiredNetwork::new)
}
