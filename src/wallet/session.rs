//! Connection session over a single, pinned provider
//!
//! The session (connected address + selected chain) is never persisted. It is
//! re-derived from the provider on every refresh and published through a
//! `watch` channel so ballots can re-evaluate their controls.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::{json, Value};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::locator::locate_provider;
use super::provider::Eip1193Provider;
use crate::chains::{self, chain_params};
use crate::config::TokenConfig;
use crate::error::VoteError;

/// ERC-20 `balanceOf(address)` selector
const BALANCE_OF_SELECTOR: &str = "0x70a08231";

/// Snapshot of the wallet as last observed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletSession {
    /// At most one connected address
    pub address: Option<String>,
    /// 0 when unknown
    pub chain_id: u64,
}

impl WalletSession {
    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }
}

/// Abbreviate an address as `0x1234…abcd`
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

/// Wallet connection bound to one provider for its whole lifetime
pub struct WalletConnection {
    provider: Option<Arc<dyn Eip1193Provider>>,
    state: watch::Sender<WalletSession>,
}

impl WalletConnection {
    /// Bind to a provider (or to none, in which case every call degrades to an empty result)
    pub fn new(provider: Option<Arc<dyn Eip1193Provider>>) -> Self {
        let (state, _) = watch::channel(WalletSession::default());
        Self { provider, state }
    }

    /// Locate the preferred provider among announced candidates and pin it
    pub fn from_candidates(candidates: &[Arc<dyn Eip1193Provider>]) -> Self {
        Self::new(locate_provider(candidates))
    }

    pub fn provider(&self) -> Option<&Arc<dyn Eip1193Provider>> {
        self.provider.as_ref()
    }

    pub fn has_wallet(&self) -> bool {
        self.provider.is_some()
    }

    /// Last published session
    pub fn current(&self) -> WalletSession {
        self.state.borrow().clone()
    }

    /// Subscribe to session changes
    pub fn watch(&self) -> watch::Receiver<WalletSession> {
        self.state.subscribe()
    }

    async fn call(&self, method: &str, params: Value) -> Option<Value> {
        let provider = self.provider.as_ref()?;
        match provider.request(method, params).await {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(method = method, error = %e, "Wallet request failed");
                None
            }
        }
    }

    /// Accounts already authorized for this origin
    pub async fn accounts(&self) -> Vec<String> {
        self.call("eth_accounts", json!([]))
            .await
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    /// Prompt the wallet for accounts
    pub async fn request_accounts(&self) -> Vec<String> {
        self.call("eth_requestAccounts", json!([]))
            .await
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    /// Ask the wallet to (re)select which accounts to expose
    pub async fn request_permissions(&self) {
        self.call("wallet_requestPermissions", json!([{ "eth_accounts": {} }]))
            .await;
    }

    /// First authorized account, if any
    pub async fn address(&self) -> Option<String> {
        self.accounts()
            .await
            .into_iter()
            .next()
            .filter(|a| !a.is_empty())
    }

    /// Currently selected chain, 0 when unknown
    pub async fn chain_id(&self) -> u64 {
        match self.call("eth_chainId", json!([])).await {
            Some(Value::String(hex)) => chains::parse_chain_id(&hex),
            Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
            _ => 0,
        }
    }

    /// Make sure the wallet is on `required`, switching (or adding then
    /// switching) as needed. Never errors; returns whether the wallet ended up
    /// on the required chain.
    ///
    /// Chains missing from the registry are not enforced.
    pub async fn ensure_chain(&self, required: u64) -> bool {
        let provider = match &self.provider {
            Some(p) if required != 0 => p,
            _ => return true,
        };

        let current = self.chain_id().await;
        if current == required {
            return true;
        }

        let params = match chain_params(required) {
            Some(params) => params,
            None => {
                warn!(chain_id = required, "Required chain is not in the registry, skipping enforcement");
                return true;
            }
        };

        info!(from = current, to = required, "Requesting network switch");
        let switch_params = json!([{ "chainId": params.chain_id }]);
        match provider
            .request("wallet_switchEthereumChain", switch_params.clone())
            .await
        {
            Ok(_) => true,
            Err(e) if e.is_unrecognized_chain() => {
                info!(chain_id = required, "Wallet does not know the chain, adding it");
                let add_params = match serde_json::to_value(params) {
                    Ok(v) => json!([v]),
                    Err(_) => return false,
                };
                if let Err(e) = provider.request("wallet_addEthereumChain", add_params).await {
                    warn!(chain_id = required, error = %e, "Adding chain failed");
                    return false;
                }
                match provider
                    .request("wallet_switchEthereumChain", switch_params)
                    .await
                {
                    Ok(_) => true,
                    Err(e) => {
                        warn!(chain_id = required, error = %e, "Switch after add failed");
                        false
                    }
                }
            }
            Err(e) if e.is_user_rejected() => {
                info!(chain_id = required, "User declined the network switch");
                false
            }
            Err(e) => {
                warn!(chain_id = required, error = %e, "Network switch failed");
                false
            }
        }
    }

    /// Re-derive the session from the provider and publish it
    pub async fn refresh(&self) -> WalletSession {
        let session = WalletSession {
            address: self.address().await,
            chain_id: self.chain_id().await,
        };
        self.state.send_replace(session.clone());
        session
    }

    /// Connect button: pick accounts, then request them
    pub async fn connect(&self) -> Result<WalletSession, VoteError> {
        if !self.has_wallet() {
            return Err(VoteError::NoWallet);
        }
        self.request_permissions().await;
        self.request_accounts().await;
        Ok(self.refresh().await)
    }

    /// Disconnect button.
    ///
    /// Wallets expose no real disconnect; re-requesting permissions lets the
    /// user deselect accounts, and the session is re-derived afterwards.
    pub async fn disconnect(&self) -> WalletSession {
        self.request_permissions().await;
        self.refresh().await
    }

    /// Re-derive the session whenever the provider reports an account or
    /// chain change. Returns `None` if the provider emits no events.
    pub fn spawn_event_listener(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let mut events = self.provider.as_ref()?.subscribe()?;
        let connection = Arc::clone(self);

        Some(tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        debug!(event = ?event, "Wallet event received");
                        connection.refresh().await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped = skipped, "Wallet events lagged");
                        connection.refresh().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }))
    }

    /// Token balance line for the wallet info, e.g. `1,234.5 TDX`.
    ///
    /// Only read when a token is configured and the wallet sits on the
    /// required chain.
    pub async fn token_balance(
        &self,
        token: &TokenConfig,
        address: &str,
        required_chain: Option<u64>,
    ) -> Option<String> {
        if !self.has_wallet() || address.is_empty() {
            return None;
        }
        let contract = token.address.as_deref()?;

        if let Some(required) = required_chain {
            if self.chain_id().await != required {
                return None;
            }
        }

        let call = json!([
            { "to": contract, "data": balance_of_calldata(address) },
            "latest"
        ]);
        let raw = self.call("eth_call", call).await?;
        format_balance(raw.as_str()?, token.decimals, &token.symbol)
    }
}

fn balance_of_calldata(address: &str) -> String {
    let bare = address.trim_start_matches("0x").to_lowercase();
    format!("{}{:0>64}", BALANCE_OF_SELECTOR, bare)
}

/// Format a raw hex token amount with at most 2 fraction digits
pub fn format_balance(raw_hex: &str, decimals: u32, symbol: &str) -> Option<String> {
    let digits = raw_hex.trim().trim_start_matches("0x").trim_start_matches('0');
    let raw = if digits.is_empty() {
        0u128
    } else {
        u128::from_str_radix(digits, 16).ok()?
    };

    let amount = Decimal::try_from_i128_with_scale(i128::try_from(raw).ok()?, decimals)
        .ok()?
        .round_dp(2)
        .normalize();

    Some(format!("{} {}", group_thousands(&amount.to_string()), symbol))
}

fn group_thousands(number: &str) -> String {
    let (int_part, frac_part) = match number.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (number, None),
    };

    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac_part {
        Some(f) => format!("{}.{}", grouped, f),
        None => grouped,
    }
}
