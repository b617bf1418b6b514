// Wallet layer: EIP-1193 providers and the connection session
pub mod http_provider;
pub mod locator;
pub mod provider;
pub mod session;

pub use http_provider::HttpWalletProvider;
pub use locator::locate_provider;
pub use provider::{Eip1193Provider, ProviderError, RequestArguments, WalletBrand, WalletEvent};
pub use session::{short_address, WalletConnection, WalletSession};
