pub mod fault_policy;
pub mod keystore;
pub mod wallet_service;

pub use fault_policy::{FaultAction, FaultPolicy};
pub use keystore::KeyStoreError;
pub use wallet_service::{WalletProvider, WalletService};
