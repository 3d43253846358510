pub mod client;
pub mod contracts;
pub mod error;

pub use client::{parse_address, ChainOps, EvmChainClient};
pub use error::ChainError;
