pub mod api;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod msg;
pub mod network;
pub mod orchestration;
pub mod signer;

pub use client::{AnchorEarn, AnchorEarnBuilder};
pub use config::Config;
pub use domain::{Address, Coin, Currency, Decimal};
pub use error::{AppError, EarnError};
pub use ledger::{BroadcastResult, LcdClient, LedgerError, LedgerQuery, LedgerRpc, MockLedger};
pub use network::{AddressProvider, GasConfig, MarketContracts, NetworkConfig};
pub use orchestration::{
    BalanceOutput, MarketOutput, OperationObserver, OperationOutcome, OperationRequest,
    OutputRecord, SendRequest, TxType,
};
pub use signer::{ExternalSignature, ExternalSigner, KeySigner, MockKeySigner, SignedTransaction};
