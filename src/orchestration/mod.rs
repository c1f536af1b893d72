pub mod aggregate;
pub mod ensure;
pub mod orchestrator;
pub mod output;
pub mod request;

pub use aggregate::{
    Aggregator, BalanceEntry, BalanceOutput, MarketEntry, MarketOutput, BLOCKS_PER_YEAR,
};
pub use orchestrator::Orchestrator;
pub use output::{
    notify, Chain, ChannelObserver, ObserverError, OperationError, OperationObserver,
    OperationOutcome, OutputNormalizer, OutputRecord, TxDetails, TxStatus, TxType,
};
pub use request::{OperationOptions, OperationRequest, SendRequest};
