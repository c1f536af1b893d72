use super::output::OperationObserver;
use crate::domain::{Address, Currency};
use crate::signer::ExternalSigner;
use std::fmt;
use std::sync::Arc;

/// Per-request overrides shared by every mutating operation.
#[derive(Clone, Default)]
pub struct OperationOptions {
    /// Account that pays and signs. Required alongside a custom signer.
    pub address: Option<Address>,
    pub signer: Option<Arc<dyn ExternalSigner>>,
    pub observer: Option<Arc<dyn OperationObserver>>,
}

impl fmt::Debug for OperationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationOptions")
            .field("address", &self.address)
            .field("signer", &self.signer.is_some())
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

/// Deposit or withdraw request.
#[derive(Debug, Clone)]
pub struct OperationRequest {
    pub currency: Currency,
    /// Amount in natural units, e.g. `"12.5"`.
    pub amount: String,
    pub options: OperationOptions,
}

impl OperationRequest {
    pub fn new(currency: Currency, amount: impl Into<String>) -> Self {
        Self {
            currency,
            amount: amount.into(),
            options: OperationOptions::default(),
        }
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.options.address = Some(address);
        self
    }

    pub fn with_signer(mut self, signer: Arc<dyn ExternalSigner>) -> Self {
        self.options.signer = Some(signer);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn OperationObserver>) -> Self {
        self.options.observer = Some(observer);
        self
    }
}

/// Transfer request; the currency is passed separately to `send`.
#[derive(Debug, Clone)]
pub struct SendRequest {
    pub recipient: Address,
    pub amount: String,
    pub options: OperationOptions,
}

impl SendRequest {
    pub fn new(recipient: Address, amount: impl Into<String>) -> Self {
        Self {
            recipient,
            amount: amount.into(),
            options: OperationOptions::default(),
        }
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.options.address = Some(address);
        self
    }

    pub fn with_signer(mut self, signer: Arc<dyn ExternalSigner>) -> Self {
        self.options.signer = Some(signer);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn OperationObserver>) -> Self {
        self.options.observer = Some(observer);
        self
    }
}
