//! Deterministic key signer for tests and dry runs.

use super::{Fee, KeySigner, SignedTransaction, SignerError, DEFAULT_GAS_WANTED};
use crate::domain::Address;
use crate::msg::Msg;
use crate::network::GasConfig;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// Signs with a fake "signature": the hex digest of address and payload.
#[derive(Debug, Clone)]
pub struct MockKeySigner {
    address: Address,
}

impl MockKeySigner {
    pub fn new(address: Address) -> Self {
        Self { address }
    }
}

#[async_trait]
impl KeySigner for MockKeySigner {
    fn address(&self) -> &Address {
        &self.address
    }

    async fn sign(&self, msgs: &[Msg], gas: &GasConfig) -> Result<SignedTransaction, SignerError> {
        if let Some(foreign) = msgs.iter().find(|m| m.signer() != &self.address) {
            return Err(SignerError::Rejected(format!(
                "message signer {} does not match key {}",
                foreign.signer(),
                self.address
            )));
        }

        let payload = serde_json::to_vec(msgs).map_err(|e| SignerError::Other(e.to_string()))?;
        let mut hasher = Sha256::new();
        hasher.update(self.address.as_str().as_bytes());
        hasher.update(&payload);
        let signature = hex::encode(hasher.finalize());

        Ok(SignedTransaction::new(
            msgs.to_vec(),
            Fee::estimate(gas, DEFAULT_GAS_WANTED),
            vec![signature],
            "",
        ))
    }
}
