//! Ledger messages and the fabricators that build them.
//!
//! Fabricators are pure: they take resolved addresses and micro amounts and
//! return unsigned messages. Validation happens before they are called.

use crate::domain::{Address, Coin, Currency};
use crate::network::MarketContracts;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// An unsigned ledger message in the node's amino JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Msg {
    #[serde(rename = "bank/MsgSend")]
    Send {
        from_address: Address,
        to_address: Address,
        amount: Vec<Coin>,
    },
    #[serde(rename = "wasm/MsgExecuteContract")]
    ExecuteContract {
        sender: Address,
        contract: Address,
        execute_msg: serde_json::Value,
        coins: Vec<Coin>,
    },
}

impl Msg {
    /// The account that pays for and authorizes this message.
    pub fn signer(&self) -> &Address {
        match self {
            Msg::Send { from_address, .. } => from_address,
            Msg::ExecuteContract { sender, .. } => sender,
        }
    }
}

/// `deposit_stable` on the market contract, funded with `amount` of `currency`.
pub fn fabricate_deposit_stable(
    sender: &Address,
    contracts: &MarketContracts,
    currency: Currency,
    amount: u128,
) -> Vec<Msg> {
    vec![Msg::ExecuteContract {
        sender: sender.clone(),
        contract: contracts.market.clone(),
        execute_msg: json!({ "deposit_stable": {} }),
        coins: vec![Coin::new(currency.denom(), amount)],
    }]
}

/// CW20 `send` of receipt tokens back to the market with a `redeem_stable` hook.
pub fn fabricate_redeem_stable(
    sender: &Address,
    contracts: &MarketContracts,
    receipt_amount: u128,
) -> Vec<Msg> {
    let hook = BASE64.encode(json!({ "redeem_stable": {} }).to_string());
    vec![Msg::ExecuteContract {
        sender: sender.clone(),
        contract: contracts.a_token.clone(),
        execute_msg: json!({
            "send": {
                "contract": contracts.market.as_str(),
                "amount": receipt_amount.to_string(),
                "msg": hook,
            }
        }),
        coins: Vec::new(),
    }]
}

/// CW20 `transfer` of a token held at `token_contract`.
pub fn fabricate_cw20_transfer(
    sender: &Address,
    token_contract: &Address,
    recipient: &Address,
    amount: u128,
) -> Vec<Msg> {
    vec![Msg::ExecuteContract {
        sender: sender.clone(),
        contract: token_contract.clone(),
        execute_msg: json!({
            "transfer": {
                "recipient": recipient.as_str(),
                "amount": amount.to_string(),
            }
        }),
        coins: Vec::new(),
    }]
}

/// Native bank transfer.
pub fn fabricate_native_send(
    sender: &Address,
    recipient: &Address,
    currency: Currency,
    amount: u128,
) -> Vec<Msg> {
    vec![Msg::Send {
        from_address: sender.clone(),
        to_address: recipient.clone(),
        amount: vec![Coin::new(currency.denom(), amount)],
    }]
}
