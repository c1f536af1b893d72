use crate::domain::{Address, Decimal};
use crate::network::{AddressProvider, GasConfig, NetworkConfig};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub network: Network,
    pub lcd_url: Option<String>,
    pub chain_id: Option<String>,
    pub address: Option<Address>,
    pub gas_prices: Option<BTreeMap<String, Decimal>>,
    pub gas_adjustment: Option<Decimal>,
    pub request_timeout_ms: u64,
    pub contracts_file: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let network = match env_map
            .get("ANCHOR_NETWORK")
            .map(|s| s.as_str())
            .unwrap_or("mainnet")
        {
            "mainnet" => Network::Mainnet,
            "testnet" => Network::Testnet,
            other => {
                return Err(ConfigError::InvalidValue(
                    "ANCHOR_NETWORK".to_string(),
                    format!("must be mainnet or testnet, got {}", other),
                ))
            }
        };

        let lcd_url = non_empty(&env_map, "LCD_URL");
        let chain_id = non_empty(&env_map, "CHAIN_ID");

        let address = non_empty(&env_map, "ANCHOR_ADDRESS")
            .map(|raw| {
                raw.parse::<Address>().map_err(|e| {
                    ConfigError::InvalidValue("ANCHOR_ADDRESS".to_string(), e.to_string())
                })
            })
            .transpose()?;

        let gas_prices = non_empty(&env_map, "GAS_PRICES")
            .map(|raw| parse_gas_prices(&raw))
            .transpose()?;

        let gas_adjustment = non_empty(&env_map, "GAS_ADJUSTMENT")
            .map(|raw| {
                raw.parse::<Decimal>().map_err(|_| {
                    ConfigError::InvalidValue(
                        "GAS_ADJUSTMENT".to_string(),
                        "must be a decimal".to_string(),
                    )
                })
            })
            .transpose()?;

        let request_timeout_ms = env_map
            .get("REQUEST_TIMEOUT_MS")
            .map(|s| s.as_str())
            .unwrap_or("30000")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "REQUEST_TIMEOUT_MS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;

        let contracts_file = non_empty(&env_map, "CONTRACTS_FILE");

        Ok(Config {
            port,
            network,
            lcd_url,
            chain_id,
            address,
            gas_prices,
            gas_adjustment,
            request_timeout_ms,
            contracts_file,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Network defaults with every configured override applied.
    pub fn network_config(&self) -> Result<NetworkConfig, ConfigError> {
        let mut network = match self.network {
            Network::Mainnet => NetworkConfig::mainnet(),
            Network::Testnet => NetworkConfig::testnet(),
        };

        if let Some(lcd_url) = &self.lcd_url {
            network.lcd_url = lcd_url.clone();
        }
        if let Some(chain_id) = &self.chain_id {
            network.chain_id = chain_id.clone();
        }
        if self.gas_prices.is_some() || self.gas_adjustment.is_some() {
            network.gas = GasConfig::new(
                self.gas_prices
                    .clone()
                    .unwrap_or_else(|| network.gas.gas_prices.clone()),
                self.gas_adjustment.unwrap_or(network.gas.gas_adjustment),
            );
        }
        if let Some(path) = &self.contracts_file {
            network.contracts = load_contracts(path)?;
        }

        Ok(network)
    }
}

fn non_empty(env_map: &HashMap<String, String>, key: &str) -> Option<String> {
    env_map
        .get(key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse `denom:price` pairs, e.g. `uusd:0.15,ukrw:178.05`.
fn parse_gas_prices(raw: &str) -> Result<BTreeMap<String, Decimal>, ConfigError> {
    let invalid = |detail: String| ConfigError::InvalidValue("GAS_PRICES".to_string(), detail);
    raw.split(',')
        .map(|pair| pair.trim())
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (denom, price) = pair
                .split_once(':')
                .ok_or_else(|| invalid(format!("expected denom:price, got {}", pair)))?;
            let price = price
                .trim()
                .parse::<Decimal>()
                .map_err(|_| invalid(format!("invalid price in {}", pair)))?;
            Ok((denom.trim().to_string(), price))
        })
        .collect()
}

fn load_contracts(path: &str) -> Result<AddressProvider, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|_| {
        ConfigError::InvalidValue(
            "CONTRACTS_FILE".to_string(),
            "file not found or unreadable".to_string(),
        )
    })?;
    AddressProvider::from_json(&content)
        .map_err(|e| ConfigError::InvalidValue("CONTRACTS_FILE".to_string(), e.to_string()))
}
