//! Injected-wallet connector speaking the standard account JSON-RPC calls.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use shared::{
    domain::{Address, ChainId, ConnectorKind, Session},
    protocol::{JsonRpcRequest, JsonRpcResponse},
};
use tracing::debug;
use url::Url;

use crate::WalletProvider;

pub struct JsonRpcWallet {
    http: Client,
    rpc_url: Url,
    next_id: AtomicU64,
}

impl JsonRpcWallet {
    pub fn new(rpc_url: &str) -> Result<Self> {
        let rpc_url =
            Url::parse(rpc_url.trim()).with_context(|| format!("invalid wallet rpc url '{rpc_url}'"))?;
        Ok(Self {
            http: Client::new(),
            rpc_url,
            next_id: AtomicU64::new(1),
        })
    }

    async fn request<T: DeserializeOwned>(&self, method: &str) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let res = self
            .http
            .post(self.rpc_url.clone())
            .json(&JsonRpcRequest::new(id, method))
            .send()
            .await
            .with_context(|| format!("failed to reach wallet at {}", self.rpc_url))?
            .error_for_status()?;
        let body: JsonRpcResponse = res
            .json()
            .await
            .with_context(|| format!("malformed {method} response"))?;
        if let Some(err) = body.error {
            bail!("{method} failed ({}): {}", err.code, err.message);
        }
        let result = body
            .result
            .ok_or_else(|| anyhow!("{method} returned no result"))?;
        serde_json::from_value(result).with_context(|| format!("unexpected {method} result"))
    }
}

#[async_trait]
impl WalletProvider for JsonRpcWallet {
    async fn connect(&self, connector: ConnectorKind) -> Result<Session> {
        let ConnectorKind::Injected = connector;

        let accounts: Vec<String> = self.request("eth_requestAccounts").await?;
        let first = accounts
            .first()
            .ok_or_else(|| anyhow!("wallet exposed no accounts"))?;
        let address = Address::parse(first)?;

        let chain_hex: String = self.request("eth_chainId").await?;
        let chain_id = ChainId(parse_hex_quantity(&chain_hex)?);

        debug!(address = %address, chain_id = chain_id.0, "wallet session established");
        Ok(Session {
            address,
            chain_id,
            can_sign: true,
        })
    }

    async fn disconnect(&self) -> Result<()> {
        // Injected wallets keep their own permission state; nothing to revoke here.
        debug!(rpc_url = %self.rpc_url, "wallet session dropped");
        Ok(())
    }
}

fn parse_hex_quantity(raw: &str) -> Result<u64> {
    let digits = raw
        .trim()
        .strip_prefix("0x")
        .ok_or_else(|| anyhow!("expected hex quantity, got '{raw}'"))?;
    u64::from_str_radix(digits, 16).with_context(|| format!("invalid hex quantity '{raw}'"))
}
