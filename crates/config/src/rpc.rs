// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;
use url::Url;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RpcProtocol {
    Http,
    Https,
    Ws,
    Wss,
}

impl RpcProtocol {
    pub fn is_websocket(&self) -> bool {
        matches!(self, RpcProtocol::Ws | RpcProtocol::Wss)
    }

    pub fn is_secure(&self) -> bool {
        matches!(self, RpcProtocol::Https | RpcProtocol::Wss)
    }
}

/// A validated RPC endpoint
#[derive(Clone, Debug)]
pub struct RPC {
    protocol: RpcProtocol,
    url: Url,
}

impl RPC {
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).context("Invalid URL format")?;
        let protocol = match parsed.scheme() {
            "http" => RpcProtocol::Http,
            "https" => RpcProtocol::Https,
            "ws" => RpcProtocol::Ws,
            "wss" => RpcProtocol::Wss,
            _ => bail!("Invalid protocol. Expected: http://, https://, ws://, wss://"),
        };

        if parsed.host_str().is_none() {
            bail!("URL must contain a host");
        }

        Ok(RPC {
            protocol,
            url: parsed,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_http_url(&self) -> Result<String> {
        self.with_scheme(if self.protocol.is_secure() {
            "https"
        } else {
            "http"
        })
    }

    pub fn as_ws_url(&self) -> Result<String> {
        self.with_scheme(if self.protocol.is_secure() {
            "wss"
        } else {
            "ws"
        })
    }

    fn with_scheme(&self, scheme: &str) -> Result<String> {
        if self.url.scheme() == scheme {
            return Ok(self.url.to_string());
        }
        let mut parsed = self.url.clone();
        parsed
            .set_scheme(scheme)
            .map_err(|_| anyhow!("{scheme} is not a valid scheme for {}", self.url))?;
        Ok(parsed.to_string())
    }

    pub fn is_websocket(&self) -> bool {
        self.protocol.is_websocket()
    }

    pub fn is_secure(&self) -> bool {
        self.protocol.is_secure()
    }

    pub fn is_local(&self) -> bool {
        match self.url.host_str() {
            Some("localhost") | Some("127.0.0.1") | Some("::1") | Some("[::1]") => true,
            Some(host) => host.starts_with("127."), // 127.0.0.0/8 is all loopback
            None => false,
        }
    }
}

#[derive(Debug, Default, Hash, Eq, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "type", content = "credentials")]
pub enum RpcAuth {
    #[default]
    None,
    Basic {
        username: String,
        password: String,
    },
    Bearer(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_conversions() -> Result<()> {
        let http = RPC::from_url("http://localhost:8545/")?;
        assert_eq!(http.as_http_url()?, "http://localhost:8545/");
        assert_eq!(http.as_ws_url()?, "ws://localhost:8545/");
        assert!(!http.is_secure());
        assert!(!http.is_websocket());
        assert!(http.is_local());

        let wss = RPC::from_url("wss://sepolia.example.com/")?;
        assert_eq!(wss.as_http_url()?, "https://sepolia.example.com/");
        assert_eq!(wss.as_ws_url()?, "wss://sepolia.example.com/");
        assert!(wss.is_secure());
        assert!(wss.is_websocket());
        assert!(!wss.is_local());

        assert!(RPC::from_url("ftp://example.com").is_err());
        Ok(())
    }
}
