//! Runtime settings read from the environment (and `.env` via dotenvy).

use std::env;

use rand::Rng;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ROOT_NODE_ADDRESS: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub root_node_address: String,
    pub peers: Vec<String>,
    pub wallet_secret_key: Option<String>,
    pub seed_demo_data: bool,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup. Unparseable values fall back to
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = if flag(lookup("GENERATE_PEER_PORT")) {
            DEFAULT_PORT + rand::thread_rng().gen_range(1..=1000)
        } else {
            lookup("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT)
        };

        let root_node_address = lookup("ROOT_NODE_ADDRESS")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ROOT_NODE_ADDRESS.to_string());

        let peers = lookup("PEERS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            host,
            port,
            root_node_address,
            peers,
            wallet_secret_key: lookup("WALLET_SECRET_KEY").filter(|v| !v.is_empty()),
            seed_demo_data: flag(lookup("SEED_DEMO_DATA")),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether this node is the root, judged by its port against the root
    /// address.
    pub fn is_root(&self) -> bool {
        self.root_node_address
            .rsplit_once(':')
            .and_then(|(_, port)| port.parse::<u16>().ok())
            .is_some_and(|root_port| root_port == self.port)
    }
}

fn flag(value: Option<String>) -> bool {
    matches!(
        value.as_deref().map(str::trim),
        Some("1") | Some("true") | Some("TRUE") | Some("yes")
    )
}
