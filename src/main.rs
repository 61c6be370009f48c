use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::{error, info, warn};

use rust_cryptochain::api;
use rust_cryptochain::config::Settings;
use rust_cryptochain::node::Node;
use rust_cryptochain::pubsub::HttpPeers;
use rust_cryptochain::wallet::Wallet;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let settings = Settings::from_env();

    let wallet = match settings.wallet_secret_key.as_deref() {
        Some(secret) => match Wallet::from_secret_hex(secret) {
            Ok(wallet) => wallet,
            Err(e) => {
                error!("WALLET_SECRET_KEY rejected: {e}");
                return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e));
            }
        },
        None => Wallet::new(),
    };

    let transport = HttpPeers::new(settings.peers.clone());
    info!("PUBSUB - broadcasting to {} peers: {:?}", transport.peers().len(), transport.peers());
    let node = Arc::new(Node::new(wallet, Arc::new(transport)));
    info!("NODE - id {} wallet {}", node.id(), node.address());

    if !settings.is_root() {
        match node.sync_with_root(&settings.root_node_address).await {
            Ok(()) => info!("SYNC - synced with root {}", settings.root_node_address),
            Err(e) => warn!(
                "SYNC - root {} unavailable, starting on genesis: {e}",
                settings.root_node_address
            ),
        }
    }

    if settings.seed_demo_data {
        if let Err(e) = node.seed_demo_data().await {
            warn!("SEED - demo seeding stopped: {e}");
        }
    }

    println!("⛓️ Starting ledger node at http://{}", settings.address());

    let data = web::Data::from(node);

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .configure(api::init_routes)
    })
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await
}
