use actix_web::{HttpResponse, Responder, get, post, web};
use log::{info, warn};

use super::models::{MineResponse, TransactResponse, ValidateResponse};
use crate::blockchain::Blockchain;
use crate::error::{ChainError, NodeError};
use crate::node::Node;

/// Get the full blockchain.
#[get("/blocks/")]
pub async fn get_blocks(node: web::Data<Node>) -> impl Responder {
    let bc = node.blockchain().lock();
    HttpResponse::Ok().json(bc.chain())
}

/// Validate the whole chain, structure and transaction data.
#[get("/validate/")]
pub async fn validate_chain(node: web::Data<Node>) -> impl Responder {
    let bc = node.blockchain().lock();
    let resp = ValidateResponse {
        valid: Blockchain::is_valid_chain(bc.chain())
            && Blockchain::valid_transaction_data(bc.chain()),
        length: bc.len(),
        difficulty: bc.difficulty(),
    };
    HttpResponse::Ok().json(resp)
}

/// Mine the pool's valid transactions plus the reward into a new block.
#[post("/mine-transactions/")]
pub async fn mine_transactions(node: web::Data<Node>) -> impl Responder {
    match node.mine_transactions().await {
        Ok(block) => {
            let index = node
                .blockchain()
                .lock()
                .chain()
                .iter()
                .rposition(|b| b.hash == block.hash)
                .unwrap_or_default();
            info!("POST /mine-transactions/ - block #{index} {}", block.hash);
            HttpResponse::Ok().json(MineResponse::new(index, block))
        }
        Err(NodeError::Chain(ChainError::StaleTip)) => {
            warn!("POST /mine-transactions/ - tip moved while mining");
            HttpResponse::Conflict().json(TransactResponse::Error {
                message: ChainError::StaleTip.to_string(),
            })
        }
        Err(e) => {
            warn!("POST /mine-transactions/ - failed: {e}");
            HttpResponse::InternalServerError().json(TransactResponse::Error {
                message: e.to_string(),
            })
        }
    }
}
