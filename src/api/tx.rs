use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, warn};

use super::models::{TransactRequest, TransactResponse};
use crate::node::Node;

fn bad_request(message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(TransactResponse::Error {
        message: message.into(),
    })
}

/// Send from the node's wallet, batching into its pending transaction if any.
#[post("/transact/")]
pub async fn post_transact(
    node: web::Data<Node>,
    body: web::Json<TransactRequest>,
) -> impl Responder {
    let TransactRequest { amount, recipient } = body.into_inner();
    debug!("POST /transact/ - received: amount={amount}, recipient={recipient}");

    if amount == 0 {
        warn!("POST /transact/ - rejected: zero amount");
        return bad_request("amount must be > 0");
    }
    if recipient.trim().is_empty() {
        warn!("POST /transact/ - rejected: empty recipient");
        return bad_request("recipient must not be empty");
    }

    match node.transact(&recipient, amount) {
        Ok(transaction) => {
            debug!("POST /transact/ - accepted tx {}", transaction.id);
            HttpResponse::Ok().json(TransactResponse::Success { transaction })
        }
        Err(e) => {
            warn!("POST /transact/ - rejected: {e}");
            bad_request(e.to_string())
        }
    }
}

/// The pending transactions keyed by id.
#[get("/transaction-pool-map/")]
pub async fn get_pool_map(node: web::Data<Node>) -> impl Responder {
    let pool = node.pool().lock();
    HttpResponse::Ok().json(pool.transaction_map())
}
