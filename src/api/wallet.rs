use actix_web::{HttpResponse, Responder, get, web};

use super::models::BalanceResponse;
use crate::node::Node;

#[get("/wallet-info/")]
pub async fn wallet_info(node: web::Data<Node>) -> impl Responder {
    let (address, balance) = node.wallet_info();
    HttpResponse::Ok().json(BalanceResponse { address, balance })
}
