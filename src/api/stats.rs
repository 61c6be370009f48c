use actix_web::{HttpResponse, Responder, get, web};

use super::models::StatsResponse;
use crate::blockchain::MINE_RATE;
use crate::node::Node;

#[get("/stats/")]
pub async fn get_stats(node: web::Data<Node>) -> impl Responder {
    // short, separate locks
    let (height, difficulty, last_interval_ms) = {
        let bc = node.blockchain().lock();
        let chain = bc.chain();
        let last_interval = match chain {
            [.., older, newer] if chain.len() > 2 => {
                Some(newer.timestamp.saturating_sub(older.timestamp).max(0))
            }
            _ => None,
        };
        (bc.len(), bc.difficulty(), last_interval)
    };
    let mempool_size = node.pool().lock().len();

    HttpResponse::Ok().json(StatsResponse {
        height,
        difficulty,
        mine_rate_ms: MINE_RATE,
        last_interval_ms,
        mempool_size,
    })
}
