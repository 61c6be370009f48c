use actix_web::{HttpResponse, Responder, post, web};

use crate::node::Node;
use crate::pubsub::Envelope;

/// Ingest an envelope from a peer's HTTP transport.
#[post("/pubsub/")]
pub async fn post_envelope(node: web::Data<Node>, body: web::Json<Envelope>) -> impl Responder {
    node.handle_message(body.into_inner());
    HttpResponse::Accepted().finish()
}
