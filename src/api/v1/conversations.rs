use crate::api::RequestContext;
use crate::common::error::ServiceResponse;
use crate::models::messages::Message;
use crate::usecases::messages;
use axum::Json;
use axum::extract::Query;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct ConversationArgs {
    pub user_a: i64,
    pub user_b: i64,
}

#[derive(Serialize)]
pub struct ConversationResponse {
    pub messages: Vec<Message>,
}

pub async fn fetch(
    ctx: RequestContext,
    Query(args): Query<ConversationArgs>,
) -> ServiceResponse<ConversationResponse> {
    let messages = messages::fetch_conversation(&ctx, args.user_a, args.user_b).await?;
    Ok(Json(ConversationResponse { messages }))
}
