use crate::api::RequestContext;
use crate::common::error::ServiceResponse;
use crate::usecases::presences;
use axum::Json;
use axum::extract::Query;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct IsOnlineArgs {
    pub user_id: i64,
}

#[derive(Serialize)]
pub struct IsOnlineResponse {
    pub online: bool,
}

pub async fn is_online(
    ctx: RequestContext,
    Query(args): Query<IsOnlineArgs>,
) -> ServiceResponse<IsOnlineResponse> {
    let online = presences::is_online(&ctx, args.user_id);
    Ok(Json(IsOnlineResponse { online }))
}
