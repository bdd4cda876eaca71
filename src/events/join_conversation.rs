use crate::api::RequestContext;
use crate::events::EventResult;
use crate::models::sessions::Session;
use crate::usecases::rooms;

pub async fn handle(ctx: &RequestContext, session: &Session, other_user_id: i64) -> EventResult {
    rooms::join_conversation(ctx, session, other_user_id).await?;
    Ok(None)
}
