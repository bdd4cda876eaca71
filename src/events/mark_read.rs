use crate::api::RequestContext;
use crate::events::EventResult;
use crate::models::sessions::Session;
use crate::usecases::messages;

pub async fn handle(
    ctx: &RequestContext,
    session: &Session,
    message_ids: Vec<i64>,
) -> EventResult {
    messages::mark_read(ctx, session.user_id, &message_ids).await?;
    Ok(None)
}
