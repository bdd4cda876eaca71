use crate::api::RequestContext;
use crate::events::EventResult;
use crate::models::sessions::Session;
use crate::usecases::rooms;

pub async fn handle(
    ctx: &RequestContext,
    session: &Session,
    receiver_id: i64,
    is_typing: bool,
) -> EventResult {
    rooms::typing(ctx, session, receiver_id, is_typing);
    Ok(None)
}
