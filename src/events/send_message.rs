use crate::api::RequestContext;
use crate::events::EventResult;
use crate::models::events::ServerEvent;
use crate::models::sessions::Session;
use crate::usecases::messages;

pub async fn handle(
    ctx: &RequestContext,
    session: &Session,
    receiver_id: i64,
    content: &str,
) -> EventResult {
    let message = messages::send(ctx, session.user_id, receiver_id, content).await?;
    Ok(Some(ServerEvent::SendResult { message }))
}
