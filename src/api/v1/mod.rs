pub mod conversations;
pub mod presence;

use crate::common::state::AppState;
use axum::Router;
use axum::routing::get;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/presence", get(presence::is_online))
        .route("/conversations", get(conversations::fetch))
}
