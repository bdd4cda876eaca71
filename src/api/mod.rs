pub mod v1;
pub mod ws;

use crate::common::context::Context;
use crate::common::init;
use crate::common::state::AppState;
use crate::repositories::messages::MessageStore;
use crate::repositories::presences::PresenceRegistry;
use crate::repositories::queues::OfflineQueues;
use crate::repositories::rooms::RoomManager;
use crate::repositories::users::UserDirectory;
use crate::settings::AppSettings;
use axum::Router;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::routing::get;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

pub struct RequestContext {
    pub messages: Arc<dyn MessageStore>,
    pub users: Arc<dyn UserDirectory>,
    pub presences: Arc<PresenceRegistry>,
    pub queues: Arc<OfflineQueues>,
    pub rooms: Arc<RoomManager>,
}

impl RequestContext {
    pub fn from_state(state: &AppState) -> Self {
        Self {
            messages: state.messages.clone(),
            users: state.users.clone(),
            presences: state.presences.clone(),
            queues: state.queues.clone(),
            rooms: state.rooms.clone(),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::handler))
        .nest("/api/v1", v1::router())
}

pub async fn serve(settings: &AppSettings) -> anyhow::Result<()> {
    let state = init::initialize_state(settings).await?;
    let app = router().with_state(state);
    let addr = SocketAddr::from((settings.app_host, settings.app_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::from_state(state))
    }
}

impl Context for RequestContext {
    fn messages(&self) -> &dyn MessageStore {
        self.messages.as_ref()
    }

    fn users(&self) -> &dyn UserDirectory {
        self.users.as_ref()
    }

    fn presences(&self) -> &PresenceRegistry {
        &self.presences
    }

    fn queues(&self) -> &OfflineQueues {
        &self.queues
    }

    fn rooms(&self) -> &RoomManager {
        &self.rooms
    }
}
