use crate::common::state::AppState;
use crate::repositories::messages::SqlMessageStore;
use crate::repositories::presences::PresenceRegistry;
use crate::repositories::queues::OfflineQueues;
use crate::repositories::rooms::RoomManager;
use crate::repositories::users::SqlUserDirectory;
use crate::settings::AppSettings;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySql, Pool};
use std::sync::Arc;

pub fn initialize_logging(settings: &AppSettings) {
    tracing_subscriber::fmt()
        .with_max_level(settings.level)
        .with_timer(tracing_subscriber::fmt::time())
        .with_level(true)
        .compact()
        .init();
}

pub async fn initialize_state(settings: &AppSettings) -> anyhow::Result<AppState> {
    let db = initialize_db(settings).await?;
    Ok(AppState {
        messages: Arc::new(SqlMessageStore::new(db.clone())),
        users: Arc::new(SqlUserDirectory::new(db)),
        presences: Arc::new(PresenceRegistry::new()),
        queues: Arc::new(OfflineQueues::new()),
        rooms: Arc::new(RoomManager::new()),
    })
}

pub fn initialize_db(settings: &AppSettings) -> impl Future<Output = sqlx::Result<Pool<MySql>>> {
    MySqlPoolOptions::new()
        .acquire_timeout(settings.db_wait_timeout)
        .max_connections(settings.db_max_connections as _)
        .connect(&settings.database_url)
}
