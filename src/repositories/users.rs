use async_trait::async_trait;
use sqlx::{MySql, Pool};

/// The user directory collaborator. Only consulted to validate that a
/// sender/receiver id refers to a real account.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn exists(&self, user_id: i64) -> anyhow::Result<bool>;
}

pub struct SqlUserDirectory {
    db: Pool<MySql>,
}

impl SqlUserDirectory {
    pub fn new(db: Pool<MySql>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserDirectory for SqlUserDirectory {
    async fn exists(&self, user_id: i64) -> anyhow::Result<bool> {
        const QUERY: &str = "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)";
        let exists = sqlx::query_scalar(QUERY)
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;
        Ok(exists)
    }
}
