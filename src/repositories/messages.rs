use crate::entities::messages::{Message, MessageStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySql, Pool};

/// The durable record store for messages. One implementation talks MySQL;
/// tests substitute an in-memory store so the delivery pipeline can be
/// exercised without infrastructure.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn insert(
        &self,
        sender_id: i64,
        receiver_id: i64,
        content: &str,
    ) -> anyhow::Result<Message>;

    /// Advance a single message to `delivered` or `read`, stamping the
    /// matching timestamp column. Transitions are monotonic; an update that
    /// would regress a row must not apply.
    async fn update_status(
        &self,
        message_id: i64,
        status: MessageStatus,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()>;

    /// Batch form of [`update_status`](Self::update_status), used by the
    /// read-receipt path.
    async fn update_status_batch(
        &self,
        message_ids: &[i64],
        status: MessageStatus,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()>;

    async fn fetch_many(&self, message_ids: &[i64]) -> anyhow::Result<Vec<Message>>;

    /// Full history between a pair of users, oldest first.
    async fn fetch_by_participants(
        &self,
        user_a: i64,
        user_b: i64,
    ) -> anyhow::Result<Vec<Message>>;
}

const TABLE_NAME: &str = "messages";
const READ_FIELDS: &str =
    "id, sender_id, receiver_id, content, status, created_at, delivered_at, read_at";

pub struct SqlMessageStore {
    db: Pool<MySql>,
}

impl SqlMessageStore {
    pub fn new(db: Pool<MySql>) -> Self {
        Self { db }
    }
}

fn in_placeholders(count: usize) -> String {
    vec!["?"; count].join(",")
}

#[async_trait]
impl MessageStore for SqlMessageStore {
    async fn insert(
        &self,
        sender_id: i64,
        receiver_id: i64,
        content: &str,
    ) -> anyhow::Result<Message> {
        const QUERY: &str = const_str::concat!(
            "INSERT INTO ",
            TABLE_NAME,
            " (sender_id, receiver_id, content, status, created_at) ",
            "VALUES (?, ?, ?, ?, ?)"
        );
        let created_at = Utc::now();
        let result = sqlx::query(QUERY)
            .bind(sender_id)
            .bind(receiver_id)
            .bind(content)
            .bind(MessageStatus::Sent.as_str())
            .bind(created_at)
            .execute(&self.db)
            .await?;
        Ok(Message {
            id: result.last_insert_id() as i64,
            sender_id,
            receiver_id,
            content: content.to_owned(),
            status: MessageStatus::Sent,
            created_at,
            delivered_at: None,
            read_at: None,
        })
    }

    async fn update_status(
        &self,
        message_id: i64,
        status: MessageStatus,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        // The status guards in the WHERE clauses keep the transition
        // monotonic even if two writers race on the same row.
        const DELIVERED_QUERY: &str = const_str::concat!(
            "UPDATE ",
            TABLE_NAME,
            " SET status = ?, delivered_at = ? ",
            "WHERE id = ? AND status IN ('sent', 'queued')"
        );
        const READ_QUERY: &str = const_str::concat!(
            "UPDATE ",
            TABLE_NAME,
            " SET status = ?, read_at = ? ",
            "WHERE id = ? AND status = 'delivered'"
        );
        let query = match status {
            MessageStatus::Delivered => DELIVERED_QUERY,
            MessageStatus::Read => READ_QUERY,
            status => anyhow::bail!("no timestamped transition to {status}"),
        };
        sqlx::query(query)
            .bind(status.as_str())
            .bind(at)
            .bind(message_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn update_status_batch(
        &self,
        message_ids: &[i64],
        status: MessageStatus,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        if message_ids.is_empty() {
            return Ok(());
        }
        let guard = match status {
            MessageStatus::Delivered => "AND status IN ('sent', 'queued')",
            MessageStatus::Read => "AND status = 'delivered'",
            status => anyhow::bail!("no timestamped transition to {status}"),
        };
        let column = match status {
            MessageStatus::Read => "read_at",
            _ => "delivered_at",
        };
        let query = format!(
            "UPDATE {TABLE_NAME} SET status = ?, {column} = ? WHERE id IN ({}) {guard}",
            in_placeholders(message_ids.len()),
        );
        let mut query = sqlx::query(&query).bind(status.as_str()).bind(at);
        for message_id in message_ids {
            query = query.bind(message_id);
        }
        query.execute(&self.db).await?;
        Ok(())
    }

    async fn fetch_many(&self, message_ids: &[i64]) -> anyhow::Result<Vec<Message>> {
        if message_ids.is_empty() {
            return Ok(vec![]);
        }
        let query = format!(
            "SELECT {READ_FIELDS} FROM {TABLE_NAME} WHERE id IN ({})",
            in_placeholders(message_ids.len()),
        );
        let mut query = sqlx::query_as(&query);
        for message_id in message_ids {
            query = query.bind(message_id);
        }
        Ok(query.fetch_all(&self.db).await?)
    }

    async fn fetch_by_participants(
        &self,
        user_a: i64,
        user_b: i64,
    ) -> anyhow::Result<Vec<Message>> {
        const QUERY: &str = const_str::concat!(
            "SELECT ",
            READ_FIELDS,
            " FROM ",
            TABLE_NAME,
            " WHERE (sender_id = ? AND receiver_id = ?)",
            " OR (sender_id = ? AND receiver_id = ?)",
            " ORDER BY created_at ASC, id ASC"
        );
        let messages = sqlx::query_as(QUERY)
            .bind(user_a)
            .bind(user_b)
            .bind(user_b)
            .bind(user_a)
            .fetch_all(&self.db)
            .await?;
        Ok(messages)
    }
}
