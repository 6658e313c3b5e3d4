use chrono::{DateTime, Utc};

use serde::Serialize;

use sqlx::{PgConnection, PgExecutor};

use url::Url;

use uuid::Uuid;

use crate::domain::DocumentCategory;

/// A document to assign to a subscriber
#[derive(Debug)]
pub struct NewDocument {
    pub title: String,
    pub url: Url,
    pub category: DocumentCategory,
}

/// A video to assign to a subscriber
#[derive(Debug)]
pub struct NewVideo {
    pub title: String,
    pub url: Url,
}

/// Stored document assignment
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AssignedDocument {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub category: DocumentCategory,
    pub assigned_at: DateTime<Utc>,
}

/// Stored video assignment
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AssignedVideo {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub assigned_at: DateTime<Utc>,
}

/// Everything currently assigned to one subscriber
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentSet {
    pub documents: Vec<AssignedDocument>,
    pub videos: Vec<AssignedVideo>,
}

/// Repository for per-subscriber resource assignments
pub struct ResourceRepo;

impl ResourceRepo {
    /// Replace the subscriber's assignment lists wholesale.
    ///
    /// Assignment is overwrite-the-list from the coach's point of view, so
    /// this runs delete + insert; the caller supplies a transaction to keep
    /// the swap atomic.
    #[tracing::instrument(name = "Replace resource assignments", skip(conn, documents, videos))]
    pub async fn replace_for_subscriber(
        conn: &mut PgConnection,
        subscriber_id: Uuid,
        documents: &[NewDocument],
        videos: &[NewVideo],
    ) -> sqlx::Result<()> {
        sqlx::query("delete from documents where subscriber_id = $1")
            .bind(subscriber_id)
            .execute(&mut *conn)
            .await?;
        sqlx::query("delete from videos where subscriber_id = $1")
            .bind(subscriber_id)
            .execute(&mut *conn)
            .await?;

        for document in documents {
            sqlx::query(
                "insert into documents (subscriber_id, title, url, category) \
                 values ($1, $2, $3, $4)",
            )
            .bind(subscriber_id)
            .bind(&document.title)
            .bind(document.url.as_str())
            .bind(document.category)
            .execute(&mut *conn)
            .await?;
        }
        for video in videos {
            sqlx::query("insert into videos (subscriber_id, title, url) values ($1, $2, $3)")
                .bind(subscriber_id)
                .bind(&video.title)
                .bind(video.url.as_str())
                .execute(&mut *conn)
                .await?;
        }

        Ok(())
    }

    #[tracing::instrument(name = "Fetch assigned documents", skip(executor))]
    pub async fn fetch_documents<'con>(
        executor: impl PgExecutor<'con>,
        subscriber_id: Uuid,
    ) -> sqlx::Result<Vec<AssignedDocument>> {
        sqlx::query_as::<_, AssignedDocument>(
            "select id, title, url, category, assigned_at from documents \
             where subscriber_id = $1 order by assigned_at desc, title",
        )
        .bind(subscriber_id)
        .fetch_all(executor)
        .await
    }

    #[tracing::instrument(name = "Fetch assigned videos", skip(executor))]
    pub async fn fetch_videos<'con>(
        executor: impl PgExecutor<'con>,
        subscriber_id: Uuid,
    ) -> sqlx::Result<Vec<AssignedVideo>> {
        sqlx::query_as::<_, AssignedVideo>(
            "select id, title, url, assigned_at from videos \
             where subscriber_id = $1 order by assigned_at desc, title",
        )
        .bind(subscriber_id)
        .fetch_all(executor)
        .await
    }

    /// Both assignment lists for one subscriber
    pub async fn fetch_for_subscriber(
        conn: &mut PgConnection,
        subscriber_id: Uuid,
    ) -> sqlx::Result<AssignmentSet> {
        let documents = Self::fetch_documents(&mut *conn, subscriber_id).await?;
        let videos = Self::fetch_videos(&mut *conn, subscriber_id).await?;
        Ok(AssignmentSet { documents, videos })
    }
}
