use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates the interview_sessions table if it does not exist.
/// Sessions are stored as JSONB documents keyed by id; resume_id and state
/// are lifted into columns so the unfinished-session lookup stays indexed.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS interview_sessions (
            id           UUID PRIMARY KEY,
            resume_id    BIGINT NOT NULL,
            state        TEXT NOT NULL,
            pointer      INTEGER NOT NULL,
            questions    JSONB NOT NULL,
            answers      JSONB NOT NULL,
            report       JSONB,
            created_at   TIMESTAMPTZ NOT NULL,
            completed_at TIMESTAMPTZ,
            updated_at   TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_interview_sessions_resume_state
            ON interview_sessions (resume_id, state, created_at DESC)
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
