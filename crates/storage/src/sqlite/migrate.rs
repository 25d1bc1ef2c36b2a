use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs the versioned schema migrations for the exam catalog.
///
/// Version 1 creates `exams` and `questions`. Applied versions are recorded in
/// `schema_migrations` so reruns are no-ops.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if is_applied(pool, 1).await? {
        tracing::debug!("schema already at version 1");
        return Ok(());
    }

    let mut tx = pool.begin().await?;

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS exams (
                id INTEGER PRIMARY KEY,
                kind TEXT NOT NULL CHECK (kind IN ('mcq', 'written')),
                title TEXT NOT NULL,
                description TEXT,
                duration_minutes INTEGER NOT NULL CHECK (duration_minutes > 0),
                total_marks REAL NOT NULL CHECK (total_marks > 0),
                is_premium INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                starts_at TEXT NOT NULL,
                reveal_results_at TEXT
            );
        ",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS questions (
                id INTEGER NOT NULL,
                exam_id INTEGER NOT NULL,
                position INTEGER NOT NULL CHECK (position >= 0),
                kind TEXT NOT NULL CHECK (kind IN ('mcq', 'written')),
                prompt TEXT NOT NULL,
                options TEXT,
                correct_index INTEGER,
                marks REAL,
                PRIMARY KEY (exam_id, id),
                FOREIGN KEY (exam_id) REFERENCES exams(id) ON DELETE CASCADE
            );
        ",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r"
            CREATE INDEX IF NOT EXISTS idx_questions_exam_position
                ON questions (exam_id, position);
        ",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r"
            INSERT INTO schema_migrations (version, applied_at)
            VALUES (?1, ?2)
            ON CONFLICT(version) DO NOTHING
        ",
    )
    .bind(1_i64)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::info!(version = 1, "applied exam catalog migration");

    Ok(())
}
