use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::models::record::{MatchOrder, MatchRecord, MatchStats, NewMatch};

const COLUMNS: &str = "id, resume_text, jd_text, score, explanation, recommendations, created_at";

/// Creates the `matches` table if it does not exist yet.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS matches (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            resume_text     TEXT NOT NULL,
            jd_text         TEXT NOT NULL,
            score           REAL NOT NULL,
            explanation     TEXT NOT NULL,
            recommendations TEXT,
            created_at      TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn save_match(
    pool: &SqlitePool,
    new: NewMatch<'_>,
) -> Result<MatchRecord, sqlx::Error> {
    let recommendations = serde_json::to_string(new.recommendations)
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

    let id = sqlx::query(
        r#"
        INSERT INTO matches (resume_text, jd_text, score, explanation, recommendations, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(new.resume_text)
    .bind(new.jd_text)
    .bind(new.score)
    .bind(new.explanation)
    .bind(recommendations)
    .bind(Utc::now())
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!("Saved match {id} (score {:.1})", new.score);

    sqlx::query_as::<_, MatchRecord>(&format!("SELECT {COLUMNS} FROM matches WHERE id = ?"))
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn get_match(pool: &SqlitePool, id: i64) -> Result<Option<MatchRecord>, sqlx::Error> {
    let record = sqlx::query_as::<_, MatchRecord>(&format!(
        "SELECT {COLUMNS} FROM matches WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(record)
}

/// Lists matches best-first (`Score`) or newest-first (`Recent`); ties go to the newer id.
pub async fn list_matches(
    pool: &SqlitePool,
    limit: i64,
    order: MatchOrder,
) -> Result<Vec<MatchRecord>, sqlx::Error> {
    let order_by = match order {
        MatchOrder::Score => "score DESC, id DESC",
        MatchOrder::Recent => "created_at DESC, id DESC",
    };

    let records = sqlx::query_as::<_, MatchRecord>(&format!(
        "SELECT {COLUMNS} FROM matches ORDER BY {order_by} LIMIT ?"
    ))
    .bind(limit.max(0))
    .fetch_all(pool)
    .await?;
    Ok(records)
}

/// Returns `false` when no match had that id.
pub async fn delete_match(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM matches WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn get_stats(pool: &SqlitePool) -> Result<MatchStats, sqlx::Error> {
    let (total, average): (i64, Option<f64>) =
        sqlx::query_as("SELECT COUNT(*), AVG(score) FROM matches")
            .fetch_one(pool)
            .await?;

    let average_score = average.map(|avg| (avg * 10.0).round() / 10.0).unwrap_or(0.0);

    Ok(MatchStats {
        total,
        average_score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool;

    async fn memory_pool() -> SqlitePool {
        create_pool("sqlite::memory:").await.unwrap()
    }

    fn new_match<'a>(resume: &'a str, score: f64, recs: &'a [String]) -> NewMatch<'a> {
        NewMatch {
            resume_text: resume,
            jd_text: "Sample JD",
            score,
            explanation: "Good fit",
            recommendations: recs,
        }
    }

    #[tokio::test]
    async fn test_save_and_retrieve_match() {
        let pool = memory_pool().await;
        let recs = vec!["Rec 1".to_string(), "Rec 2".to_string()];

        let record = save_match(&pool, new_match("Sample resume", 85.5, &recs))
            .await
            .unwrap();
        assert!(record.id > 0);
        assert_eq!(record.score, 85.5);

        let fetched = get_match(&pool, record.id).await.unwrap().unwrap();
        assert_eq!(fetched.score, 85.5);
        assert_eq!(fetched.resume_text, "Sample resume");
        assert_eq!(fetched.recommendation_list(), recs);
    }

    #[tokio::test]
    async fn test_get_missing_match_is_none() {
        let pool = memory_pool().await;
        assert!(get_match(&pool, 42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_matches_by_score_desc() {
        let pool = memory_pool().await;
        save_match(&pool, new_match("resume1", 80.0, &[])).await.unwrap();
        save_match(&pool, new_match("resume2", 90.0, &[])).await.unwrap();
        save_match(&pool, new_match("resume3", 70.0, &[])).await.unwrap();

        let matches = list_matches(&pool, 100, MatchOrder::Score).await.unwrap();
        let scores: Vec<f64> = matches.iter().map(|m| m.score).collect();
        assert_eq!(scores, vec![90.0, 80.0, 70.0]);
    }

    #[tokio::test]
    async fn test_list_matches_by_recency_and_limit() {
        let pool = memory_pool().await;
        save_match(&pool, new_match("first", 90.0, &[])).await.unwrap();
        save_match(&pool, new_match("second", 10.0, &[])).await.unwrap();
        save_match(&pool, new_match("third", 50.0, &[])).await.unwrap();

        let matches = list_matches(&pool, 2, MatchOrder::Recent).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].resume_text, "third");
        assert_eq!(matches[1].resume_text, "second");
    }

    #[tokio::test]
    async fn test_delete_match() {
        let pool = memory_pool().await;
        let record = save_match(&pool, new_match("r", 60.0, &[])).await.unwrap();

        assert!(delete_match(&pool, record.id).await.unwrap());
        assert!(!delete_match(&pool, record.id).await.unwrap());
        assert!(get_match(&pool, record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stats_on_empty_table() {
        let pool = memory_pool().await;
        let stats = get_stats(&pool).await.unwrap();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.average_score, 0.0);
    }

    #[tokio::test]
    async fn test_stats_average_is_rounded() {
        let pool = memory_pool().await;
        save_match(&pool, new_match("a", 70.0, &[])).await.unwrap();
        save_match(&pool, new_match("b", 90.0, &[])).await.unwrap();
        save_match(&pool, new_match("c", 85.25, &[])).await.unwrap();

        let stats = get_stats(&pool).await.unwrap();
        assert_eq!(stats.total, 3);
        // (70 + 90 + 85.25) / 3 = 81.75 -> 81.8
        assert_eq!(stats.average_score, 81.8);
    }
}
