//! SQLite-backed [`Store`] implementation.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use crate::engine::{Card, Ease, ReviewLogEntry, Scheduling};
use crate::store::{DayMetric, DueOrder, Store, StoreError};

const SCHEMA: &str = include_str!("schema.sql");

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) a collection database at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let url = format!("sqlite:{}?mode=rwc", path.as_ref().display());
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(StoreError::from)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// An in-memory database, for tests and ephemeral collections. A single
    /// connection is pinned so the database outlives individual checkouts.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options =
            SqliteConnectOptions::from_str("sqlite::memory:").map_err(StoreError::from)?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA.split(';') {
            let trimmed = statement.trim();
            let is_comment_only = trimmed
                .lines()
                .all(|line| line.trim().is_empty() || line.trim().starts_with("--"));
            if is_comment_only {
                continue;
            }
            sqlx::query(trimmed).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Author a card. Scheduling state starts as new/unseen; the engine
    /// takes over from the first review.
    pub async fn insert_card(
        &self,
        fieldset_id: i64,
        template_id: i64,
        ord: i64,
    ) -> Result<Card, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO card (fieldsetid, templateid, modified, interval, lastinterval, due, factor, views, lapses, ord)
            VALUES (?, ?, unixepoch(), 0, 0, 0, 0, 0, 0, ?)
            "#,
        )
        .bind(fieldset_id)
        .bind(template_id)
        .bind(ord)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.card_by_id(id)
            .await?
            .ok_or_else(|| StoreError::Other(format!("inserted card {id} not found")))
    }
}

fn map_card(row: &SqliteRow) -> Result<Card, sqlx::Error> {
    let interval: i64 = row.try_get("interval")?;
    let scheduling = if interval == 0 {
        Scheduling::New
    } else {
        Scheduling::Seen {
            interval,
            last_interval: row.try_get("lastinterval")?,
            due: row.try_get("due")?,
        }
    };
    Ok(Card {
        id: row.try_get("id")?,
        fieldset_id: row.try_get("fieldsetid")?,
        template_id: row.try_get("templateid")?,
        modified: row.try_get("modified")?,
        scheduling,
        factor: row.try_get("factor")?,
        views: row.try_get("views")?,
        lapses: row.try_get("lapses")?,
        ord: row.try_get("ord")?,
    })
}

fn map_review(row: &SqliteRow) -> Result<ReviewLogEntry, StoreError> {
    let ease_str: String = row.try_get("ease")?;
    let ease = ease_str
        .parse::<Ease>()
        .map_err(|_| StoreError::Other(format!("unsupported ease in review log: {ease_str}")))?;
    Ok(ReviewLogEntry {
        id: row.try_get("id")?,
        rev_date: row.try_get("revdate")?,
        card_id: row.try_get("cardid")?,
        ease,
        interval: row.try_get("interval")?,
        last_interval: row.try_get("lastinterval")?,
        factor: row.try_get("factor")?,
        view_time: row.try_get("viewtime")?,
        study_time: row.try_get("studytime")?,
        lapses: row.try_get("lapses")?,
    })
}

fn day_metric_expr(metric: DayMetric) -> &'static str {
    match metric {
        DayMetric::StudyTime => "sum(studytime)",
        DayMetric::Reviews => "count(*)",
        DayMetric::NewCards => "count(CASE WHEN lastinterval = 0 THEN 1 END)",
    }
}

fn due_order_clause(order: DueOrder) -> &'static str {
    match order {
        DueOrder::Due => "due, templateid",
        DueOrder::IntervalThenDue => "interval, due, templateid",
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn card_by_id(&self, id: i64) -> Result<Option<Card>, StoreError> {
        let row = sqlx::query("SELECT * FROM card WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_card).transpose().map_err(StoreError::from)
    }

    async fn due_cards(
        &self,
        due_before: Option<i64>,
        order: DueOrder,
        limit: i64,
    ) -> Result<Vec<Card>, StoreError> {
        let sql = format!(
            "SELECT * FROM card WHERE interval != 0 AND due < ? ORDER BY {} LIMIT ?",
            due_order_clause(order)
        );
        let rows = sqlx::query(&sql)
            .bind(due_before.unwrap_or(i64::MAX))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| map_card(row).map_err(StoreError::from))
            .collect()
    }

    async fn earliest_new_card(&self) -> Result<Option<Card>, StoreError> {
        let row = sqlx::query("SELECT * FROM card WHERE interval = 0 ORDER BY ord, id LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_card).transpose().map_err(StoreError::from)
    }

    async fn next_new_card(
        &self,
        related_due_before: i64,
        reviewed_after_ms: i64,
    ) -> Result<Option<Card>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT * FROM card
            WHERE interval = 0
              AND fieldsetid NOT IN (
                SELECT fieldsetid FROM card WHERE interval != 0 AND due < ?
              )
              AND fieldsetid NOT IN (
                SELECT card.fieldsetid
                FROM revlog JOIN card ON card.id = revlog.cardid
                WHERE revlog.id > ?
              )
            ORDER BY ord, id
            LIMIT 1
            "#,
        )
        .bind(related_due_before)
        .bind(reviewed_after_ms)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(map_card).transpose().map_err(StoreError::from)
    }

    async fn count_due_fieldsets(
        &self,
        due_before: i64,
        interval_below: Option<i64>,
    ) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT count(DISTINCT fieldsetid) FROM card
            WHERE interval != 0 AND interval < ? AND due < ?
            "#,
        )
        .bind(interval_below.unwrap_or(i64::MAX))
        .bind(due_before)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn count_due_between(
        &self,
        due_after: i64,
        due_before: i64,
        interval_below: Option<i64>,
    ) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT count(*) FROM card
            WHERE interval != 0 AND interval < ? AND due > ? AND due < ?
            "#,
        )
        .bind(interval_below.unwrap_or(i64::MAX))
        .bind(due_after)
        .bind(due_before)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn update_card_review(&self, card: &Card) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE card
            SET modified = ?, factor = ?, interval = ?, lastinterval = ?, due = ?, views = ?, lapses = ?
            WHERE id = ?
            "#,
        )
        .bind(card.modified)
        .bind(card.factor)
        .bind(card.interval())
        .bind(card.last_interval())
        .bind(card.due())
        .bind(card.views)
        .bind(card.lapses)
        .bind(card.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn defer_related(
        &self,
        fieldset_id: i64,
        except_card_id: i64,
        due: i64,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE card
            SET due = ?
            WHERE fieldsetid = ? AND id != ? AND interval != 0 AND due < ?
            "#,
        )
        .bind(due)
        .bind(fieldset_id)
        .bind(except_card_id)
        .bind(due)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn adjust_cards(
        &self,
        adjustment: f64,
        now: i64,
        min_interval: i64,
        max_interval: i64,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE card
            SET interval = CAST(interval + interval * ?1 AS INTEGER),
                due = CAST(due + interval * ?1 AS INTEGER)
            WHERE due > ?2 AND interval > ?3 AND interval < ?4
            "#,
        )
        .bind(adjustment)
        .bind(now)
        .bind(min_interval)
        .bind(max_interval)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn last_review(&self, card_id: i64) -> Result<Option<ReviewLogEntry>, StoreError> {
        let row = sqlx::query("SELECT * FROM revlog WHERE cardid = ? ORDER BY id DESC LIMIT 1")
            .bind(card_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_review).transpose()
    }

    async fn recent_reviews(
        &self,
        card_id: i64,
        limit: i64,
    ) -> Result<Vec<ReviewLogEntry>, StoreError> {
        let rows = sqlx::query("SELECT * FROM revlog WHERE cardid = ? ORDER BY id DESC LIMIT ?")
            .bind(card_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(map_review).collect()
    }

    async fn max_review_id(&self) -> Result<Option<i64>, StoreError> {
        let max: Option<i64> = sqlx::query_scalar("SELECT max(id) FROM revlog")
            .fetch_one(&self.pool)
            .await?;
        Ok(max)
    }

    async fn average_per_day(&self, metric: DayMetric, days: i64) -> Result<f64, StoreError> {
        let sql = format!(
            r#"
            SELECT avg(n * 1.0) FROM (
                SELECT {} AS n
                FROM revlog
                WHERE revdate != (SELECT max(revdate) FROM revlog)
                GROUP BY revdate
                ORDER BY revdate DESC
                LIMIT ?
            )
            "#,
            day_metric_expr(metric)
        );
        let avg: Option<f64> = sqlx::query_scalar(&sql)
            .bind(days)
            .fetch_one(&self.pool)
            .await?;
        Ok(avg.unwrap_or(0.0))
    }

    async fn study_time_per_card(
        &self,
        new_cards: bool,
        since_ms: Option<i64>,
    ) -> Result<Option<f64>, StoreError> {
        let filter = if new_cards {
            "lastinterval = 0"
        } else {
            "lastinterval != 0"
        };
        let sql = format!(
            r#"
            SELECT avg(n) FROM (
                SELECT sum(studytime) * 1.0 / count(DISTINCT cardid) AS n
                FROM revlog
                WHERE {filter} AND id > ?
                GROUP BY revdate
            )
            "#
        );
        let avg: Option<f64> = sqlx::query_scalar(&sql)
            .bind(since_ms.unwrap_or(0))
            .fetch_one(&self.pool)
            .await?;
        Ok(avg)
    }

    async fn percent_correct_sample(
        &self,
        min_interval: i64,
        max_interval: i64,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<(i64, f64), StoreError> {
        let row = sqlx::query(
            r#"
            SELECT count(*) AS n,
                   avg(CASE WHEN ease = 'fail' THEN 0.0 ELSE 1.0 END) AS fraction
            FROM revlog
            WHERE lastinterval > ? AND lastinterval < ? AND id > ? AND id <= ?
            "#,
        )
        .bind(min_interval)
        .bind(max_interval)
        .bind(from_ms)
        .bind(to_ms)
        .fetch_one(&self.pool)
        .await?;
        let count: i64 = row.try_get("n")?;
        let fraction: Option<f64> = row.try_get("fraction")?;
        Ok((count, fraction.unwrap_or(0.0)))
    }

    async fn append_review(&self, entry: &ReviewLogEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO revlog (id, revdate, cardid, ease, interval, lastinterval, factor, viewtime, studytime, lapses)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id)
        .bind(&entry.rev_date)
        .bind(entry.card_id)
        .bind(entry.ease.as_str())
        .bind(entry.interval)
        .bind(entry.last_interval)
        .bind(entry.factor)
        .bind(entry.view_time)
        .bind(entry.study_time)
        .bind(entry.lapses)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
