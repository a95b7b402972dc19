use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

use crate::nutrition_extractor::Nutrition;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The eating occasions a day is generated for, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealSlot {
    pub const ALL: [MealSlot; 3] = [MealSlot::Breakfast, MealSlot::Lunch, MealSlot::Dinner];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::Lunch => "lunch",
            MealSlot::Dinner => "dinner",
        }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted meal. `meal_slot` is kept as text so rows written with
/// slots other than the three canonical ones still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct MealRecord {
    pub id: i64,
    pub date: NaiveDate,
    pub meal_slot: String,
    pub recipe: String,
    pub calories: i64,
    pub protein: i64,
    pub carbs: i64,
}

impl MealRecord {
    pub fn nutrition(&self) -> Nutrition {
        Nutrition::new(self.calories, self.protein, self.carbs)
    }
}

/// Summed nutrition of all meals logged on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, FromRow)]
pub struct DailyTotals {
    pub date: NaiveDate,
    pub calories: i64,
    pub protein: i64,
    pub carbs: i64,
}

impl DailyTotals {
    pub fn nutrition(&self) -> Nutrition {
        Nutrition::new(self.calories, self.protein, self.carbs)
    }
}

const CREATE_MEALS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS meals (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        meal_slot TEXT NOT NULL,
        recipe TEXT NOT NULL,
        calories INTEGER NOT NULL DEFAULT 0 CHECK (calories >= 0),
        protein INTEGER NOT NULL DEFAULT 0 CHECK (protein >= 0),
        carbs INTEGER NOT NULL DEFAULT 0 CHECK (carbs >= 0)
    )
"#;

// Canonical slots first in eating order, anything else after them by name.
const SLOT_ORDER: &str = "CASE meal_slot \
    WHEN 'breakfast' THEN 0 WHEN 'lunch' THEN 1 WHEN 'dinner' THEN 2 ELSE 3 END, \
    meal_slot, id";

const RECORD_COLUMNS: &str = "id, date, meal_slot, recipe, calories, protein, carbs";

/// SQLite-backed meal log. Every method runs in its own transaction.
#[derive(Clone)]
pub struct MealStore {
    pool: SqlitePool,
}

impl MealStore {
    /// Opens (creating if needed) the database file at `path`.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        info!(path = %path.display(), "meal store ready");
        Ok(store)
    }

    /// A private in-memory database, gone when the store is dropped.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // One connection that never expires, or the database would vanish.
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

    async fn migrate(&self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(CREATE_MEALS_TABLE).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn save(
        &self,
        date: NaiveDate,
        meal_slot: &str,
        recipe: &str,
        nutrition: Nutrition,
    ) -> Result<i64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "INSERT INTO meals (date, meal_slot, recipe, calories, protein, carbs) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(date)
        .bind(meal_slot)
        .bind(recipe)
        .bind(nutrition.calories.max(0))
        .bind(nutrition.protein.max(0))
        .bind(nutrition.carbs.max(0))
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        let id = result.last_insert_rowid();
        debug!(id, %date, meal_slot, "meal saved");
        Ok(id)
    }

    pub async fn get(&self, id: i64) -> Result<Option<MealRecord>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let record = sqlx::query_as::<_, MealRecord>(&format!(
            "SELECT {} FROM meals WHERE id = ?",
            RECORD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(record)
    }

    pub async fn list_for_date(&self, date: NaiveDate) -> Result<Vec<MealRecord>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let records = sqlx::query_as::<_, MealRecord>(&format!(
            "SELECT {} FROM meals WHERE date = ? ORDER BY {}",
            RECORD_COLUMNS, SLOT_ORDER
        ))
        .bind(date)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(records)
    }

    /// Per-day sums over the `days` calendar days ending today.
    pub async fn totals_for_last_n_days(&self, days: u32) -> Result<Vec<DailyTotals>, StoreError> {
        self.totals_for_window(Local::now().date_naive(), days).await
    }

    /// Per-day sums over the `days` calendar days ending at `end`, oldest
    /// first. Days without meals are left out. A window reaching past the
    /// earliest representable date starts there.
    pub async fn totals_for_window(
        &self,
        end: NaiveDate,
        days: u32,
    ) -> Result<Vec<DailyTotals>, StoreError> {
        if days == 0 {
            return Ok(Vec::new());
        }
        let start = end
            .checked_sub_signed(Duration::days(i64::from(days) - 1))
            .unwrap_or(NaiveDate::MIN);

        let mut tx = self.pool.begin().await?;
        let totals = sqlx::query_as::<_, DailyTotals>(
            "SELECT date, \
                    COALESCE(SUM(calories), 0) AS calories, \
                    COALESCE(SUM(protein), 0) AS protein, \
                    COALESCE(SUM(carbs), 0) AS carbs \
             FROM meals \
             WHERE date BETWEEN ? AND ? \
             GROUP BY date \
             ORDER BY date",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(totals)
    }

    /// Removes one meal. Returns `false` when no meal had that id.
    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM meals WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        let removed = result.rows_affected() > 0;
        debug!(id, removed, "meal delete");
        Ok(removed)
    }

    /// Overwrites the calorie value of one meal and nothing else. Returns
    /// `false` when no meal had that id.
    pub async fn update_calories(&self, id: i64, calories: i64) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("UPDATE meals SET calories = ? WHERE id = ?")
            .bind(calories)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        let updated = result.rows_affected() > 0;
        debug!(id, calories, updated, "meal calories update");
        Ok(updated)
    }

    /// All meals dated within `start..=end`, ordered by date then slot.
    pub async fn range_query(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MealRecord>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let records = sqlx::query_as::<_, MealRecord>(&format!(
            "SELECT {} FROM meals WHERE date BETWEEN ? AND ? ORDER BY date, {}",
            RECORD_COLUMNS, SLOT_ORDER
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meal_slot_text_is_lowercase_name() {
        let names: Vec<_> = MealSlot::ALL.iter().map(|slot| slot.to_string()).collect();
        assert_eq!(names, vec!["breakfast", "lunch", "dinner"]);
    }

    #[tokio::test]
    async fn window_longer_than_the_calendar_starts_at_earliest_date() {
        let store = MealStore::in_memory().await.unwrap();
        let first = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        store.save(first, "lunch", "a", Nutrition::new(100, 1, 1)).await.unwrap();
        store.save(end, "lunch", "b", Nutrition::new(200, 1, 1)).await.unwrap();

        let totals = store.totals_for_window(end, u32::MAX).await.unwrap();
        let days: Vec<_> = totals.iter().map(|t| t.date).collect();
        assert_eq!(days, vec![first, end]);
    }

    #[tokio::test]
    async fn window_of_zero_days_is_empty() {
        let store = MealStore::in_memory().await.unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        store
            .save(day, "lunch", "soup", Nutrition::new(300, 10, 40))
            .await
            .unwrap();
        assert!(store.totals_for_window(day, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ids_are_monotonic() {
        let store = MealStore::in_memory().await.unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let first = store.save(day, "lunch", "a", Nutrition::default()).await.unwrap();
        let second = store.save(day, "lunch", "b", Nutrition::default()).await.unwrap();
        assert!(second > first);

        // Deleted ids are not handed out again.
        store.delete(second).await.unwrap();
        let third = store.save(day, "lunch", "c", Nutrition::default()).await.unwrap();
        assert!(third > second);
    }
}
