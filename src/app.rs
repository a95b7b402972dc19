use chrono::NaiveDate;
use std::fmt::Write;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::api_connection::{ApiConnectionError, CompletionService};
use crate::charts::{progress_bar, render_trend};
use crate::export::{export_to_dir, preview_table, ExportError, ExportOutcome, ExportRange};
use crate::meal_store::{MealRecord, MealSlot, MealStore, StoreError};
use crate::nutrition_extractor::{extract_nutrition, Nutrition, MAX_PLAUSIBLE_AMOUNT};
use crate::recipe_generator::{split_ingredients, RecipeGenerator};
use crate::scoring::{
    goal_progress, score_days, sum_nutrition, trend_score, DailyGoals, GoalProgress, ScoredDay,
};

pub const TREND_DAYS: u32 = 7;

const PROGRESS_WIDTH: usize = 20;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("generating {slot} failed ({saved} earlier meal(s) kept): {source}")]
    Generation {
        slot: MealSlot,
        saved: usize,
        #[source]
        source: ApiConnectionError,
    },
    #[error("calorie value must be between 0 and {max}, got {0}", max = MAX_PLAUSIBLE_AMOUNT)]
    InvalidCalories(i64),
    #[error("terminal I/O failed: {0}")]
    Output(#[from] io::Error),
}

/// Ingredient phrases typed for each slot of one day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayIngredients {
    pub breakfast: String,
    pub lunch: String,
    pub dinner: String,
}

impl DayIngredients {
    pub fn per_slot(&self) -> [(MealSlot, &str); 3] {
        [
            (MealSlot::Breakfast, self.breakfast.as_str()),
            (MealSlot::Lunch, self.lunch.as_str()),
            (MealSlot::Dinner, self.dinner.as_str()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMeal {
    pub id: i64,
    pub slot: MealSlot,
    pub nutrition: Nutrition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TodayView {
    pub date: NaiveDate,
    pub meals: Vec<MealRecord>,
    pub totals: Nutrition,
    pub progress: Vec<GoalProgress>,
}

impl TodayView {
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Meals for {}", self.date);
        if self.meals.is_empty() {
            out.push_str("No records yet.\n");
            return out;
        }

        for meal in &self.meals {
            let _ = writeln!(
                out,
                "  #{:<4} {:<9} | {} kcal | protein {} g | carbs {} g",
                meal.id, meal.meal_slot, meal.calories, meal.protein, meal.carbs
            );
        }

        out.push_str("\nTotals\n");
        for p in &self.progress {
            let _ = writeln!(
                out,
                "  {:<8} {:>5}/{:<5} {:<4} {:+6}  {}",
                p.nutrient.label(),
                p.actual,
                p.goal,
                p.nutrient.unit(),
                p.delta,
                progress_bar(p.progress, PROGRESS_WIDTH)
            );
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendView {
    pub end: NaiveDate,
    pub window: u32,
    pub days: Vec<ScoredDay>,
    pub mean_score: Option<f64>,
    pub goals: DailyGoals,
}

impl TrendView {
    pub fn render(&self) -> String {
        if self.days.is_empty() {
            return format!("No history in the {} days up to {}.\n", self.window, self.end);
        }
        render_trend(&self.days, &self.goals, self.mean_score)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub outcome: ExportOutcome,
    pub preview: Option<String>,
}

impl ExportReport {
    pub fn render(&self) -> String {
        match &self.outcome {
            ExportOutcome::NoRecords { start, end } => {
                format!("No records between {} and {}.\n", start, end)
            }
            ExportOutcome::Written { path, rows } => format!(
                "{}\nExported {} row(s) to {}\n",
                self.preview.as_deref().unwrap_or_default(),
                rows,
                path.display()
            ),
        }
    }
}

pub fn render_meal_detail(meal: &MealRecord) -> String {
    format!(
        "#{} {} on {}\n\n{}\n\n{} kcal | protein {} g | carbs {} g\n",
        meal.id,
        meal.meal_slot,
        meal.date,
        meal.recipe.trim(),
        meal.calories,
        meal.protein,
        meal.carbs
    )
}

/// The user-facing actions, each running to completion against the store.
pub struct App<S> {
    store: MealStore,
    generator: RecipeGenerator<S>,
    goals: DailyGoals,
}

impl<S: CompletionService> App<S> {
    pub fn new(store: MealStore, service: S, goals: DailyGoals) -> Self {
        Self {
            store,
            generator: RecipeGenerator::new(service),
            goals,
        }
    }

    pub fn store(&self) -> &MealStore {
        &self.store
    }

    pub fn service(&self) -> &S {
        self.generator.service()
    }

    /// Generates, extracts and saves breakfast, lunch and dinner in that
    /// order. The first failing slot stops the run; meals saved before it
    /// stay in the log.
    pub async fn generate_day(
        &self,
        model: &str,
        ingredients: &DayIngredients,
        date: NaiveDate,
    ) -> Result<Vec<GeneratedMeal>, AppError> {
        let mut generated = Vec::with_capacity(3);

        for (slot, phrase) in ingredients.per_slot() {
            let items = split_ingredients(phrase);
            if items.is_empty() {
                warn!(%slot, "no ingredients given, letting the model choose");
            }

            let recipe = match self
                .generator
                .generate_meal(model, slot.as_str(), &items)
                .await
            {
                Ok(text) => text,
                Err(source) => {
                    error!(%slot, error = %source, "recipe generation failed");
                    return Err(AppError::Generation {
                        slot,
                        saved: generated.len(),
                        source,
                    });
                }
            };

            let nutrition = extract_nutrition(&recipe);
            let id = self
                .store
                .save(date, slot.as_str(), &recipe, nutrition)
                .await?;
            info!(id, %slot, calories = nutrition.calories, "meal logged");
            generated.push(GeneratedMeal {
                id,
                slot,
                nutrition,
            });
        }

        Ok(generated)
    }

    pub async fn today_view(&self, date: NaiveDate) -> Result<TodayView, AppError> {
        let meals = self.store.list_for_date(date).await?;
        let totals = sum_nutrition(&meals);
        Ok(TodayView {
            date,
            progress: goal_progress(&totals, &self.goals),
            meals,
            totals,
        })
    }

    pub async fn meal_detail(&self, id: i64) -> Result<Option<MealRecord>, AppError> {
        Ok(self.store.get(id).await?)
    }

    /// Returns whether a meal with `id` existed.
    pub async fn edit_calories(&self, id: i64, calories: i64) -> Result<bool, AppError> {
        if !(0..=MAX_PLAUSIBLE_AMOUNT).contains(&calories) {
            return Err(AppError::InvalidCalories(calories));
        }
        let updated = self.store.update_calories(id, calories).await?;
        if !updated {
            info!(id, "no meal to update");
        }
        Ok(updated)
    }

    /// Returns whether a meal with `id` existed.
    pub async fn delete_meal(&self, id: i64) -> Result<bool, AppError> {
        let removed = self.store.delete(id).await?;
        if !removed {
            info!(id, "no meal to delete");
        }
        Ok(removed)
    }

    pub async fn trend_view(&self, end: NaiveDate, days: u32) -> Result<TrendView, AppError> {
        let totals = self.store.totals_for_window(end, days).await?;
        let scored = score_days(&totals, &self.goals);
        let scores: Vec<u32> = scored.iter().map(|day| day.score).collect();
        Ok(TrendView {
            end,
            window: days,
            mean_score: trend_score(&scores),
            days: scored,
            goals: self.goals,
        })
    }

    pub async fn export(
        &self,
        range: ExportRange,
        today: NaiveDate,
        out_dir: &Path,
    ) -> Result<ExportReport, AppError> {
        let (start, end) = range.resolve(today)?;
        let records = self.store.range_query(start, end).await?;
        let preview = (!records.is_empty()).then(|| preview_table(&records));
        let outcome = export_to_dir(out_dir, start, end, &records)?;

        if let ExportOutcome::Written { path, rows } = &outcome {
            info!(path = %path.display(), rows, "export written");
        }
        Ok(ExportReport { outcome, preview })
    }
}
