use serde::Serialize;

use crate::meal_store::{DailyTotals, MealRecord};
use crate::nutrition_extractor::Nutrition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Nutrient {
    Calories,
    Protein,
    Carbs,
}

impl Nutrient {
    pub const ALL: [Nutrient; 3] = [Nutrient::Calories, Nutrient::Protein, Nutrient::Carbs];

    pub fn label(&self) -> &'static str {
        match self {
            Nutrient::Calories => "calories",
            Nutrient::Protein => "protein",
            Nutrient::Carbs => "carbs",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Nutrient::Calories => "kcal",
            Nutrient::Protein | Nutrient::Carbs => "g",
        }
    }

    pub fn amount_in(&self, nutrition: &Nutrition) -> i64 {
        match self {
            Nutrient::Calories => nutrition.calories,
            Nutrient::Protein => nutrition.protein,
            Nutrient::Carbs => nutrition.carbs,
        }
    }
}

/// Fixed daily targets. Built once and handed to whoever scores or
/// displays totals; nothing mutates it at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyGoals {
    pub calories: i64,
    pub protein: i64,
    pub carbs: i64,
}

impl Default for DailyGoals {
    fn default() -> Self {
        Self {
            calories: 2000,
            protein: 100,
            carbs: 250,
        }
    }
}

impl DailyGoals {
    pub fn goal_for(&self, nutrient: Nutrient) -> i64 {
        match nutrient {
            Nutrient::Calories => self.calories,
            Nutrient::Protein => self.protein,
            Nutrient::Carbs => self.carbs,
        }
    }
}

/// Scores one nutrient against its goal: 100 within 10%, 80 within 20%,
/// 60 otherwise. Over and under count the same.
pub fn nutrient_sub_score(actual: i64, goal: i64) -> u32 {
    if goal <= 0 {
        return if actual == 0 { 100 } else { 60 };
    }
    // Integer comparison keeps the 10% and 20% boundaries exact.
    let deviation = (i128::from(actual) - i128::from(goal)).abs();
    let goal = i128::from(goal);
    if deviation * 10 <= goal {
        100
    } else if deviation * 5 <= goal {
        80
    } else {
        60
    }
}

/// Health score of one day, 0–100.
pub fn day_score(nutrition: &Nutrition, goals: &DailyGoals) -> u32 {
    let total: u32 = Nutrient::ALL
        .iter()
        .map(|n| nutrient_sub_score(n.amount_in(nutrition), goals.goal_for(*n)))
        .sum();
    (f64::from(total) / Nutrient::ALL.len() as f64).round() as u32
}

/// Mean of per-day scores, rounded to one decimal. `None` without days.
pub fn trend_score(scores: &[u32]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let mean = scores.iter().map(|s| f64::from(*s)).sum::<f64>() / scores.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredDay {
    pub totals: DailyTotals,
    pub score: u32,
}

pub fn score_days(totals: &[DailyTotals], goals: &DailyGoals) -> Vec<ScoredDay> {
    totals
        .iter()
        .map(|day| ScoredDay {
            totals: *day,
            score: day_score(&day.nutrition(), goals),
        })
        .collect()
}

pub fn sum_nutrition(records: &[MealRecord]) -> Nutrition {
    records.iter().fold(Nutrition::default(), |acc, record| Nutrition {
        calories: acc.calories.saturating_add(record.calories),
        protein: acc.protein.saturating_add(record.protein),
        carbs: acc.carbs.saturating_add(record.carbs),
    })
}

/// Where one nutrient stands against its goal for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoalProgress {
    pub nutrient: Nutrient,
    pub actual: i64,
    pub goal: i64,
    /// Signed: positive when over the goal.
    pub delta: i64,
    /// `actual / goal`, capped at 1.0.
    pub progress: f64,
}

pub fn goal_progress(nutrition: &Nutrition, goals: &DailyGoals) -> Vec<GoalProgress> {
    Nutrient::ALL
        .iter()
        .map(|nutrient| {
            let actual = nutrient.amount_in(nutrition);
            let goal = goals.goal_for(*nutrient);
            let progress = if goal > 0 {
                (actual as f64 / goal as f64).clamp(0.0, 1.0)
            } else {
                1.0
            };
            GoalProgress {
                nutrient: *nutrient,
                actual,
                goal,
                delta: actual - goal,
                progress,
            }
        })
        .collect()
}
