//! Text charts for the terminal. Everything here is a pure projection of
//! already aggregated numbers into strings.

use std::fmt::Write;

use crate::scoring::{DailyGoals, Nutrient, ScoredDay};

pub const BAR_WIDTH: usize = 40;

const FILL: char = '█';
const GOAL_MARK: char = '|';

fn scaled_len(value: f64, scale: f64, width: usize) -> usize {
    if scale <= 0.0 || value <= 0.0 {
        return 0;
    }
    ((value / scale) * width as f64).round().min(width as f64) as usize
}

/// A bar of `width` cells for `value`, with the goal drawn as `|` on top.
/// Both are scaled against `scale`.
pub fn goal_bar(value: i64, goal: i64, scale: i64, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let mut cells = vec![' '; width];
    let filled = scaled_len(value as f64, scale as f64, width);
    for cell in cells.iter_mut().take(filled) {
        *cell = FILL;
    }
    let marker = scaled_len(goal as f64, scale as f64, width).min(width - 1);
    cells[marker] = GOAL_MARK;
    cells.into_iter().collect()
}

/// `[#####.....]` style indicator for a 0.0–1.0 ratio.
pub fn progress_bar(progress: f64, width: usize) -> String {
    let filled = scaled_len(progress.clamp(0.0, 1.0), 1.0, width);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}

/// One block per nutrient (a row per day, goal marked on each bar), then
/// the daily scores and the window mean.
pub fn render_trend(days: &[ScoredDay], goals: &DailyGoals, mean_score: Option<f64>) -> String {
    let mut out = String::new();

    for nutrient in Nutrient::ALL {
        let goal = goals.goal_for(nutrient);
        let peak = days
            .iter()
            .map(|day| nutrient.amount_in(&day.totals.nutrition()))
            .max()
            .unwrap_or(0);
        let scale = peak.max(goal);

        let _ = writeln!(
            out,
            "{} (goal {} {}, '{}' marks the goal)",
            nutrient.label(),
            goal,
            nutrient.unit(),
            GOAL_MARK
        );
        for day in days {
            let value = nutrient.amount_in(&day.totals.nutrition());
            let _ = writeln!(
                out,
                "  {}  {}  {:>6} {}",
                day.totals.date,
                goal_bar(value, goal, scale, BAR_WIDTH),
                value,
                nutrient.unit()
            );
        }
        out.push('\n');
    }

    out.push_str("health score\n");
    for day in days {
        let filled = scaled_len(f64::from(day.score), 100.0, BAR_WIDTH);
        let _ = writeln!(
            out,
            "  {}  {:<width$}  {:>3}",
            day.totals.date,
            FILL.to_string().repeat(filled),
            day.score,
            width = BAR_WIDTH
        );
    }

    if let Some(mean) = mean_score {
        let _ = writeln!(out, "\n{}-day mean score: {:.1} / 100", days.len(), mean);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meal_store::DailyTotals;
    use chrono::NaiveDate;

    #[test]
    fn goal_marker_sits_inside_an_overshooting_bar() {
        let bar = goal_bar(200, 100, 200, 10);
        assert_eq!(bar.chars().count(), 10);
        assert_eq!(bar, "█████|████");
    }

    #[test]
    fn goal_marker_trails_a_short_bar() {
        let bar = goal_bar(50, 100, 100, 10);
        assert_eq!(bar, "█████    |");
    }

    #[test]
    fn progress_bar_caps_at_full() {
        assert_eq!(progress_bar(0.5, 4), "[##..]");
        assert_eq!(progress_bar(1.7, 4), "[####]");
        assert_eq!(progress_bar(0.0, 4), "[....]");
    }

    #[test]
    fn trend_lists_every_day_and_the_mean() {
        let day = |d, calories, score| ScoredDay {
            totals: DailyTotals {
                date: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
                calories,
                protein: 100,
                carbs: 250,
            },
            score,
        };
        let rendered = render_trend(
            &[day(1, 2000, 100), day(2, 2600, 87)],
            &DailyGoals::default(),
            Some(93.5),
        );

        assert!(rendered.contains("calories (goal 2000 kcal"));
        assert!(rendered.contains("2024-01-02"));
        assert!(rendered.contains("2600 kcal"));
        assert!(rendered.contains("2-day mean score: 93.5 / 100"));
    }
}
