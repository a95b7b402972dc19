use chrono::{Duration, NaiveDate};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::meal_store::MealRecord;

pub const CSV_HEADER: [&str; 6] = [
    "date",
    "meal slot",
    "recipe",
    "calories(kcal)",
    "protein(g)",
    "carbs(g)",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Which dates an export covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportRange {
    /// From `today - n` up to and including today.
    LastDays(u32),
    Custom { start: NaiveDate, end: NaiveDate },
}

impl ExportRange {
    pub fn resolve(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), ExportError> {
        match *self {
            ExportRange::LastDays(days) => Ok((today - Duration::days(i64::from(days)), today)),
            ExportRange::Custom { start, end } if start > end => {
                Err(ExportError::InvalidRange { start, end })
            }
            ExportRange::Custom { start, end } => Ok((start, end)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written { path: PathBuf, rows: usize },
    NoRecords { start: NaiveDate, end: NaiveDate },
}

pub fn export_file_name(start: NaiveDate, end: NaiveDate) -> String {
    format!("nutrition_{}_to_{}.csv", start, end)
}

/// Writes the header and one row per record.
pub fn write_csv<W: Write>(writer: W, records: &[MealRecord]) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_HEADER)?;
    for record in records {
        wtr.write_record([
            record.date.to_string(),
            record.meal_slot.clone(),
            record.recipe.clone(),
            record.calories.to_string(),
            record.protein.to_string(),
            record.carbs.to_string(),
        ])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Writes `records` to `dir/nutrition_{start}_to_{end}.csv`. An empty
/// slice creates no file.
pub fn export_to_dir(
    dir: &Path,
    start: NaiveDate,
    end: NaiveDate,
    records: &[MealRecord],
) -> Result<ExportOutcome, ExportError> {
    if records.is_empty() {
        return Ok(ExportOutcome::NoRecords { start, end });
    }

    let path = dir.join(export_file_name(start, end));
    let file = File::create(&path).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    write_csv(file, records)?;

    Ok(ExportOutcome::Written {
        path,
        rows: records.len(),
    })
}

/// Plain-text preview table. Recipes are cut to their first line.
pub fn preview_table(records: &[MealRecord]) -> String {
    const RECIPE_WIDTH: usize = 32;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<10}  {:<9}  {:<width$}  {:>14}  {:>10}  {:>8}",
        CSV_HEADER[0],
        CSV_HEADER[1],
        CSV_HEADER[2],
        CSV_HEADER[3],
        CSV_HEADER[4],
        CSV_HEADER[5],
        width = RECIPE_WIDTH
    );
    for record in records {
        let first_line = record.recipe.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
        let recipe: String = first_line.trim().chars().take(RECIPE_WIDTH).collect();
        let _ = writeln!(
            out,
            "{:<10}  {:<9}  {:<width$}  {:>14}  {:>10}  {:>8}",
            record.date,
            record.meal_slot,
            recipe,
            record.calories,
            record.protein,
            record.carbs,
            width = RECIPE_WIDTH
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(recipe: &str) -> MealRecord {
        MealRecord {
            id: 1,
            date: date(2024, 1, 1),
            meal_slot: "breakfast".to_string(),
            recipe: recipe.to_string(),
            calories: 400,
            protein: 20,
            carbs: 50,
        }
    }

    #[test]
    fn preset_ranges_end_today() {
        let today = date(2024, 3, 10);
        assert_eq!(
            ExportRange::LastDays(7).resolve(today).unwrap(),
            (date(2024, 3, 3), today)
        );
        assert_eq!(
            ExportRange::LastDays(30).resolve(today).unwrap(),
            (date(2024, 2, 9), today)
        );
    }

    #[test]
    fn reversed_custom_range_is_rejected() {
        let range = ExportRange::Custom {
            start: date(2024, 3, 10),
            end: date(2024, 3, 1),
        };
        assert!(matches!(
            range.resolve(date(2024, 3, 10)),
            Err(ExportError::InvalidRange { .. })
        ));
    }

    #[test]
    fn file_name_embeds_both_dates() {
        assert_eq!(
            export_file_name(date(2024, 1, 1), date(2024, 1, 7)),
            "nutrition_2024-01-01_to_2024-01-07.csv"
        );
    }

    #[test]
    fn csv_has_labeled_header_and_quotes_recipes() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &[record("Oat bowl, warm\n400 kcal")]).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date,meal slot,recipe,calories(kcal),protein(g),carbs(g)"
        );
        assert!(text.contains("2024-01-01,breakfast,\"Oat bowl, warm\n400 kcal\",400,20,50"));
    }

    #[test]
    fn preview_shows_first_recipe_line() {
        let table = preview_table(&[record("\nOat bowl\nstep two")]);
        assert!(table.contains("Oat bowl"));
        assert!(!table.contains("step two"));
    }
}
