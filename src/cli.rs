use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use crate::api_connection::{CompletionService, LOCAL_MODELS};
use crate::app::{render_meal_detail, App, AppError, DayIngredients, TREND_DAYS};
use crate::config::AppConfig;
use crate::export::ExportRange;

#[derive(Parser, Debug)]
#[command(author, version, about = "Turn what's in the fridge into logged meals", long_about = None)]
pub struct Cli {
    /// Path to the SQLite meal log (overrides FRIDGE_CHEF_DB)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Generate and log breakfast, lunch and dinner for today
    Generate {
        /// Breakfast ingredients, separated by spaces or commas. Takes every
        /// word up to the next flag.
        #[arg(long, num_args = 1.., default_values = ["oats", "milk", "eggs"])]
        breakfast: Vec<String>,
        #[arg(long, num_args = 1.., default_values = ["rice", "tomato", "eggs"])]
        lunch: Vec<String>,
        #[arg(long, num_args = 1.., default_values = ["fish", "tofu", "vegetables"])]
        dinner: Vec<String>,
        /// Model to ask (defaults to FRIDGE_CHEF_MODEL)
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Show today's meals and totals against the daily goals
    Today,
    /// Show the full recipe of one meal
    Show { id: i64 },
    /// Overwrite the calorie value of one meal
    Edit {
        id: i64,
        #[arg(allow_negative_numbers = true)]
        calories: i64,
    },
    /// Delete one meal
    Delete { id: i64 },
    /// Nutrient trend and health score for the last days
    Trend {
        #[arg(
            long,
            default_value_t = TREND_DAYS,
            value_parser = clap::value_parser!(u32).range(1..=MAX_TREND_DAYS)
        )]
        days: u32,
    },
    /// Export meals of a date range to CSV
    Export(ExportArgs),
    /// List the models offered for generation
    Models,
    /// Read commands line by line until `quit`
    Interactive,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ExportArgs {
    /// Preset range: 7 or 30 days up to today
    #[arg(long, value_parser = parse_preset_days, conflicts_with_all = ["from", "to"])]
    pub last: Option<u32>,
    #[arg(long, requires = "to")]
    pub from: Option<NaiveDate>,
    #[arg(long, requires = "from")]
    pub to: Option<NaiveDate>,
    /// Directory for the CSV file (defaults to FRIDGE_CHEF_EXPORT_DIR)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

impl ExportArgs {
    pub fn range(&self) -> ExportRange {
        match (self.last, self.from, self.to) {
            (_, Some(start), Some(end)) => ExportRange::Custom { start, end },
            (Some(days), _, _) => ExportRange::LastDays(days),
            _ => ExportRange::LastDays(7),
        }
    }
}

const MAX_TREND_DAYS: i64 = 3650;

fn parse_preset_days(value: &str) -> Result<u32, String> {
    match value.trim() {
        "7" => Ok(7),
        "30" => Ok(30),
        other => Err(format!("expected 7 or 30, got '{}'", other)),
    }
}

/// One line of interactive input, parsed without a binary name.
#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
struct InteractiveLine {
    #[command(subcommand)]
    command: Command,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Runs one command and writes its view to `out`.
pub async fn run_command<S, W>(
    app: &App<S>,
    config: &AppConfig,
    command: Command,
    out: &mut W,
) -> Result<(), AppError>
where
    S: CompletionService,
    W: Write,
{
    debug!(?command, "running command");
    match command {
        Command::Generate {
            breakfast,
            lunch,
            dinner,
            model,
        } => {
            let model = model.unwrap_or_else(|| config.default_model.clone());
            if !LOCAL_MODELS.iter().any(|m| m.model_name == model) {
                warn!(%model, "model is not in the local catalogue, trying it anyway");
            }
            let ingredients = DayIngredients {
                breakfast: breakfast.join(" "),
                lunch: lunch.join(" "),
                dinner: dinner.join(" "),
            };
            let meals = app.generate_day(&model, &ingredients, today()).await?;
            for meal in &meals {
                writeln!(
                    out,
                    "Saved #{} {} ({} kcal)",
                    meal.id, meal.slot, meal.nutrition.calories
                )?;
            }
            write!(out, "{}", app.today_view(today()).await?.render())?;
        }
        Command::Today => {
            write!(out, "{}", app.today_view(today()).await?.render())?;
        }
        Command::Show { id } => match app.meal_detail(id).await? {
            Some(meal) => write!(out, "{}", render_meal_detail(&meal))?,
            None => writeln!(out, "No meal #{}.", id)?,
        },
        Command::Edit { id, calories } => {
            if app.edit_calories(id, calories).await? {
                writeln!(out, "Meal #{} now has {} kcal.", id, calories)?;
            } else {
                writeln!(out, "No meal #{}.", id)?;
            }
        }
        Command::Delete { id } => {
            if app.delete_meal(id).await? {
                writeln!(out, "Meal #{} deleted.", id)?;
            } else {
                writeln!(out, "No meal #{}.", id)?;
            }
        }
        Command::Trend { days } => {
            write!(out, "{}", app.trend_view(today(), days).await?.render())?;
        }
        Command::Export(args) => {
            let dir = args.out_dir.clone().unwrap_or_else(|| config.export_dir.clone());
            let report = app.export(args.range(), today(), &dir).await?;
            write!(out, "{}", report.render())?;
        }
        Command::Models => {
            for model in LOCAL_MODELS {
                let marker = if model.model_name == config.default_model {
                    " (default)"
                } else {
                    ""
                };
                writeln!(out, "{} [{}]{}", model.model_name, model.model_source, marker)?;
            }
        }
        Command::Interactive => {
            writeln!(out, "Already in interactive mode.")?;
        }
    }
    Ok(())
}

/// Reads commands from `input` until `quit`/`exit` or end of input. A
/// command that fails prints a notice and the loop carries on.
pub async fn run_interactive<S, R, W>(
    app: &App<S>,
    config: &AppConfig,
    input: R,
    out: &mut W,
) -> Result<(), AppError>
where
    S: CompletionService,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(
        out,
        "fridge-chef interactive mode. Type `help` for commands, `quit` to leave."
    )?;
    writeln!(
        out,
        "Example: generate --breakfast oats milk eggs --lunch rice, tomato"
    )?;

    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.first().copied() {
            None => continue,
            Some("quit") | Some("exit") => break,
            Some(_) => {}
        }

        match InteractiveLine::try_parse_from(words.iter().copied()) {
            Ok(parsed) => {
                if let Err(err) = run_command(app, config, parsed.command, out).await {
                    warn!(error = %err, "command failed");
                    writeln!(out, "error: {}", err)?;
                }
            }
            // Help and usage errors both land here; clap renders them.
            Err(err) => write!(out, "{}", err.render())?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_generate_with_defaults() {
        let cli = Cli::try_parse_from(["fridge-chef", "generate", "--lunch", "noodles beef"]).unwrap();
        match cli.command {
            Command::Generate {
                breakfast,
                lunch,
                model,
                ..
            } => {
                assert_eq!(breakfast, vec!["oats", "milk", "eggs"]);
                assert_eq!(lunch, vec!["noodles beef"]);
                assert_eq!(model, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn global_db_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["fridge-chef", "today", "--db", "/tmp/x.db"]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        assert_eq!(cli.command, Command::Today);
    }

    #[test]
    fn edit_accepts_negative_for_app_validation() {
        let cli = Cli::try_parse_from(["fridge-chef", "edit", "3", "-5"]).unwrap();
        assert_eq!(cli.command, Command::Edit { id: 3, calories: -5 });
    }

    #[test]
    fn export_ranges() {
        let parse = |args: &[&str]| {
            let mut full = vec!["fridge-chef", "export"];
            full.extend_from_slice(args);
            match Cli::try_parse_from(full).map(|c| c.command) {
                Ok(Command::Export(args)) => Ok(args.range()),
                Ok(other) => panic!("unexpected command {:?}", other),
                Err(e) => Err(e),
            }
        };

        assert_eq!(parse(&[]).unwrap(), ExportRange::LastDays(7));
        assert_eq!(parse(&["--last", "30"]).unwrap(), ExportRange::LastDays(30));
        assert_eq!(
            parse(&["--from", "2024-01-01", "--to", "2024-01-31"]).unwrap(),
            ExportRange::Custom {
                start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            }
        );
        assert!(parse(&["--last", "14"]).is_err());
        assert!(parse(&["--from", "2024-01-01"]).is_err());
        assert!(parse(&["--last", "7", "--from", "2024-01-01", "--to", "2024-01-02"]).is_err());
    }

    #[test]
    fn interactive_lines_parse_without_binary_name() {
        let parsed = InteractiveLine::try_parse_from(["delete", "4"]).unwrap();
        assert_eq!(parsed.command, Command::Delete { id: 4 });
    }

    #[test]
    fn ingredient_flags_take_words_up_to_the_next_flag() {
        let words = "generate --breakfast oats milk --dinner steamed fish -m mistral";
        let parsed = InteractiveLine::try_parse_from(words.split_whitespace()).unwrap();
        match parsed.command {
            Command::Generate {
                breakfast,
                lunch,
                dinner,
                model,
            } => {
                assert_eq!(breakfast, vec!["oats", "milk"]);
                assert_eq!(lunch, vec!["rice", "tomato", "eggs"]);
                assert_eq!(dinner, vec!["steamed", "fish"]);
                assert_eq!(model.as_deref(), Some("mistral"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn trend_days_are_bounded() {
        let days = |value: &str| {
            Cli::try_parse_from(["fridge-chef", "trend", "--days", value]).map(|cli| cli.command)
        };
        assert_eq!(days("30").unwrap(), Command::Trend { days: 30 });
        assert!(days("0").is_err());
        assert!(days("4000000000").is_err());
        assert_eq!(
            Cli::try_parse_from(["fridge-chef", "trend"]).unwrap().command,
            Command::Trend { days: TREND_DAYS }
        );
    }
}
