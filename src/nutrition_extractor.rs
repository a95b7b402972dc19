use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Calories, protein grams and carbohydrate grams of one meal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: i64,
    pub protein: i64,
    pub carbs: i64,
}

impl Nutrition {
    pub fn new(calories: i64, protein: i64, carbs: i64) -> Self {
        Self {
            calories,
            protein,
            carbs,
        }
    }
}

/// Largest amount taken at face value. Anything above it is treated as a
/// misread and counts as a miss.
pub const MAX_PLAUSIBLE_AMOUNT: i64 = 100_000;

// An amount is the integer part of a number not glued to a preceding digit
// or point, so `12.5 g` reads as 12 rather than 5. The nutrient word has to
// follow the gram amount inside the same fragment: no comma, semicolon,
// full stop, enumeration mark or line break in between.
lazy_static! {
    static ref CALORIES_RE: Regex =
        Regex::new(r"(?:^|[^0-9.])([0-9]+)(?:\.[0-9]+)?\s*k?cal").unwrap();
    static ref PROTEIN_RE: Regex = Regex::new(
        r"(?:^|[^0-9.])([0-9]+)(?:\.[0-9]+)?\s*g[^,;.，；、。\n]*(?:protein|蛋白)"
    )
    .unwrap();
    static ref CARBS_RE: Regex = Regex::new(
        r"(?:^|[^0-9.])([0-9]+)(?:\.[0-9]+)?\s*g[^,;.，；、。\n]*(?:carb|碳水)"
    )
    .unwrap();
}

fn first_amount(re: &Regex, text: &str) -> i64 {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .filter(|amount| *amount <= MAX_PLAUSIBLE_AMOUNT)
        .unwrap_or(0)
}

/// Pulls a nutrition estimate out of free-form recipe text.
///
/// Each field is looked up independently and falls back to 0 when the text
/// has no matching amount. Never fails.
pub fn extract_nutrition(text: &str) -> Nutrition {
    let lowered = text.to_lowercase();
    Nutrition {
        calories: first_amount(&CALORIES_RE, &lowered),
        protein: first_amount(&PROTEIN_RE, &lowered),
        carbs: first_amount(&CARBS_RE, &lowered),
    }
}
