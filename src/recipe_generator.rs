use crate::api_connection::{ApiConnectionError, CompletionService};
use tracing::{debug, info};

/// Sampling temperature used for every recipe request.
pub const RECIPE_TEMPERATURE: f32 = 0.7;

/// Splits a typed ingredient phrase ("oats milk, eggs") into items.
pub fn split_ingredients(phrase: &str) -> Vec<String> {
    phrase
        .split(|c: char| c.is_whitespace() || c == ',' || c == '，' || c == '、')
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn build_prompt(meal_label: &str, ingredients: &[String]) -> String {
    format!(
        "You are a nutrition-minded chef. Design a {meal} recipe using these ingredients: {ingredients}.

Reply with:
- Dish name
- Short procedure
- Nutrition estimate on one line, formatted exactly like: 450 kcal, 25 g protein, 60 g carbs",
        meal = meal_label,
        ingredients = ingredients.join(", "),
    )
}

/// Turns ingredients into a recipe by asking the completion service once.
pub struct RecipeGenerator<S> {
    service: S,
}

impl<S: CompletionService> RecipeGenerator<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Returns the raw completion text. Errors are not retried; the caller
    /// decides what to do with the meal slot.
    pub async fn generate_meal(
        &self,
        model: &str,
        meal_label: &str,
        ingredients: &[String],
    ) -> Result<String, ApiConnectionError> {
        let prompt = build_prompt(meal_label, ingredients);
        debug!(%model, meal = meal_label, "requesting recipe");

        let text = self
            .service
            .complete(model, &prompt, RECIPE_TEMPERATURE)
            .await?;

        info!(%model, meal = meal_label, chars = text.len(), "recipe generated");
        Ok(text)
    }
}
