pub mod api_connection;
pub mod app;
pub mod charts;
pub mod cli;
pub mod config;
pub mod export;
pub mod logging;
pub mod meal_store;
pub mod nutrition_extractor;
pub mod recipe_generator;
pub mod scoring;
