//! External service boundary for FitFeast.
//!
//! Home of the analysis gateway implementation that talks to the Gemini
//! vision API.

pub mod gemini_food_analyzer;

pub use gemini_food_analyzer::GeminiFoodAnalyzer;
