//! Daily intake summary for the dashboard.

use chrono::{NaiveDate, Utc};

use crate::log::DailyLog;

/// Aggregated intake for one calendar day (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DailySummary {
    /// Number of entries logged that day.
    pub entries: usize,
    /// Total kilocalories.
    pub calories: u32,
    /// Total protein grams.
    pub protein: f64,
    /// Total carbohydrate grams.
    pub carbs: f64,
    /// Total fat grams.
    pub fat: f64,
}

impl DailySummary {
    /// Sums the entries logged on `day`.
    ///
    /// The log collection is taken as-is (newest first); entries from other
    /// days are skipped, not assumed absent.
    pub fn for_day(logs: &[DailyLog], day: NaiveDate) -> Self {
        let mut summary = Self::default();
        for log in logs {
            if log.logged_at.date_naive() != day {
                continue;
            }
            summary.entries += 1;
            summary.calories += log.nutrients.calories;
            summary.protein += log.nutrients.protein;
            summary.carbs += log.nutrients.carbs;
            summary.fat += log.nutrients.fat;
        }
        summary
    }

    /// Sums the entries logged today (UTC).
    pub fn today(logs: &[DailyLog]) -> Self {
        Self::for_day(logs, Utc::now().date_naive())
    }
}
