//! Aggregate statistics over a user's recent generations

use std::{collections::HashMap, fmt, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ContentType, GenerationRecord, GenerationStatus};

/// Window over which statistics are computed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum StatsTimeframe {
    /// Last 7 days
    Week,
    /// Last 30 days
    #[default]
    Month,
    /// Last 90 days
    Quarter,
}

impl StatsTimeframe {
    pub fn days(&self) -> i64 {
        match self {
            StatsTimeframe::Week => 7,
            StatsTimeframe::Month => 30,
            StatsTimeframe::Quarter => 90,
        }
    }

    /// Earliest `created_at` included in the window ending at `now`
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days())
    }
}

impl fmt::Display for StatsTimeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d", self.days())
    }
}

impl FromStr for StatsTimeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "7d" => Ok(StatsTimeframe::Week),
            "30d" => Ok(StatsTimeframe::Month),
            "90d" => Ok(StatsTimeframe::Quarter),
            other => Err(format!("unknown timeframe '{}' (expected 7d, 30d or 90d)", other)),
        }
    }
}

/// Counts and timings for a set of generation records
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GenerationStats {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,

    /// Mean `generation_time_ms` over all records in the window
    pub average_time_ms: f64,

    pub content_type_breakdown: HashMap<ContentType, usize>,
}

impl GenerationStats {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a GenerationRecord>,
    {
        let mut stats = GenerationStats::default();
        let mut total_time: u64 = 0;

        for record in records {
            stats.total += 1;
            match record.status {
                GenerationStatus::Completed => stats.completed += 1,
                GenerationStatus::Failed => stats.failed += 1,
                GenerationStatus::Pending | GenerationStatus::Generating => {}
            }
            total_time = total_time.saturating_add(record.generation_time_ms);
            *stats
                .content_type_breakdown
                .entry(record.content_type)
                .or_insert(0) += 1;
        }

        if stats.total > 0 {
            stats.average_time_ms = total_time as f64 / stats.total as f64;
        }
        stats
    }

    /// Share of completed generations, 0 when there are none
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}
