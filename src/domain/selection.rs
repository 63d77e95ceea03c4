// Meter selection and date range
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    pub fn single_day(day: NaiveDate) -> Self {
        Self { start_date: day, end_date: day }
    }

    pub fn today() -> Self {
        Self::single_day(chrono::Local::now().date_naive())
    }

    /// Polling only runs for ranges that end on `today`.
    pub fn ends_on(&self, today: NaiveDate) -> bool {
        self.end_date == today
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub meter: String,
    #[serde(flatten)]
    pub range: DateRange,
}

impl Selection {
    pub fn new(meter: impl Into<String>, range: DateRange) -> Self {
        Self { meter: meter.into(), range }
    }

    pub fn today(meter: impl Into<String>) -> Self {
        Self::new(meter, DateRange::today())
    }
}
