//! Daily engagement histogram for campaign analytics.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::types::Timestamp;

/// Window shown on the campaign analytics tab.
pub const DEFAULT_WINDOW_DAYS: u32 = 14;

/// The timestamps of one message that matter for analytics.
#[derive(Debug, Clone, Default)]
pub struct MessageActivity {
    pub sent_at: Option<Timestamp>,
    pub opened_at: Option<Timestamp>,
    pub clicked_at: Option<Timestamp>,
    pub replied_at: Option<Timestamp>,
}

/// Counts for a single UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyMetrics {
    pub date: NaiveDate,
    pub sent: u32,
    pub opened: u32,
    pub clicked: u32,
    pub replied: u32,
}

impl DailyMetrics {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            sent: 0,
            opened: 0,
            clicked: 0,
            replied: 0,
        }
    }
}

/// Bucket `messages` into `days` consecutive dates ending at `today`.
///
/// Buckets are ordered oldest first. Each message lands in the bucket of its
/// send date, and its open/click/reply flags count there too, whenever they
/// happened. Unsent messages and sends outside the window are skipped.
pub fn daily_histogram(messages: &[MessageActivity], today: NaiveDate, days: u32) -> Vec<DailyMetrics> {
    if days == 0 {
        return Vec::new();
    }
    let first = today - Duration::days(i64::from(days) - 1);
    let mut buckets: Vec<DailyMetrics> = (0..days)
        .map(|i| DailyMetrics::empty(first + Duration::days(i64::from(i))))
        .collect();

    for message in messages {
        let Some(sent_at) = message.sent_at else {
            continue;
        };
        let offset = (sent_at.date_naive() - first).num_days();
        if offset < 0 || offset >= i64::from(days) {
            continue;
        }
        let bucket = &mut buckets[offset as usize];
        bucket.sent += 1;
        if message.opened_at.is_some() {
            bucket.opened += 1;
        }
        if message.clicked_at.is_some() {
            bucket.clicked += 1;
        }
        if message.replied_at.is_some() {
            bucket.replied += 1;
        }
    }

    buckets
}
