//! Activity timeline: fold a flat list of session records into a fixed
//! window of calendar-day buckets.
//!
//! Pure functions, recomputed on every input change. The calendar sequence
//! is built first, independent of the data, so the output always has exactly
//! one bucket per day in the window even when a day saw no practice.

use std::collections::HashMap;

use chrono::{Duration, Local, NaiveDate};
use serde::Serialize;

use crate::types::SessionRecord;

/// Default timeline window shown on the child overview.
pub const DEFAULT_WINDOW_DAYS: usize = 30;

/// One calendar day of activity. Derived, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct DayBucket {
    /// Calendar day, `YYYY-MM-DD`.
    pub date: String,
    pub sessions: Vec<SessionRecord>,
    /// Mean of the day's non-null scores, rounded to nearest integer.
    /// `None` when no session that day carried a score.
    pub avg_score: Option<i32>,
    /// Topic of the first session encountered that day, in input order.
    pub top_topic: Option<String>,
}

/// Roll-up across a whole window of buckets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowSummary {
    pub active_days: usize,
    pub total_sessions: usize,
    pub avg_score: Option<i32>,
}

/// Bucket `sessions` into the last `window_days` calendar days ending today
/// (local time). Oldest bucket first; the last bucket is always today.
pub fn day_buckets(sessions: &[SessionRecord], window_days: usize) -> Vec<DayBucket> {
    day_buckets_anchored(sessions, window_days, Local::now().date_naive())
}

/// Same as [`day_buckets`] with an explicit anchor day, so the window is
/// deterministic under test.
pub fn day_buckets_anchored(
    sessions: &[SessionRecord],
    window_days: usize,
    today: NaiveDate,
) -> Vec<DayBucket> {
    // Calendar sequence first, independent of the data.
    let mut buckets: Vec<DayBucket> = (0..window_days)
        .map(|i| {
            let offset = (window_days - 1 - i) as i64;
            DayBucket {
                date: (today - Duration::days(offset)).format("%Y-%m-%d").to_string(),
                sessions: Vec::new(),
                avg_score: None,
                top_topic: None,
            }
        })
        .collect();

    let index: HashMap<&str, usize> = buckets
        .iter()
        .enumerate()
        .map(|(i, b)| (b.date.as_str(), i))
        .collect();

    // Group by the calendar-day portion of the recorded timestamp. Sessions
    // outside the window are silently excluded.
    let mut grouped: Vec<(usize, SessionRecord)> = Vec::new();
    for session in sessions {
        if let Some(day) = session_day(&session.created_at) {
            if let Some(&i) = index.get(day) {
                grouped.push((i, session.clone()));
            }
        }
    }
    for (i, session) in grouped {
        buckets[i].sessions.push(session);
    }

    for bucket in &mut buckets {
        bucket.top_topic = bucket.sessions.first().map(|s| s.topic_slug.clone());
        bucket.avg_score = mean_score(&bucket.sessions);
    }

    buckets
}

/// Summarize a bucket window: days with any activity, session count, and
/// the mean of all scored sessions across the window.
pub fn window_summary(buckets: &[DayBucket]) -> WindowSummary {
    let all: Vec<SessionRecord> = buckets
        .iter()
        .flat_map(|b| b.sessions.iter().cloned())
        .collect();
    WindowSummary {
        active_days: buckets.iter().filter(|b| !b.sessions.is_empty()).count(),
        total_sessions: all.len(),
        avg_score: mean_score(&all),
    }
}

/// The `YYYY-MM-DD` prefix of an ISO-8601 timestamp, as recorded. Returns
/// `None` for strings too short to carry a date, which excludes the record.
fn session_day(created_at: &str) -> Option<&str> {
    created_at.get(..10)
}

fn mean_score(sessions: &[SessionRecord]) -> Option<i32> {
    let scores: Vec<f64> = sessions.iter().filter_map(|s| s.score_pct).collect();
    if scores.is_empty() {
        return None;
    }
    Some((scores.iter().sum::<f64>() / scores.len() as f64).round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(day: &str, topic: &str, score: Option<f64>) -> SessionRecord {
        SessionRecord {
            topic_slug: topic.to_string(),
            subject: "math".to_string(),
            score_pct: score,
            created_at: format!("{day}T14:30:00"),
        }
    }

    fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()
    }

    #[test]
    fn test_window_has_exactly_n_buckets_ending_today() {
        let buckets = day_buckets_anchored(&[], 30, anchor());
        assert_eq!(buckets.len(), 30);
        assert_eq!(buckets.first().unwrap().date, "2025-03-02");
        assert_eq!(buckets.last().unwrap().date, "2025-03-31");
        // Chronological, no gaps.
        for pair in buckets.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
    }

    #[test]
    fn test_empty_input_gives_empty_buckets_with_null_scores() {
        let buckets = day_buckets_anchored(&[], 7, anchor());
        assert!(buckets
            .iter()
            .all(|b| b.sessions.is_empty() && b.avg_score.is_none() && b.top_topic.is_none()));
    }

    #[test]
    fn test_sessions_outside_window_are_excluded() {
        let sessions = vec![
            session("2025-03-01", "fractions", Some(50.0)), // day before window start
            session("2025-04-01", "fractions", Some(50.0)), // day after anchor
            session("2025-03-31", "decimals", Some(90.0)),
        ];
        let buckets = day_buckets_anchored(&sessions, 30, anchor());
        let total: usize = buckets.iter().map(|b| b.sessions.len()).sum();
        assert_eq!(total, 1);
        assert_eq!(buckets.last().unwrap().sessions[0].topic_slug, "decimals");
    }

    #[test]
    fn test_avg_ignores_null_scores_and_rounds() {
        // 3 sessions on one day, scores 80 / null / 60 — bucket avg is 70.
        let sessions = vec![
            session("2025-03-30", "fractions", Some(80.0)),
            session("2025-03-30", "decimals", None),
            session("2025-03-30", "fractions", Some(60.0)),
        ];
        let buckets = day_buckets_anchored(&sessions, 30, anchor());
        let day = &buckets[buckets.len() - 2];
        assert_eq!(day.sessions.len(), 3);
        assert_eq!(day.avg_score, Some(70));
    }

    #[test]
    fn test_avg_is_null_iff_no_scored_session() {
        let sessions = vec![
            session("2025-03-29", "fractions", None),
            session("2025-03-29", "decimals", None),
        ];
        let buckets = day_buckets_anchored(&sessions, 30, anchor());
        let day = &buckets[buckets.len() - 3];
        assert_eq!(day.sessions.len(), 2);
        assert_eq!(day.avg_score, None);
    }

    #[test]
    fn test_top_topic_is_first_in_input_order() {
        let sessions = vec![
            session("2025-03-31", "decimals", Some(40.0)),
            session("2025-03-31", "fractions", Some(95.0)),
        ];
        let buckets = day_buckets_anchored(&sessions, 30, anchor());
        assert_eq!(
            buckets.last().unwrap().top_topic.as_deref(),
            Some("decimals")
        );
    }

    #[test]
    fn test_malformed_timestamp_is_excluded_not_fatal() {
        let mut bad = session("2025-03-31", "fractions", Some(80.0));
        bad.created_at = "oops".to_string();
        let buckets = day_buckets_anchored(&[bad], 30, anchor());
        assert!(buckets.iter().all(|b| b.sessions.is_empty()));
    }

    #[test]
    fn test_window_summary_rolls_up_across_days() {
        let sessions = vec![
            session("2025-03-30", "fractions", Some(80.0)),
            session("2025-03-31", "decimals", Some(60.0)),
            session("2025-03-31", "decimals", None),
        ];
        let buckets = day_buckets_anchored(&sessions, 30, anchor());
        let summary = window_summary(&buckets);
        assert_eq!(summary.active_days, 2);
        assert_eq!(summary.total_sessions, 3);
        assert_eq!(summary.avg_score, Some(70));
    }
}
