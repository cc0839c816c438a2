use crate::models::{DailyPoint, ExerciseLog, HistoryResponse, WeeklyPoint};
use crate::reconcile::{latest_logs_by_date, stored_percent};
use chrono::{Datelike, Duration, Local, NaiveDate};

pub fn build_history(logs: &[ExerciseLog], user_id: u64) -> HistoryResponse {
    build_history_at(Local::now().date_naive(), logs, user_id)
}

/// Last seven days and eight ISO weeks of workout history, one record per day.
pub fn build_history_at(today: NaiveDate, logs: &[ExerciseLog], user_id: u64) -> HistoryResponse {
    const WEEK_COUNT: usize = 8;

    let latest = latest_logs_by_date(logs, user_id);

    let mut last_7_days = Vec::with_capacity(7);
    for offset in (0..7).rev() {
        let date = today - Duration::days(offset as i64);
        let log = latest.get(&date);
        last_7_days.push(DailyPoint {
            date,
            completion_rate: log.map(|log| log.completion_rate),
            routine_count: log.map(|log| log.routine_ids.len()).unwrap_or_default(),
            has_memo: log.is_some_and(|log| !log.memo.trim().is_empty()),
        });
    }

    let current_week_start = week_start(today);
    let mut weekly = Vec::with_capacity(WEEK_COUNT);

    for offset in (0..WEEK_COUNT).rev() {
        let start = current_week_start - Duration::weeks(offset as i64);
        let end = start + Duration::days(6);

        let mut days_logged = 0u8;
        let mut days_completed = 0u8;
        let mut rate_sum = 0.0;
        for day_offset in 0..7 {
            let date = start + Duration::days(day_offset);
            if let Some(log) = latest.get(&date) {
                days_logged += 1;
                rate_sum += log.completion_rate;
                if stored_percent(log.completion_rate) == 100 {
                    days_completed += 1;
                }
            }
        }

        let denom = if days_logged == 0 { 1.0 } else { f64::from(days_logged) };

        weekly.push(WeeklyPoint {
            week: week_label(start),
            start_date: start,
            end_date: end,
            days_logged,
            days_completed,
            avg_completion: rate_sum / denom,
        });
    }

    HistoryResponse { last_7_days, weekly }
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

fn week_label(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}
