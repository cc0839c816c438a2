use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    #[serde(default)]
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoutineExercise {
    pub exercise_id: u64,
    pub exercise_name: String,
    #[serde(default)]
    pub order: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub user_id: u64,
    #[serde(default)]
    pub exercises: Vec<RoutineExercise>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub posture: Option<String>,
    #[serde(default)]
    pub body_part: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

/// A log record as the backend stores it. Also used as the create payload,
/// in which case `id` and the timestamps are left empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseLog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDateTime>,
    pub user_id: u64,
    pub exercise_date: NaiveDate,
    #[serde(default)]
    pub completion_rate: f64,
    #[serde(default)]
    pub memo: String,
    #[serde(default)]
    pub routine_ids: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routine_names: Option<Vec<String>>,
}

/// Partial update sent with `PATCH /logs/{id}`.
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_rate: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routine_ids: Option<Vec<u64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionExercise {
    pub exercise_id: u64,
    pub exercise_name: String,
    pub is_completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRoutine {
    pub routine_id: u64,
    pub routine_name: String,
    pub completion_rate: f64,
    pub exercises: Vec<SessionExercise>,
    pub log_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MemoDraft {
    pub text: String,
    pub saved: String,
}

impl MemoDraft {
    pub fn is_dirty(&self) -> bool {
        self.text != self.saved
    }
}

/// Everything the client keeps between runs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LocalData {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub last_user_id: Option<u64>,
    #[serde(default)]
    pub sessions: BTreeMap<NaiveDate, Vec<SessionRoutine>>,
    #[serde(default)]
    pub memos: BTreeMap<NaiveDate, MemoDraft>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRequest {
    pub routine_id: u64,
    pub exercise_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRoutinesRequest {
    pub routine_ids: Vec<u64>,
}

#[derive(Debug, Deserialize)]
pub struct MemoRequest {
    pub memo: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineView {
    pub routine_id: u64,
    pub routine_name: String,
    pub completion_percent: u8,
    pub exercises: Vec<SessionExercise>,
    pub log_id: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayResponse {
    pub date: NaiveDate,
    pub routines: Vec<RoutineView>,
    pub memo: String,
    pub memo_dirty: bool,
    pub fully_completed: bool,
    pub can_delete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveRoutineResponse {
    pub routine_id: u64,
    pub removed_on_server: bool,
    pub day: DayResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub completion_rate: Option<f64>,
    pub routine_count: usize,
    pub has_memo: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPoint {
    pub week: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days_logged: u8,
    pub days_completed: u8,
    pub avg_completion: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub last_7_days: Vec<DailyPoint>,
    pub weekly: Vec<WeeklyPoint>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoResponse {
    pub date: NaiveDate,
    pub memo: String,
    pub dirty: bool,
}
