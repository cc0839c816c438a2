use crate::errors::AppError;
use crate::models::{
    AddRoutinesRequest, ConfirmQuery, DayResponse, Exercise, ExerciseLog, HistoryResponse,
    LocalData, LogPatch, LoginRequest, MemoRequest, MemoResponse, RemoveRoutineResponse, Routine,
    ToggleRequest, User,
};
use crate::reconcile::{MemoTarget, OwnedRoutines, latest_log_for, stored_percent};
use crate::state::AppState;
use crate::stats::build_history;
use crate::storage::persist_data;
use crate::ui::{render_day, render_login};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{Local, NaiveDate};
use tracing::{error, info, warn};

fn active_user(data: &LocalData) -> Result<(u64, String), AppError> {
    match (&data.user, &data.token) {
        (Some(user), Some(token)) => Ok((user.id, token.clone())),
        _ => Err(AppError::unauthorized("login required")),
    }
}

/// Writes local data back and drops the token when the backend rejected it.
async fn settle<T>(
    state: &AppState,
    data: &mut LocalData,
    result: Result<T, AppError>,
) -> Result<T, AppError> {
    if let Err(err) = &result {
        if err.is_unauthorized() && data.token.is_some() {
            warn!("backend rejected the token, logging out");
            data.evict_token();
        }
    }
    persist_data(&state.data_path, data).await?;
    result
}

async fn fetch_owned(state: &AppState, token: &str, user_id: u64) -> Result<OwnedRoutines, AppError> {
    let fetched = state.api.routines_by_user(Some(token), user_id).await?;
    Ok(OwnedRoutines::filter(user_id, fetched))
}

fn new_log(user_id: u64, date: NaiveDate, completion_rate: u8, memo: String, routine_ids: Vec<u64>) -> ExerciseLog {
    ExerciseLog {
        id: None,
        created_at: None,
        updated_at: None,
        user_id,
        exercise_date: date,
        completion_rate: f64::from(completion_rate),
        memo,
        routine_ids,
        routine_names: None,
    }
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<User>, AppError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("email and password are required"));
    }

    let mut data = state.data.lock().await;
    let token = state.api.login(&payload).await?;
    let user = state.api.me(Some(&token)).await?;

    data.observe_user(user.id);
    data.token = Some(token);
    data.user = Some(user.clone());
    persist_data(&state.data_path, &data).await?;

    info!(user_id = user.id, "logged in");
    Ok(Json(user))
}

pub async fn logout(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    let mut data = state.data.lock().await;
    let user_id = data.user.as_ref().map(|user| user.id);
    data.logout();
    persist_data(&state.data_path, &data).await?;
    info!(?user_id, "logged out");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(State(state): State<AppState>) -> Result<Json<User>, AppError> {
    let data = state.data.lock().await;
    data.user
        .clone()
        .map(Json)
        .ok_or_else(|| AppError::unauthorized("login required"))
}

async fn owned_routines(state: &AppState, data: &LocalData) -> Result<Vec<Routine>, AppError> {
    let (user_id, token) = active_user(data)?;
    Ok(fetch_owned(state, &token, user_id).await?.routines)
}

pub async fn get_routines(State(state): State<AppState>) -> Result<Json<Vec<Routine>>, AppError> {
    let mut data = state.data.lock().await;
    let result = owned_routines(&state, &data).await;
    settle(&state, &mut data, result).await.map(Json)
}

async fn exercise_catalog(state: &AppState, data: &LocalData) -> Result<Vec<Exercise>, AppError> {
    let (_, token) = active_user(data)?;
    Ok(state.api.exercises(Some(&token)).await?)
}

pub async fn get_exercises(State(state): State<AppState>) -> Result<Json<Vec<Exercise>>, AppError> {
    let mut data = state.data.lock().await;
    let result = exercise_catalog(&state, &data).await;
    settle(&state, &mut data, result).await.map(Json)
}

async fn history(state: &AppState, data: &LocalData) -> Result<HistoryResponse, AppError> {
    let (user_id, token) = active_user(data)?;
    let logs = state.api.logs_by_user(Some(&token), user_id).await?;
    Ok(build_history(&logs, user_id))
}

pub async fn get_history(State(state): State<AppState>) -> Result<Json<HistoryResponse>, AppError> {
    let mut data = state.data.lock().await;
    let result = history(&state, &data).await;
    settle(&state, &mut data, result).await.map(Json)
}

async fn load_day(state: &AppState, data: &mut LocalData, date: NaiveDate) -> Result<DayResponse, AppError> {
    let (user_id, token) = active_user(data)?;
    let owned = fetch_owned(state, &token, user_id).await?;
    let past = state.api.logs_by_user(Some(&token), user_id).await?;

    let restore = data.restore_session(date, &owned, &past);
    if let Some(log) = latest_log_for(&past, user_id, date) {
        data.seed_memo(date, &log.memo);
    }
    info!(user_id, %date, outcome = %restore, "loaded day");
    Ok(data.day_view(date, &owned, &past, Some(&restore)))
}

pub async fn get_day(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<DayResponse>, AppError> {
    let mut data = state.data.lock().await;
    let result = load_day(&state, &mut data, date).await;
    settle(&state, &mut data, result).await.map(Json)
}

async fn toggle_exercise(
    state: &AppState,
    data: &mut LocalData,
    date: NaiveDate,
    req: ToggleRequest,
) -> Result<DayResponse, AppError> {
    let (user_id, token) = active_user(data)?;
    let owned = fetch_owned(state, &token, user_id).await?;
    let routine = data.toggle_exercise(date, &owned, req.routine_id, req.exercise_id)?;
    let rate = match routine.log_id {
        Some(log_id) => data.rate_for_log(date, &owned, log_id),
        None => stored_percent(routine.completion_rate),
    };

    let persisted = match routine.log_id {
        Some(log_id) => {
            let patch = LogPatch {
                completion_rate: Some(rate),
                ..LogPatch::default()
            };
            state.api.patch_log(Some(&token), log_id, &patch).await
        }
        None => {
            let log = new_log(user_id, date, rate, data.memo(date).saved, vec![routine.routine_id]);
            state
                .api
                .create_log(Some(&token), &log)
                .await
                .map(|log_id| data.set_log_id(date, &[routine.routine_id], log_id))
        }
    };

    if let Err(err) = persisted {
        error!(routine_id = req.routine_id, exercise_id = req.exercise_id, "saving completion failed: {err}");
        data.toggle_exercise(date, &owned, req.routine_id, req.exercise_id)?;
        return Err(err.into());
    }

    info!(user_id, %date, routine_id = routine.routine_id, rate, "exercise toggled");
    let past = state.api.logs_by_date(Some(&token), user_id, date).await?;
    Ok(data.day_view(date, &owned, &past, None))
}

pub async fn toggle(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
    Json(payload): Json<ToggleRequest>,
) -> Result<Json<DayResponse>, AppError> {
    let mut data = state.data.lock().await;
    let result = toggle_exercise(&state, &mut data, date, payload).await;
    settle(&state, &mut data, result).await.map(Json)
}

async fn add_routines(
    state: &AppState,
    data: &mut LocalData,
    date: NaiveDate,
    req: AddRoutinesRequest,
) -> Result<DayResponse, AppError> {
    if req.routine_ids.is_empty() {
        return Err(AppError::bad_request("select at least one routine"));
    }
    let (user_id, token) = active_user(data)?;

    let mut candidates = Vec::with_capacity(req.routine_ids.len());
    for routine_id in &req.routine_ids {
        candidates.push(state.api.routine(Some(&token), *routine_id).await?);
    }
    let added = data.add_routines(user_id, date, &candidates)?;
    info!(user_id, %date, ?added, "routines added");

    let owned = fetch_owned(state, &token, user_id).await?;
    let past = state.api.logs_by_date(Some(&token), user_id, date).await?;
    Ok(data.day_view(date, &owned, &past, None))
}

pub async fn post_routines(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
    Json(payload): Json<AddRoutinesRequest>,
) -> Result<Json<DayResponse>, AppError> {
    let mut data = state.data.lock().await;
    let result = add_routines(&state, &mut data, date, payload).await;
    settle(&state, &mut data, result).await.map(Json)
}

async fn remove_routine(
    state: &AppState,
    data: &mut LocalData,
    date: NaiveDate,
    routine_id: u64,
    confirm: bool,
) -> Result<RemoveRoutineResponse, AppError> {
    let (user_id, token) = active_user(data)?;
    let owned = fetch_owned(state, &token, user_id).await?;
    let plan = data.plan_routine_removal(date, &owned, routine_id, confirm)?;

    if let Some(log_id) = plan.log_id {
        if plan.remaining_on_log.is_empty() {
            state.api.delete_log(Some(&token), log_id).await?;
        } else {
            let patch = LogPatch {
                completion_rate: Some(plan.remaining_rate),
                routine_ids: Some(plan.remaining_on_log.clone()),
                ..LogPatch::default()
            };
            state.api.patch_log(Some(&token), log_id, &patch).await?;
        }
    }
    data.remove_routine(date, routine_id);
    info!(user_id, %date, routine_id, log_id = ?plan.log_id, "routine removed");

    let past = state.api.logs_by_date(Some(&token), user_id, date).await?;
    Ok(RemoveRoutineResponse {
        routine_id,
        removed_on_server: plan.log_id.is_some(),
        day: data.day_view(date, &owned, &past, None),
    })
}

pub async fn delete_routine(
    State(state): State<AppState>,
    Path((date, routine_id)): Path<(NaiveDate, u64)>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<RemoveRoutineResponse>, AppError> {
    let mut data = state.data.lock().await;
    let result = remove_routine(&state, &mut data, date, routine_id, query.confirm).await;
    settle(&state, &mut data, result).await.map(Json)
}

pub async fn put_memo(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
    Json(payload): Json<MemoRequest>,
) -> Result<Json<MemoResponse>, AppError> {
    let mut data = state.data.lock().await;
    active_user(&data)?;
    data.edit_memo(date, payload.memo);
    persist_data(&state.data_path, &data).await?;

    let draft = data.memo(date);
    Ok(Json(MemoResponse {
        date,
        dirty: draft.is_dirty(),
        memo: draft.text,
    }))
}

async fn save_memo(state: &AppState, data: &mut LocalData, date: NaiveDate) -> Result<DayResponse, AppError> {
    let (user_id, token) = active_user(data)?;
    let owned = fetch_owned(state, &token, user_id).await?;
    let past = state.api.logs_by_date(Some(&token), user_id, date).await?;
    let memo = data.memo(date).text;

    match data.memo_target(date, &owned, &past) {
        MemoTarget::Log(log_id) => {
            let patch = LogPatch {
                memo: Some(memo),
                ..LogPatch::default()
            };
            state.api.patch_log(Some(&token), log_id, &patch).await?;
        }
        MemoTarget::Create {
            routine_ids,
            completion_rate,
        } => {
            if memo.trim().is_empty() && routine_ids.is_empty() {
                return Err(AppError::bad_request("nothing to save for this day"));
            }
            let log = new_log(user_id, date, completion_rate, memo, routine_ids.clone());
            let log_id = state.api.create_log(Some(&token), &log).await?;
            data.set_log_id(date, &routine_ids, log_id);
        }
    }
    data.mark_memo_saved(date);
    info!(user_id, %date, "memo saved");

    let past = state.api.logs_by_date(Some(&token), user_id, date).await?;
    Ok(data.day_view(date, &owned, &past, None))
}

pub async fn post_memo(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<DayResponse>, AppError> {
    let mut data = state.data.lock().await;
    let result = save_memo(&state, &mut data, date).await;
    settle(&state, &mut data, result).await.map(Json)
}

async fn delete_day_logs(
    state: &AppState,
    data: &mut LocalData,
    date: NaiveDate,
    confirm: bool,
) -> Result<DayResponse, AppError> {
    let (user_id, token) = active_user(data)?;
    let owned = fetch_owned(state, &token, user_id).await?;
    let past = state.api.logs_by_date(Some(&token), user_id, date).await?;
    let log_ids = data.plan_day_deletion(date, &owned, &past, confirm)?;

    for log_id in &log_ids {
        match state.api.delete_log(Some(&token), *log_id).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() => warn!(log_id = *log_id, "log already deleted on the backend"),
            Err(err) => return Err(err.into()),
        }
        data.forget_log(date, *log_id);
    }
    data.clear_day(date);
    info!(user_id, %date, deleted = log_ids.len(), "day deleted");

    Ok(data.day_view(date, &owned, &[], None))
}

pub async fn delete_day(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<DayResponse>, AppError> {
    let mut data = state.data.lock().await;
    let result = delete_day_logs(&state, &mut data, date, query.confirm).await;
    settle(&state, &mut data, result).await.map(Json)
}

async fn day_page(state: AppState, date: NaiveDate) -> Response {
    let mut data = state.data.lock().await;
    let result = load_day(&state, &mut data, date).await;
    match settle(&state, &mut data, result).await {
        Ok(day) => Html(render_day(&day)).into_response(),
        Err(err) if err.is_unauthorized() => Redirect::to("/login").into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn index(State(state): State<AppState>) -> Response {
    day_page(state, today()).await
}

pub async fn log_page(State(state): State<AppState>, Path(date): Path<NaiveDate>) -> Response {
    day_page(state, date).await
}

pub async fn login_page() -> Html<String> {
    Html(render_login())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
