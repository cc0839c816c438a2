//! Merges the local date-keyed session cache with the backend's log history.
//!
//! Everything here is synchronous bookkeeping over [`LocalData`]. Callers
//! fetch routines and logs, hand them in, and perform whatever backend call
//! an operation plans before applying it locally.

use crate::models::{
    DayResponse, ExerciseLog, LocalData, MemoDraft, Routine, RoutineView, SessionExercise,
    SessionRoutine,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error, PartialEq)]
pub enum LogError {
    #[error("routine {routine_id} does not belong to user {user_id}")]
    NotOwner { routine_id: u64, user_id: u64 },
    #[error("routine {0} is not part of this day's workout")]
    NotInSession(u64),
    #[error("exercise {exercise_id} is not part of routine {routine_id}")]
    UnknownExercise { routine_id: u64, exercise_id: u64 },
    #[error("{0}")]
    ConfirmationRequired(&'static str),
    #[error("no workout records to delete")]
    NothingToDelete,
}

const CONFIRM_DELETE_LOGGED_ROUTINE: &str =
    "This routine's workout record will be permanently deleted. Continue?";
const CONFIRM_DELETE_LOCAL_ROUTINE: &str = "Remove this routine from today's workout?";
const CONFIRM_DELETE_DAY: &str = "Delete every workout record for this day?";

/// `100 * completed / total`, or 0 for a routine with no exercises.
pub fn completion_rate(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    completed as f64 * 100.0 / total as f64
}

pub fn display_percent(rate: f64) -> u8 {
    rate.round().clamp(0.0, 100.0) as u8
}

/// The value sent to and compared against the backend.
pub fn stored_percent(rate: f64) -> u8 {
    rate.trunc().clamp(0.0, 100.0) as u8
}

fn created_key(log: &ExerciseLog) -> NaiveDateTime {
    log.created_at
        .unwrap_or_else(|| log.exercise_date.and_time(NaiveTime::MIN))
}

/// Latest record per date for one user. Records without `createdAt` count as
/// midnight of their date; on a tie the first record seen wins.
pub fn latest_logs_by_date(logs: &[ExerciseLog], user_id: u64) -> BTreeMap<NaiveDate, &ExerciseLog> {
    let mut latest: BTreeMap<NaiveDate, &ExerciseLog> = BTreeMap::new();
    for log in logs.iter().filter(|log| log.user_id == user_id) {
        let newer = latest
            .get(&log.exercise_date)
            .is_none_or(|existing| created_key(log) > created_key(existing));
        if newer {
            latest.insert(log.exercise_date, log);
        }
    }
    latest
}

pub fn latest_log_for(logs: &[ExerciseLog], user_id: u64, date: NaiveDate) -> Option<&ExerciseLog> {
    latest_logs_by_date(logs, user_id).remove(&date)
}

/// True when the user has at least one log on `date` and all of them are at 100%.
pub fn is_fully_completed(logs: &[ExerciseLog], user_id: u64, date: NaiveDate) -> bool {
    let mut day = logs
        .iter()
        .filter(|log| log.user_id == user_id && log.exercise_date == date)
        .peekable();
    day.peek().is_some() && day.all(|log| stored_percent(log.completion_rate) == 100)
}

/// The routines fetched for a user, with anything owned by someone else removed.
#[derive(Debug, Clone)]
pub struct OwnedRoutines {
    pub user_id: u64,
    pub routines: Vec<Routine>,
    pub rejected: usize,
}

impl OwnedRoutines {
    pub fn filter(user_id: u64, fetched: Vec<Routine>) -> Self {
        let total = fetched.len();
        let routines: Vec<Routine> = fetched
            .into_iter()
            .filter(|routine| {
                let owned = routine.user_id == user_id;
                if !owned {
                    warn!(
                        routine_id = routine.id,
                        routine_user_id = routine.user_id,
                        user_id,
                        "dropping routine owned by another user"
                    );
                }
                owned
            })
            .collect();
        let rejected = total - routines.len();
        Self {
            user_id,
            routines,
            rejected,
        }
    }

    pub fn get(&self, routine_id: u64) -> Option<&Routine> {
        self.routines.iter().find(|routine| routine.id == routine_id)
    }

    pub fn verify(&self, routine_id: u64) -> Result<&Routine, LogError> {
        self.get(routine_id)
            .filter(|routine| routine.user_id == self.user_id)
            .ok_or(LogError::NotOwner {
                routine_id,
                user_id: self.user_id,
            })
    }

    fn owns(&self, routine_id: u64) -> bool {
        self.verify(routine_id).is_ok()
    }
}

pub fn session_from_routine(routine: &Routine, log_id: Option<u64>) -> SessionRoutine {
    let mut ordered = routine.exercises.clone();
    ordered.sort_by_key(|exercise| exercise.order);
    SessionRoutine {
        routine_id: routine.id,
        routine_name: routine.name.clone(),
        completion_rate: 0.0,
        exercises: ordered
            .into_iter()
            .map(|exercise| SessionExercise {
                exercise_id: exercise.exercise_id,
                exercise_name: exercise.exercise_name,
                is_completed: false,
            })
            .collect(),
        log_id,
    }
}

fn recompute(routine: &mut SessionRoutine) {
    let done = routine.exercises.iter().filter(|e| e.is_completed).count();
    routine.completion_rate = completion_rate(done, routine.exercises.len());
}

fn average_stored(routines: &[&SessionRoutine]) -> u8 {
    if routines.is_empty() {
        return 0;
    }
    let sum: f64 = routines.iter().map(|r| r.completion_rate).sum();
    stored_percent(sum / routines.len() as f64)
}

/// Outcome of trying to rebuild a day's session from history.
#[derive(Debug, Clone, PartialEq)]
pub enum Restore {
    Existing(usize),
    Restored(Vec<String>),
    NoPastLog,
    NoOwnedRoutines,
    OwnershipMismatch,
}

impl fmt::Display for Restore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Restore::Existing(count) => write!(f, "session already holds {count} routine(s)"),
            Restore::Restored(names) => write!(f, "restored: {}", names.join(", ")),
            Restore::NoPastLog => f.write_str("no past log to restore"),
            Restore::NoOwnedRoutines => f.write_str("no routines left to restore"),
            Restore::OwnershipMismatch => {
                f.write_str("restore skipped: routine list contained another user's routine")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutineRemoval {
    pub routine_id: u64,
    pub log_id: Option<u64>,
    /// Other session routines recorded on the same log.
    pub remaining_on_log: Vec<u64>,
    pub remaining_rate: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemoTarget {
    Log(u64),
    Create {
        routine_ids: Vec<u64>,
        completion_rate: u8,
    },
}

impl LocalData {
    /// Records the active user. Returns true when a different user was seen
    /// before, in which case the session cache has been dropped.
    pub fn observe_user(&mut self, user_id: u64) -> bool {
        let changed = matches!(self.last_user_id, Some(previous) if previous != user_id);
        if changed {
            info!(
                previous = ?self.last_user_id,
                user_id, "user changed, clearing session cache"
            );
            self.sessions.clear();
            self.memos.clear();
        }
        self.last_user_id = Some(user_id);
        changed
    }

    pub fn logout(&mut self) {
        self.token = None;
        self.user = None;
        self.last_user_id = None;
        self.sessions.clear();
        self.memos.clear();
    }

    /// Drops credentials after the backend rejected them. The cache stays so
    /// the same user can pick up where they left off.
    pub fn evict_token(&mut self) {
        self.token = None;
        self.user = None;
    }

    /// The date's session entries that belong to the owner of `owned`.
    pub fn session_routines(&self, date: NaiveDate, owned: &OwnedRoutines) -> Vec<&SessionRoutine> {
        self.sessions
            .get(&date)
            .map(|routines| {
                routines
                    .iter()
                    .filter(|routine| {
                        let keep = owned.owns(routine.routine_id);
                        if !keep {
                            warn!(
                                routine_id = routine.routine_id,
                                user_id = owned.user_id,
                                "hiding session routine of another user"
                            );
                        }
                        keep
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn restore_session(
        &mut self,
        date: NaiveDate,
        owned: &OwnedRoutines,
        past: &[ExerciseLog],
    ) -> Restore {
        let existing = self.session_routines(date, owned).len();
        if existing > 0 {
            return Restore::Existing(existing);
        }

        let Some(log) = latest_log_for(past, owned.user_id, date) else {
            return Restore::NoPastLog;
        };
        if log.routine_ids.is_empty() {
            return Restore::NoPastLog;
        }
        if owned.rejected > 0 {
            warn!(user_id = owned.user_id, %date, "routine list failed ownership check, not restoring");
            return Restore::OwnershipMismatch;
        }

        let fully_done = stored_percent(log.completion_rate) == 100;
        let restored: Vec<SessionRoutine> = owned
            .routines
            .iter()
            .filter(|routine| log.routine_ids.contains(&routine.id))
            .map(|routine| {
                let mut session = session_from_routine(routine, log.id);
                if fully_done {
                    session.exercises.iter_mut().for_each(|e| e.is_completed = true);
                    recompute(&mut session);
                }
                session
            })
            .collect();

        if restored.is_empty() {
            info!(%date, routine_ids = ?log.routine_ids, "past log has no routines left to restore");
            return Restore::NoOwnedRoutines;
        }

        let names: Vec<String> = restored.iter().map(|r| r.routine_name.clone()).collect();
        info!(%date, routines = ?names, "restored session from past log");
        self.sessions.insert(date, restored);
        Restore::Restored(names)
    }

    /// Flips one exercise and returns the routine as it now stands.
    pub fn toggle_exercise(
        &mut self,
        date: NaiveDate,
        owned: &OwnedRoutines,
        routine_id: u64,
        exercise_id: u64,
    ) -> Result<SessionRoutine, LogError> {
        owned.verify(routine_id)?;
        let routine = self
            .sessions
            .get_mut(&date)
            .and_then(|routines| routines.iter_mut().find(|r| r.routine_id == routine_id))
            .ok_or(LogError::NotInSession(routine_id))?;
        let exercise = routine
            .exercises
            .iter_mut()
            .find(|e| e.exercise_id == exercise_id)
            .ok_or(LogError::UnknownExercise {
                routine_id,
                exercise_id,
            })?;
        exercise.is_completed = !exercise.is_completed;
        recompute(routine);
        Ok(routine.clone())
    }

    pub fn set_log_id(&mut self, date: NaiveDate, routine_ids: &[u64], log_id: u64) {
        if let Some(routines) = self.sessions.get_mut(&date) {
            routines
                .iter_mut()
                .filter(|r| routine_ids.contains(&r.routine_id))
                .for_each(|r| r.log_id = Some(log_id));
        }
    }

    /// Detaches a log that no longer exists on the backend.
    pub fn forget_log(&mut self, date: NaiveDate, log_id: u64) {
        if let Some(routines) = self.sessions.get_mut(&date) {
            routines
                .iter_mut()
                .filter(|r| r.log_id == Some(log_id))
                .for_each(|r| r.log_id = None);
        }
    }

    /// Stored completion for a log shared by several session routines: the
    /// average over every routine recorded on it.
    pub fn rate_for_log(&self, date: NaiveDate, owned: &OwnedRoutines, log_id: u64) -> u8 {
        let sharing: Vec<&SessionRoutine> = self
            .session_routines(date, owned)
            .into_iter()
            .filter(|r| r.log_id == Some(log_id))
            .collect();
        average_stored(&sharing)
    }

    /// Appends routines to the day. Rejects the whole batch if any routine
    /// belongs to someone else; routines already present are skipped.
    pub fn add_routines(
        &mut self,
        user_id: u64,
        date: NaiveDate,
        candidates: &[Routine],
    ) -> Result<Vec<u64>, LogError> {
        if let Some(foreign) = candidates.iter().find(|r| r.user_id != user_id) {
            return Err(LogError::NotOwner {
                routine_id: foreign.id,
                user_id,
            });
        }

        let session = self.sessions.entry(date).or_default();
        let mut added = Vec::new();
        for routine in candidates {
            if session.iter().any(|r| r.routine_id == routine.id) {
                continue;
            }
            session.push(session_from_routine(routine, None));
            added.push(routine.id);
        }
        Ok(added)
    }

    pub fn plan_routine_removal(
        &self,
        date: NaiveDate,
        owned: &OwnedRoutines,
        routine_id: u64,
        confirm: bool,
    ) -> Result<RoutineRemoval, LogError> {
        owned.verify(routine_id)?;
        let session = self.session_routines(date, owned);
        let target = session
            .iter()
            .find(|r| r.routine_id == routine_id)
            .ok_or(LogError::NotInSession(routine_id))?;

        if !confirm {
            return Err(LogError::ConfirmationRequired(if target.log_id.is_some() {
                CONFIRM_DELETE_LOGGED_ROUTINE
            } else {
                CONFIRM_DELETE_LOCAL_ROUTINE
            }));
        }

        let sharing: Vec<&SessionRoutine> = match target.log_id {
            Some(log_id) => session
                .iter()
                .copied()
                .filter(|r| r.routine_id != routine_id && r.log_id == Some(log_id))
                .collect(),
            None => Vec::new(),
        };

        Ok(RoutineRemoval {
            routine_id,
            log_id: target.log_id,
            remaining_on_log: sharing.iter().map(|r| r.routine_id).collect(),
            remaining_rate: average_stored(&sharing),
        })
    }

    pub fn remove_routine(&mut self, date: NaiveDate, routine_id: u64) {
        if let Some(routines) = self.sessions.get_mut(&date) {
            routines.retain(|r| r.routine_id != routine_id);
            if routines.is_empty() {
                self.sessions.remove(&date);
            }
        }
    }

    pub fn memo(&self, date: NaiveDate) -> MemoDraft {
        self.memos.get(&date).cloned().unwrap_or_default()
    }

    /// Loads a saved memo for the date unless a local draft already exists.
    pub fn seed_memo(&mut self, date: NaiveDate, saved: &str) {
        self.memos.entry(date).or_insert_with(|| MemoDraft {
            text: saved.to_string(),
            saved: saved.to_string(),
        });
    }

    pub fn edit_memo(&mut self, date: NaiveDate, text: String) {
        self.memos.entry(date).or_default().text = text;
    }

    pub fn mark_memo_saved(&mut self, date: NaiveDate) {
        if let Some(draft) = self.memos.get_mut(&date) {
            draft.saved = draft.text.clone();
        }
    }

    /// Where a memo for `date` should be written.
    pub fn memo_target(
        &self,
        date: NaiveDate,
        owned: &OwnedRoutines,
        past: &[ExerciseLog],
    ) -> MemoTarget {
        let session = self.session_routines(date, owned);
        if let Some(log_id) = session.iter().find_map(|r| r.log_id) {
            return MemoTarget::Log(log_id);
        }
        if let Some(log_id) = latest_log_for(past, owned.user_id, date).and_then(|log| log.id) {
            return MemoTarget::Log(log_id);
        }
        MemoTarget::Create {
            routine_ids: session.iter().map(|r| r.routine_id).collect(),
            completion_rate: average_stored(&session),
        }
    }

    pub fn has_actual_logs(&self, date: NaiveDate, owned: &OwnedRoutines, past: &[ExerciseLog]) -> bool {
        latest_log_for(past, owned.user_id, date).is_some()
            || self
                .session_routines(date, owned)
                .iter()
                .any(|r| r.log_id.is_some_and(|id| id > 0))
    }

    /// Every persisted log id for the day, past duplicates included.
    pub fn plan_day_deletion(
        &self,
        date: NaiveDate,
        owned: &OwnedRoutines,
        past: &[ExerciseLog],
        confirm: bool,
    ) -> Result<Vec<u64>, LogError> {
        if !self.has_actual_logs(date, owned, past) {
            return Err(LogError::NothingToDelete);
        }
        if !confirm {
            return Err(LogError::ConfirmationRequired(CONFIRM_DELETE_DAY));
        }

        let mut ids: BTreeSet<u64> = past
            .iter()
            .filter(|log| log.user_id == owned.user_id && log.exercise_date == date)
            .filter_map(|log| log.id)
            .collect();
        ids.extend(self.session_routines(date, owned).iter().filter_map(|r| r.log_id));
        Ok(ids.into_iter().filter(|id| *id > 0).collect())
    }

    pub fn clear_day(&mut self, date: NaiveDate) {
        self.sessions.remove(&date);
        self.memos.remove(&date);
    }

    pub fn day_view(
        &self,
        date: NaiveDate,
        owned: &OwnedRoutines,
        past: &[ExerciseLog],
        restore: Option<&Restore>,
    ) -> DayResponse {
        let memo = self.memo(date);
        DayResponse {
            date,
            routines: self
                .session_routines(date, owned)
                .into_iter()
                .map(|r| RoutineView {
                    routine_id: r.routine_id,
                    routine_name: r.routine_name.clone(),
                    completion_percent: display_percent(r.completion_rate),
                    exercises: r.exercises.clone(),
                    log_id: r.log_id,
                })
                .collect(),
            memo_dirty: memo.is_dirty(),
            memo: memo.text,
            fully_completed: is_fully_completed(past, owned.user_id, date),
            can_delete: self.has_actual_logs(date, owned, past),
            restore: restore.map(ToString::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoutineExercise;

    const USER: u64 = 7;
    const OTHER: u64 = 9;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
    }

    fn at(d: u32, hour: u32) -> NaiveDateTime {
        day(d).and_hms_opt(hour, 0, 0).unwrap()
    }

    fn routine(id: u64, user_id: u64, exercise_ids: &[u64]) -> Routine {
        Routine {
            id,
            name: format!("routine {id}"),
            description: None,
            user_id,
            exercises: exercise_ids
                .iter()
                .enumerate()
                .map(|(order, exercise_id)| RoutineExercise {
                    exercise_id: *exercise_id,
                    exercise_name: format!("exercise {exercise_id}"),
                    order: order as u32,
                })
                .collect(),
        }
    }

    fn log(id: u64, user_id: u64, date: NaiveDate, created: Option<NaiveDateTime>, routine_ids: &[u64]) -> ExerciseLog {
        ExerciseLog {
            id: Some(id),
            created_at: created,
            updated_at: None,
            user_id,
            exercise_date: date,
            completion_rate: 0.0,
            memo: String::new(),
            routine_ids: routine_ids.to_vec(),
            routine_names: None,
        }
    }

    fn owned(routines: Vec<Routine>) -> OwnedRoutines {
        OwnedRoutines::filter(USER, routines)
    }

    #[test]
    fn completion_handles_empty_and_rounding() {
        assert_eq!(completion_rate(0, 0), 0.0);
        assert_eq!(completion_rate(3, 3), 100.0);
        let two_thirds = completion_rate(2, 3);
        assert_eq!(display_percent(two_thirds), 67);
        assert_eq!(stored_percent(two_thirds), 66);
        assert_eq!(display_percent(completion_rate(1, 3)), 33);
    }

    #[test]
    fn latest_log_wins_per_date() {
        let logs = vec![
            log(1, USER, day(3), Some(at(3, 9)), &[1]),
            log(2, USER, day(3), Some(at(3, 18)), &[2]),
            log(3, USER, day(3), Some(at(3, 12)), &[3]),
            log(4, OTHER, day(3), Some(at(3, 23)), &[4]),
            log(5, USER, day(4), None, &[5]),
        ];
        let latest = latest_logs_by_date(&logs, USER);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[&day(3)].id, Some(2));
        assert_eq!(latest[&day(4)].id, Some(5));
    }

    #[test]
    fn missing_created_at_counts_as_midnight() {
        let logs = vec![
            log(1, USER, day(3), None, &[1]),
            log(2, USER, day(3), Some(at(3, 0)), &[2]),
            log(3, USER, day(3), Some(at(3, 1)), &[3]),
        ];
        assert_eq!(latest_log_for(&logs, USER, day(3)).and_then(|l| l.id), Some(3));
        let tie = vec![log(1, USER, day(3), None, &[1]), log(2, USER, day(3), Some(at(3, 0)), &[2])];
        assert_eq!(latest_log_for(&tie, USER, day(3)).and_then(|l| l.id), Some(1));
    }

    #[test]
    fn restore_uses_latest_log_only() {
        let routines = owned(vec![routine(1, USER, &[10]), routine(2, USER, &[20, 21])]);
        let logs = vec![
            log(1, USER, day(3), Some(at(3, 8)), &[1]),
            log(2, USER, day(3), Some(at(3, 20)), &[2]),
        ];
        let mut data = LocalData::default();
        let outcome = data.restore_session(day(3), &routines, &logs);
        assert_eq!(outcome, Restore::Restored(vec!["routine 2".to_string()]));
        let session = data.session_routines(day(3), &routines);
        assert_eq!(session.len(), 1);
        assert_eq!(session[0].routine_id, 2);
        assert_eq!(session[0].log_id, Some(2));
        assert!(session[0].exercises.iter().all(|e| !e.is_completed));
    }

    #[test]
    fn restore_of_completed_log_marks_exercises_done() {
        let routines = owned(vec![routine(1, USER, &[10, 11])]);
        let mut done = log(1, USER, day(3), Some(at(3, 8)), &[1]);
        done.completion_rate = 100.0;
        let mut data = LocalData::default();
        data.restore_session(day(3), &routines, &[done]);
        let session = data.session_routines(day(3), &routines);
        assert_eq!(display_percent(session[0].completion_rate), 100);
    }

    #[test]
    fn restore_reports_when_nothing_is_left() {
        let routines = owned(vec![routine(1, USER, &[10])]);
        let logs = vec![log(1, USER, day(3), Some(at(3, 8)), &[99])];
        let mut data = LocalData::default();
        assert_eq!(data.restore_session(day(3), &routines, &logs), Restore::NoOwnedRoutines);
        assert!(data.sessions.is_empty());
        assert_eq!(data.restore_session(day(4), &routines, &logs), Restore::NoPastLog);
    }

    #[test]
    fn restore_aborts_when_fetched_routines_include_foreign_ones() {
        let routines = owned(vec![routine(1, USER, &[10]), routine(2, OTHER, &[20])]);
        assert_eq!(routines.rejected, 1);
        let logs = vec![log(1, USER, day(3), Some(at(3, 8)), &[1])];
        let mut data = LocalData::default();
        assert_eq!(data.restore_session(day(3), &routines, &logs), Restore::OwnershipMismatch);
        assert!(data.sessions.is_empty());
    }

    #[test]
    fn restore_keeps_an_existing_session() {
        let routines = owned(vec![routine(1, USER, &[10]), routine(2, USER, &[20])]);
        let mut data = LocalData::default();
        data.add_routines(USER, day(3), &[routine(1, USER, &[10])]).unwrap();
        let logs = vec![log(1, USER, day(3), Some(at(3, 8)), &[2])];
        assert_eq!(data.restore_session(day(3), &routines, &logs), Restore::Existing(1));
        assert_eq!(data.session_routines(day(3), &routines)[0].routine_id, 1);
    }

    #[test]
    fn toggle_recomputes_completion() {
        let routines = owned(vec![routine(1, USER, &[10, 11, 12])]);
        let mut data = LocalData::default();
        data.add_routines(USER, day(3), &routines.routines).unwrap();

        let after = data.toggle_exercise(day(3), &routines, 1, 11).unwrap();
        assert_eq!(display_percent(after.completion_rate), 33);
        data.toggle_exercise(day(3), &routines, 1, 10).unwrap();
        let after = data.toggle_exercise(day(3), &routines, 1, 12).unwrap();
        assert_eq!(stored_percent(after.completion_rate), 100);
        let after = data.toggle_exercise(day(3), &routines, 1, 12).unwrap();
        assert_eq!(stored_percent(after.completion_rate), 66);

        assert_eq!(
            data.toggle_exercise(day(3), &routines, 1, 99),
            Err(LogError::UnknownExercise { routine_id: 1, exercise_id: 99 })
        );
    }

    #[test]
    fn toggle_on_foreign_routine_changes_nothing() {
        let mut data = LocalData::default();
        data.sessions.insert(day(3), vec![session_from_routine(&routine(5, OTHER, &[50]), None)]);
        let before = data.sessions.clone();
        let routines = owned(vec![routine(1, USER, &[10])]);

        let err = data.toggle_exercise(day(3), &routines, 5, 50).unwrap_err();
        assert_eq!(err, LogError::NotOwner { routine_id: 5, user_id: USER });
        assert_eq!(data.sessions, before);
        assert!(data.session_routines(day(3), &routines).is_empty());
    }

    #[test]
    fn add_routines_is_all_or_nothing() {
        let mut data = LocalData::default();
        let err = data
            .add_routines(USER, day(3), &[routine(1, USER, &[10]), routine(2, OTHER, &[20])])
            .unwrap_err();
        assert_eq!(err, LogError::NotOwner { routine_id: 2, user_id: USER });
        assert!(data.sessions.is_empty());

        let added = data
            .add_routines(USER, day(3), &[routine(1, USER, &[10]), routine(2, USER, &[20])])
            .unwrap();
        assert_eq!(added, vec![1, 2]);
        let again = data.add_routines(USER, day(3), &[routine(2, USER, &[20])]).unwrap();
        assert!(again.is_empty());
        assert_eq!(data.sessions[&day(3)].len(), 2);
    }

    #[test]
    fn routine_removal_needs_confirmation_and_ownership() {
        let routines = owned(vec![routine(1, USER, &[10]), routine(2, USER, &[20])]);
        let mut data = LocalData::default();
        data.add_routines(USER, day(3), &routines.routines).unwrap();
        data.set_log_id(day(3), &[1, 2], 40);

        assert_eq!(
            data.plan_routine_removal(day(3), &routines, 1, false),
            Err(LogError::ConfirmationRequired(CONFIRM_DELETE_LOGGED_ROUTINE))
        );
        let plan = data.plan_routine_removal(day(3), &routines, 1, true).unwrap();
        assert_eq!(plan.log_id, Some(40));
        assert_eq!(plan.remaining_on_log, vec![2]);

        let stranger = OwnedRoutines::filter(OTHER, vec![routine(1, USER, &[10])]);
        assert_eq!(
            data.plan_routine_removal(day(3), &stranger, 1, true),
            Err(LogError::NotOwner { routine_id: 1, user_id: OTHER })
        );
        assert_eq!(
            data.plan_routine_removal(day(3), &routines, 3, true),
            Err(LogError::NotOwner { routine_id: 3, user_id: USER })
        );

        data.remove_routine(day(3), 1);
        data.remove_routine(day(3), 2);
        assert!(!data.sessions.contains_key(&day(3)));
    }

    #[test]
    fn removing_a_foreign_session_routine_is_an_ownership_error() {
        let routines = owned(vec![routine(1, USER, &[10])]);
        let mut data = LocalData::default();
        data.sessions.insert(
            day(3),
            vec![
                session_from_routine(&routine(1, USER, &[10]), None),
                session_from_routine(&routine(5, OTHER, &[50]), Some(44)),
            ],
        );
        assert_eq!(
            data.plan_routine_removal(day(3), &routines, 5, false),
            Err(LogError::NotOwner { routine_id: 5, user_id: USER })
        );
        assert_eq!(
            data.plan_routine_removal(day(3), &routines, 1, false),
            Err(LogError::ConfirmationRequired(CONFIRM_DELETE_LOCAL_ROUTINE))
        );
    }

    #[test]
    fn shared_log_rate_averages_every_routine_on_it() {
        let routines = owned(vec![routine(1, USER, &[10, 11]), routine(2, USER, &[20]), routine(3, USER, &[30])]);
        let mut data = LocalData::default();
        data.add_routines(USER, day(3), &routines.routines).unwrap();
        data.set_log_id(day(3), &[1, 2], 40);
        data.set_log_id(day(3), &[3], 41);

        let toggled = data.toggle_exercise(day(3), &routines, 2, 20).unwrap();
        assert_eq!(stored_percent(toggled.completion_rate), 100);
        assert_eq!(data.rate_for_log(day(3), &routines, 40), 50);
        data.toggle_exercise(day(3), &routines, 1, 10).unwrap();
        assert_eq!(data.rate_for_log(day(3), &routines, 40), 75);
        assert_eq!(data.rate_for_log(day(3), &routines, 41), 0);
        assert_eq!(data.rate_for_log(day(3), &routines, 99), 0);
    }

    #[test]
    fn local_routine_removal_has_no_log() {
        let routines = owned(vec![routine(1, USER, &[10])]);
        let mut data = LocalData::default();
        data.add_routines(USER, day(3), &routines.routines).unwrap();
        assert_eq!(
            data.plan_routine_removal(day(3), &routines, 1, false),
            Err(LogError::ConfirmationRequired(CONFIRM_DELETE_LOCAL_ROUTINE))
        );
        let plan = data.plan_routine_removal(day(3), &routines, 1, true).unwrap();
        assert_eq!(plan.log_id, None);
    }

    #[test]
    fn memo_dirty_tracking() {
        let mut data = LocalData::default();
        data.seed_memo(day(3), "legs felt heavy");
        assert!(!data.memo(day(3)).is_dirty());
        data.seed_memo(day(3), "ignored");
        assert_eq!(data.memo(day(3)).text, "legs felt heavy");
        data.edit_memo(day(3), "legs felt fine".to_string());
        assert!(data.memo(day(3)).is_dirty());
        data.mark_memo_saved(day(3));
        assert!(!data.memo(day(3)).is_dirty());
    }

    #[test]
    fn memo_target_prefers_existing_logs() {
        let routines = owned(vec![routine(1, USER, &[10]), routine(2, USER, &[20])]);
        let mut data = LocalData::default();
        data.add_routines(USER, day(3), &routines.routines).unwrap();
        assert_eq!(
            data.memo_target(day(3), &routines, &[]),
            MemoTarget::Create { routine_ids: vec![1, 2], completion_rate: 0 }
        );
        let past = vec![log(8, USER, day(3), Some(at(3, 8)), &[1])];
        assert_eq!(data.memo_target(day(3), &routines, &past), MemoTarget::Log(8));
        data.set_log_id(day(3), &[2], 12);
        assert_eq!(data.memo_target(day(3), &routines, &past), MemoTarget::Log(12));
    }

    #[test]
    fn day_deletion_requires_a_record() {
        let routines = owned(vec![routine(1, USER, &[10])]);
        let mut data = LocalData::default();
        data.add_routines(USER, day(3), &routines.routines).unwrap();
        assert_eq!(
            data.plan_day_deletion(day(3), &routines, &[], true),
            Err(LogError::NothingToDelete)
        );

        let past = vec![
            log(3, USER, day(3), Some(at(3, 8)), &[1]),
            log(4, USER, day(3), Some(at(3, 9)), &[1]),
            log(5, OTHER, day(3), Some(at(3, 9)), &[1]),
        ];
        data.set_log_id(day(3), &[1], 6);
        assert_eq!(
            data.plan_day_deletion(day(3), &routines, &past, false),
            Err(LogError::ConfirmationRequired(CONFIRM_DELETE_DAY))
        );
        assert_eq!(data.plan_day_deletion(day(3), &routines, &past, true).unwrap(), vec![3, 4, 6]);

        data.forget_log(day(3), 6);
        assert_eq!(data.session_routines(day(3), &routines)[0].log_id, None);
        assert_eq!(data.plan_day_deletion(day(3), &routines, &past, true).unwrap(), vec![3, 4]);
        assert_eq!(
            data.plan_day_deletion(day(3), &routines, &[], true),
            Err(LogError::NothingToDelete)
        );

        data.edit_memo(day(3), "done".to_string());
        data.clear_day(day(3));
        assert!(data.sessions.is_empty());
        assert!(data.memos.is_empty());
    }

    #[test]
    fn fully_completed_needs_every_log_at_100() {
        let mut a = log(1, USER, day(3), None, &[1]);
        let mut b = log(2, USER, day(3), None, &[2]);
        a.completion_rate = 100.0;
        b.completion_rate = 99.9;
        assert!(!is_fully_completed(&[a.clone(), b.clone()], USER, day(3)));
        b.completion_rate = 100.0;
        assert!(is_fully_completed(&[a, b], USER, day(3)));
        assert!(!is_fully_completed(&[], USER, day(3)));
    }

    #[test]
    fn user_change_and_logout_clear_cache() {
        let mut data = LocalData::default();
        assert!(!data.observe_user(USER));
        data.add_routines(USER, day(3), &[routine(1, USER, &[10])]).unwrap();
        data.edit_memo(day(3), "note".to_string());
        assert!(!data.observe_user(USER));
        assert_eq!(data.sessions.len(), 1);

        assert!(data.observe_user(OTHER));
        assert!(data.sessions.is_empty());
        assert!(data.memos.is_empty());

        data.add_routines(OTHER, day(3), &[routine(2, OTHER, &[20])]).unwrap();
        data.token = Some("t".to_string());
        data.logout();
        assert!(data.sessions.is_empty());
        assert_eq!(data.last_user_id, None);
        assert_eq!(data.token, None);
    }
}
