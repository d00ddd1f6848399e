//! Course progress reconciliation.
//!
//! A completion event replaces any prior entry for the course with a fresh
//! completed one, recomputes the overall percentage from the catalog size,
//! and grants the bonus increment. The profile row is updated in a single
//! write; the caller only adopts the new state after that write succeeds.

use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::auth::User;
use crate::catalog;
use crate::db::update_profile_progress;
use crate::error::AppError;

/// Granted on every completion event, including re-completions of an already
/// completed course. Intentionally not idempotent; see DESIGN.md.
pub const BONUS_PER_COMPLETION: i64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    pub course_id: String,
    pub completed: bool,
    pub watched_minutes: u32,
}

impl ProgressEntry {
    pub fn completed(course_id: &str) -> Self {
        Self {
            course_id: course_id.to_string(),
            completed: true,
            // Live watched time is never persisted here.
            watched_minutes: 0,
        }
    }
}

/// New progress set for a completion event: any prior entry for the course is
/// removed, then a fresh completed entry is appended. The result holds at
/// most one entry per course id as long as the input did.
pub fn reconcile(current: &[ProgressEntry], course_id: &str) -> Vec<ProgressEntry> {
    let mut next: Vec<ProgressEntry> = current
        .iter()
        .filter(|entry| entry.course_id != course_id)
        .cloned()
        .collect();
    next.push(ProgressEntry::completed(course_id));
    next
}

pub fn completed_count(progress: &[ProgressEntry]) -> usize {
    progress.iter().filter(|entry| entry.completed).count()
}

/// `completed / total * 100`, recomputed from the set on every call.
pub fn completion_percentage(progress: &[ProgressEntry], total_courses: usize) -> f64 {
    if total_courses == 0 {
        return 0.0;
    }
    (completed_count(progress) as f64 / total_courses as f64) * 100.0
}

/// The `completeCourse` operation. Requires an authenticated user (enforced
/// upstream by the request guard). On success returns the profile as adopted
/// after the confirmed write; on failure the caller's state is untouched.
#[instrument(skip(pool, user), fields(user_id = user.id))]
pub async fn complete_course(
    pool: &Pool<Sqlite>,
    user: &User,
    course_id: &str,
) -> Result<User, AppError> {
    let course = catalog::find_course(course_id)
        .ok_or_else(|| AppError::NotFound(format!("Course {} not found in catalog", course_id)))?;

    let new_progress = reconcile(&user.progress, course.id);
    let new_percentage = completion_percentage(&new_progress, catalog::course_count());
    let new_bonus = user.bonus_points + BONUS_PER_COMPLETION;

    update_profile_progress(pool, user.id, &new_progress, new_percentage, new_bonus).await?;

    info!(
        course_id = %course.id,
        completion_percentage = new_percentage,
        bonus_points = new_bonus,
        "Course completed"
    );

    let mut updated = user.clone();
    updated.progress = new_progress;
    updated.completion_percentage = new_percentage;
    updated.bonus_points = new_bonus;
    Ok(updated)
}
