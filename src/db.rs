use crate::{
    auth::{ApprovalStatus, DbProfile, DbUserSession, User, UserSession},
    error::AppError,
    progress::ProgressEntry,
    quiz::{DbQuizAttempt, QuizAttempt},
};
use chrono::{NaiveDateTime, Utc};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

// Accounts (the identity side of the gate).

#[instrument(skip_all, fields(email))]
pub async fn create_account(
    pool: &Pool<Sqlite>,
    email: &str,
    password: &str,
) -> Result<i64, AppError> {
    info!("Creating account");

    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM accounts WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Err(AppError::Validation(
            "Este email já está cadastrado".to_string(),
        ));
    }

    let hashed_password = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

    let res = sqlx::query("INSERT INTO accounts (email, password) VALUES (?, ?)")
        .bind(email)
        .bind(hashed_password)
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

#[derive(sqlx::FromRow)]
struct AccountCredentials {
    id: i64,
    password: String,
}

/// Returns the account id when the credentials check out, `None` otherwise.
#[instrument(skip_all, fields(email))]
pub async fn authenticate_account(
    pool: &Pool<Sqlite>,
    email: &str,
    password: &str,
) -> Result<Option<i64>, AppError> {
    info!("Authenticating account");

    let account =
        sqlx::query_as::<_, AccountCredentials>("SELECT id, password FROM accounts WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await?;

    match account {
        Some(account) => match bcrypt::verify(password, &account.password) {
            Ok(true) => Ok(Some(account.id)),
            _ => Ok(None),
        },
        _ => Ok(None),
    }
}

// Profiles.

const PROFILE_COLUMNS: &str =
    "id, name, cpf, role, status, progress, completion_percentage, bonus_points";

#[instrument]
pub async fn get_profile(pool: &Pool<Sqlite>, id: i64) -> Result<User, AppError> {
    info!("Fetching profile by ID");

    match find_profile(pool, id).await? {
        Some(user) => Ok(user),
        _ => Err(AppError::NotFound(format!(
            "Profile with id {} not found in database",
            id
        ))),
    }
}

#[instrument]
pub async fn find_profile(pool: &Pool<Sqlite>, id: i64) -> Result<Option<User>, AppError> {
    let row = sqlx::query_as::<_, DbProfile>(&format!(
        "SELECT {} FROM profiles WHERE id = ?",
        PROFILE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(User::from))
}

#[instrument]
pub async fn cpf_registered(pool: &Pool<Sqlite>, cpf: &str) -> Result<bool, AppError> {
    info!("Checking CPF registration");

    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM profiles WHERE cpf = ?")
        .bind(cpf)
        .fetch_optional(pool)
        .await?;

    Ok(existing.is_some())
}

/// Inserts a fresh student profile. New profiles always start approved with
/// an empty progress set; the admin pending flow is driven by data, not by
/// this creation path.
#[instrument(skip_all, fields(id))]
pub async fn create_profile(
    pool: &Pool<Sqlite>,
    id: i64,
    name: &str,
    cpf: &str,
) -> Result<User, AppError> {
    info!("Creating profile");

    sqlx::query(
        "INSERT INTO profiles (id, name, cpf, role, status, progress, completion_percentage, bonus_points)
         VALUES (?, ?, ?, 'student', 'approved', '[]', 0, 0)",
    )
    .bind(id)
    .bind(name)
    .bind(cpf)
    .execute(pool)
    .await?;

    get_profile(pool, id).await
}

/// The reconciler's single write: progress set, derived percentage and bonus
/// counter all land in one statement keyed by the profile id.
#[instrument(skip(pool, progress))]
pub async fn update_profile_progress(
    pool: &Pool<Sqlite>,
    user_id: i64,
    progress: &[ProgressEntry],
    completion_percentage: f64,
    bonus_points: i64,
) -> Result<(), AppError> {
    info!("Updating profile progress");

    let progress_json = serde_json::to_string(progress)?;

    sqlx::query(
        "UPDATE profiles
         SET progress = ?, completion_percentage = ?, bonus_points = ?
         WHERE id = ?",
    )
    .bind(progress_json)
    .bind(completion_percentage)
    .bind(bonus_points)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

#[instrument]
pub async fn set_profile_status(
    pool: &Pool<Sqlite>,
    user_id: i64,
    status: ApprovalStatus,
) -> Result<(), AppError> {
    info!(status = %status, "Updating profile approval status");

    sqlx::query("UPDATE profiles SET status = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument]
pub async fn get_students(pool: &Pool<Sqlite>) -> Result<Vec<User>, AppError> {
    info!("Getting student profiles");

    let rows = sqlx::query_as::<_, DbProfile>(&format!(
        "SELECT {} FROM profiles WHERE role = 'student' ORDER BY name",
        PROFILE_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(User::from).collect())
}

// Quiz attempts (append-only).

#[instrument(skip(pool))]
pub async fn insert_quiz_attempt(
    pool: &Pool<Sqlite>,
    user_id: i64,
    score: f64,
) -> Result<i64, AppError> {
    info!("Recording quiz attempt");

    let now = Utc::now().naive_utc();

    let res = sqlx::query("INSERT INTO quiz_attempts (user_id, score, created_at) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(score)
        .bind(now)
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument]
pub async fn get_quiz_attempts(
    pool: &Pool<Sqlite>,
    user_id: i64,
) -> Result<Vec<QuizAttempt>, AppError> {
    info!("Getting quiz attempts");

    let rows = sqlx::query_as::<_, DbQuizAttempt>(
        "SELECT id, user_id, score, created_at FROM quiz_attempts
         WHERE user_id = ?
         ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(QuizAttempt::from).collect())
}

// Sessions.

#[instrument(skip(pool, token))]
pub async fn create_user_session(
    pool: &Pool<Sqlite>,
    user_id: i64,
    token: &str,
    expires_at: NaiveDateTime,
) -> Result<i64, AppError> {
    info!("Creating user session");

    let res = sqlx::query("INSERT INTO user_sessions (user_id, token, expires_at) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool, token))]
pub async fn get_session_by_token(
    pool: &Pool<Sqlite>,
    token: &str,
) -> Result<UserSession, AppError> {
    info!("Getting session by token");

    let session = sqlx::query_as::<_, DbUserSession>(
        "SELECT id, user_id, token, created_at, expires_at FROM user_sessions WHERE token = ?",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    match session {
        Some(session) => Ok(UserSession::from(session)),
        _ => Err(AppError::Authentication(
            "Invalid session token".to_string(),
        )),
    }
}

#[instrument(skip(pool, token))]
pub async fn invalidate_session(pool: &Pool<Sqlite>, token: &str) -> Result<(), AppError> {
    info!("Invalidating session");

    sqlx::query("DELETE FROM user_sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn clean_expired_sessions(pool: &Pool<Sqlite>) -> Result<u64, AppError> {
    info!("Cleaning expired sessions");

    let now = Utc::now().naive_utc();

    let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at < ?")
        .bind(now)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
