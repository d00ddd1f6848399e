use rocket::State;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::{Deserialize, Serialize, json::Json};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{ApprovalStatus, Permission, Role, User, UserSession};
use crate::catalog::{self, Course};
use crate::db::{
    authenticate_account, cpf_registered, create_account, create_profile, create_user_session,
    find_profile, get_quiz_attempts, get_students, insert_quiz_attempt, invalidate_session,
    set_profile_status,
};
use crate::player::{PlaybackTracker, PlaybackUpdate, PlayerEvent};
use crate::progress::{ProgressEntry, complete_course};
use crate::quiz::{QuizAttempt, QuizGate, QuizSession};
use crate::validation::{
    AppErrorExt, JsonValidateExt, PermissionCheckExt, ToValidationResponse, ValidationResponse,
};

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub id: i64,
    pub name: String,
    pub cpf: String,
    pub role: String,
    pub status: String,
    pub progress: Vec<ProgressEntry>,
    pub completion_percentage: f64,
    pub bonus_points: i64,
}

impl From<User> for UserData {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            cpf: user.cpf.clone(),
            role: user.role.to_string(),
            status: user.status.to_string(),
            progress: user.progress.clone(),
            completion_percentage: user.completion_percentage,
            bonus_points: user.bonus_points,
        }
    }
}

// Registration

#[derive(Deserialize, Validate, Clone)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Informe o nome completo"))]
    name: String,
    #[validate(length(equal = 11, message = "O CPF deve ter 11 dígitos"))]
    cpf: String,
    #[validate(email(message = "Email inválido"))]
    email: String,
    #[validate(length(min = 6, message = "A senha deve ter pelo menos 6 caracteres"))]
    password: String,
}

#[post("/register", data = "<registration>")]
pub async fn api_register(
    registration: Json<RegisterRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, Custom<Json<ValidationResponse>>> {
    let validated = registration.validate_custom()?;

    if cpf_registered(db, &validated.cpf).await.validate_custom()? {
        return Err(Custom(
            Status::Conflict,
            Json(ValidationResponse::with_error(
                "cpf",
                "Este CPF já está cadastrado",
            )),
        ));
    }

    let account_id = create_account(db, &validated.email, &validated.password)
        .await
        .validate_custom()?;

    // Not transactional: a profile-insert failure here leaves the account
    // orphaned. The caller simply stays signed out.
    if let Err(err) = create_profile(db, account_id, &validated.name, &validated.cpf).await {
        tracing::error!(account_id, error = ?err, "Profile creation failed after account creation");
        return Err(err.to_validation_response());
    }

    Ok(Status::Created)
}

// Login / session gate

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Email inválido"))]
    email: String,
    password: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub user: Option<UserData>,
    pub error: Option<String>,
    pub redirect_url: Option<String>,
}

#[post("/login", data = "<login>")]
pub async fn api_login(
    login: Json<LoginRequest>,
    cookies: &rocket::http::CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<LoginResponse>, Custom<Json<ValidationResponse>>> {
    use chrono::Utc;
    use rocket::http::{Cookie, SameSite};

    let validated = login.validate_custom()?;

    let account_id = match authenticate_account(db, &validated.email, &validated.password)
        .await
        .validate_custom()?
    {
        Some(id) => id,
        None => {
            return Ok(Json(LoginResponse {
                success: false,
                user: None,
                error: Some("Email ou senha incorretos".to_string()),
                redirect_url: None,
            }));
        }
    };

    // First sign-in is the only profile creation path besides registration:
    // an account without a profile gets the defaults and adopts them.
    let user = match find_profile(db, account_id).await.validate_custom()? {
        Some(user) => user,
        None => {
            let default_name = validated
                .email
                .split('@')
                .next()
                .filter(|part| !part.is_empty())
                .unwrap_or("Novo Usuário");
            create_profile(db, account_id, default_name, "00000000000")
                .await
                .validate_custom()?
        }
    };

    let token = UserSession::generate_token();
    let expires_at = Utc::now() + chrono::Duration::hours(1);

    create_user_session(db, user.id, &token, expires_at.naive_utc())
        .await
        .validate_custom()?;

    let cookie = Cookie::build(("session_token", token))
        .same_site(SameSite::Lax)
        .http_only(true)
        .max_age(rocket::time::Duration::hours(1));
    cookies.add_private(cookie);

    cookies.add_private(
        Cookie::build(("user_id", user.id.to_string()))
            .same_site(SameSite::Lax)
            .http_only(true)
            .max_age(rocket::time::Duration::hours(1)),
    );

    cookies.add_private(
        Cookie::build(("user_role", user.role.to_string()))
            .same_site(SameSite::Lax)
            .max_age(rocket::time::Duration::hours(1)),
    );

    let redirect_url = match user.role {
        Role::Admin => "/admin".to_string(),
        Role::Student => "/".to_string(),
    };

    Ok(Json(LoginResponse {
        success: true,
        user: Some(UserData::from(user)),
        error: None,
        redirect_url: Some(redirect_url),
    }))
}

#[post("/logout")]
pub async fn api_logout(
    user: Option<User>,
    cookies: &rocket::http::CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
    tracker: &State<PlaybackTracker>,
) -> Status {
    let token = cookies
        .get_private("session_token")
        .map(|cookie| cookie.value().to_string());

    if let Some(token) = token {
        let _ = invalidate_session(db, &token).await;
    }

    // Teardown: the user's live playback sessions go with the sign-out.
    if let Some(user) = user {
        tracker.clear_user(user.id).await;
    }

    cookies.remove_private(rocket::http::Cookie::build("session_token"));
    cookies.remove_private(rocket::http::Cookie::build("user_id"));
    cookies.remove_private(rocket::http::Cookie::build("user_role"));

    Status::Ok
}

#[get("/me")]
pub async fn api_me(user: User) -> Json<UserData> {
    Json(UserData::from(user))
}

#[get("/me", rank = 2)]
pub async fn api_me_unauthorized() -> Status {
    Status::Unauthorized
}

// Catalog / progress

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseData {
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub duration_minutes: u32,
    pub completed: bool,
    pub watched_minutes: u32,
}

impl CourseData {
    fn new(course: &Course, progress: Option<&ProgressEntry>) -> Self {
        Self {
            id: course.id.to_string(),
            title: course.title.to_string(),
            description: course.description.to_string(),
            video_url: course.video_url.to_string(),
            duration_minutes: course.duration_minutes,
            completed: progress.map(|p| p.completed).unwrap_or(false),
            watched_minutes: progress.map(|p| p.watched_minutes).unwrap_or(0),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse {
    pub courses: Vec<CourseData>,
    pub completion_percentage: f64,
    pub bonus_points: i64,
}

#[get("/courses")]
pub async fn api_get_courses(user: User) -> Result<Json<CatalogResponse>, Status> {
    user.require_permission(Permission::ViewOwnProgress)?;

    let courses = catalog::COURSES
        .iter()
        .map(|course| {
            let entry = user.progress.iter().find(|p| p.course_id == course.id);
            CourseData::new(course, entry)
        })
        .collect();

    Ok(Json(CatalogResponse {
        courses,
        completion_percentage: user.completion_percentage,
        bonus_points: user.bonus_points,
    }))
}

#[post("/course/<id>/complete")]
pub async fn api_complete_course(
    id: &str,
    user: User,
    db: &State<Pool<Sqlite>>,
    tracker: &State<PlaybackTracker>,
) -> Result<Json<UserData>, Status> {
    user.require_permission(Permission::CompleteCourses)?;

    let updated = complete_course(db, &user, id).await?;

    // Completion returns the viewer to the catalog.
    tracker.clear_course(user.id, id).await;

    Ok(Json(UserData::from(updated)))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEventResponse {
    #[serde(flatten)]
    pub playback: PlaybackUpdate,
    /// Present only when this event completed the course.
    pub user: Option<UserData>,
}

#[post("/course/<id>/player", data = "<event>")]
pub async fn api_player_event(
    id: &str,
    event: Json<PlayerEvent>,
    user: User,
    db: &State<Pool<Sqlite>>,
    tracker: &State<PlaybackTracker>,
) -> Result<Json<PlayerEventResponse>, Status> {
    user.require_permission(Permission::CompleteCourses)?;

    if catalog::find_course(id).is_none() {
        return Err(Status::NotFound);
    }

    let playback = tracker.observe(user.id, id, event.into_inner()).await;

    if !playback.completion_triggered {
        return Ok(Json(PlayerEventResponse {
            playback,
            user: None,
        }));
    }

    match complete_course(db, &user, id).await {
        // The latched session stays put until the viewer leaves the course,
        // so replayed `ended` events cannot complete twice.
        Ok(updated) => Ok(Json(PlayerEventResponse {
            playback,
            user: Some(UserData::from(updated)),
        })),
        Err(err) => {
            // The latch is consumed but the write failed: drop the session so
            // a manual retry can trigger completion again.
            tracker.clear_course(user.id, id).await;
            Err(err.into())
        }
    }
}

#[delete("/course/<id>/player")]
pub async fn api_leave_course(
    id: &str,
    user: User,
    tracker: &State<PlaybackTracker>,
) -> Status {
    tracker.clear_course(user.id, id).await;
    Status::Ok
}

// Quiz

#[derive(Serialize, Deserialize)]
pub struct QuizQuestionData {
    pub id: u32,
    pub question: String,
    pub options: Vec<String>,
}

#[derive(Serialize, Deserialize)]
pub struct QuizResponse {
    pub questions: Vec<QuizQuestionData>,
}

#[get("/quiz")]
pub async fn api_get_quiz(user: User) -> Result<Json<QuizResponse>, Status> {
    user.require_permission(Permission::TakeQuiz)?;

    // Correct answers never leave the server.
    let questions = catalog::QUESTIONS
        .iter()
        .map(|q| QuizQuestionData {
            id: q.id,
            question: q.question.to_string(),
            options: q.options.iter().map(|o| o.to_string()).collect(),
        })
        .collect();

    Ok(Json(QuizResponse { questions }))
}

#[derive(Deserialize)]
pub struct QuizSubmission {
    pub answers: Vec<i32>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResultResponse {
    pub score: f64,
    pub attempts: usize,
    pub scores: Vec<f64>,
}

#[post("/quiz", data = "<submission>")]
pub async fn api_submit_quiz(
    submission: Json<QuizSubmission>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<QuizResultResponse>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::TakeQuiz)
        .validate_custom()?;

    let mut session = QuizSession::from_answers(submission.into_inner().answers);

    let score = match session.submit(catalog::QUESTIONS) {
        Ok(score) => score,
        Err(QuizGate::Unanswered(question)) => {
            return Err(Custom(
                Status::UnprocessableEntity,
                Json(ValidationResponse::with_error(
                    "question",
                    &format!(
                        "Por favor, responda a questão {} antes de finalizar a avaliação.",
                        question
                    ),
                )),
            ));
        }
        Err(QuizGate::WrongLength { expected, got }) => {
            return Err(Custom(
                Status::BadRequest,
                Json(ValidationResponse::with_error(
                    "answers",
                    &format!("Expected {} answers, got {}", expected, got),
                )),
            ));
        }
    };

    // History is read before the write. A failure on either query leaves the
    // session in Answering with nothing recorded, so the client keeps its
    // selections and can retry; once the insert is confirmed no further
    // query can fail the request into a retry that would duplicate the row.
    let prior = get_quiz_attempts(db, user.id).await.validate_custom()?;

    insert_quiz_attempt(db, user.id, score)
        .await
        .validate_custom()?;
    session.mark_scored(score);

    let mut scores = vec![score];
    scores.extend(prior.iter().map(|attempt| attempt.score));

    Ok(Json(QuizResultResponse {
        score,
        attempts: scores.len(),
        scores,
    }))
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizHistoryResponse {
    pub attempts: usize,
    pub scores: Vec<f64>,
    pub history: Vec<QuizAttempt>,
}

#[get("/quiz/history")]
pub async fn api_quiz_history(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<QuizHistoryResponse>, Status> {
    user.require_permission(Permission::TakeQuiz)?;

    let history = get_quiz_attempts(db, user.id).await?;

    Ok(Json(QuizHistoryResponse {
        attempts: history.len(),
        scores: history.iter().map(|attempt| attempt.score).collect(),
        history,
    }))
}

// Admin approval

#[get("/admin/students")]
pub async fn api_get_students(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<UserData>>, Status> {
    user.require_permission(Permission::ViewAllStudents)?;

    let students = get_students(db).await?;

    Ok(Json(students.into_iter().map(UserData::from).collect()))
}

#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    status: String,
}

#[put("/admin/students/<id>/status", data = "<update>")]
pub async fn api_set_student_status(
    id: i64,
    update: Json<StatusUpdateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<UserData>>, Status> {
    user.require_permission(Permission::ApproveStudents)?;

    // Only the two terminal states pass this boundary; the pending state is
    // one-way and cannot be re-entered here.
    let status = match update.status.as_str() {
        "approved" => ApprovalStatus::Approved,
        "rejected" => ApprovalStatus::Rejected,
        _ => return Err(Status::BadRequest),
    };

    set_profile_status(db, id, status).await?;

    // Unconditional reload, no optimistic patch.
    let students = get_students(db).await?;

    Ok(Json(students.into_iter().map(UserData::from).collect()))
}

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}
