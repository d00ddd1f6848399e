#[macro_use]
extern crate rocket;

mod api;
mod auth;
mod catalog;
mod db;
mod env;
mod error;
mod player;
mod progress;
mod quiz;
mod telemetry;
#[cfg(test)]
mod test;
mod validation;

use api::{
    api_complete_course, api_get_courses, api_get_quiz, api_get_students, api_leave_course,
    api_login, api_logout, api_me, api_me_unauthorized, api_player_event, api_quiz_history,
    api_register, api_set_student_status, api_submit_quiz, health,
};
use auth::unauthorized_api;
use db::clean_expired_sessions;
use error::AppError;
use player::PlaybackTracker;
use rocket::{Build, Rocket, tokio};
use std::sync::Mutex;
use telemetry::{OtelGuard, TelemetryFairing, init_tracing};
use thiserror::Error;

use sqlx::SqlitePool;
use tracing::{error, info};

static TELEMETRY_GUARD: Mutex<Option<OtelGuard>> = Mutex::new(None);

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Anyhow(anyhow::Error),
    #[error("{0}")]
    Figment(rocket::figment::Error),
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Application error: {0}")]
    App(#[from] AppError),
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Error::Anyhow(value)
    }
}

impl From<rocket::figment::Error> for Error {
    fn from(value: rocket::figment::Error) -> Self {
        Error::Figment(value)
    }
}

#[launch]
async fn rocket() -> _ {
    let _ = env::load_environment();

    if let Ok(mut guard) = TELEMETRY_GUARD.lock() {
        *guard = init_tracing();
    }

    let database_url = std::env::var("DATABASE_URL").unwrap_or_default();

    let pool = SqlitePool::connect(&database_url)
        .await
        .expect("Failed to connect to SQLite database");

    let pool_clone = pool.clone();

    tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;

        loop {
            match clean_expired_sessions(&pool_clone).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Cleaned up {} expired sessions", count);
                    }
                }
                Err(e) => {
                    error!("Failed to clean expired sessions: {}", e);
                }
            }

            tokio::time::sleep(tokio::time::Duration::from_secs(3600)).await;
        }
    });

    info!("Running database migrations...");
    match sqlx::migrate!("./migrations").run(&pool).await {
        Ok(_) => info!("Migrations completed successfully"),
        Err(e) => {
            error!("Failed to run migrations: {}", e);
            panic!("Database migration failed: {}", e);
        }
    }

    init_rocket(pool).await
}

pub async fn init_rocket(pool: SqlitePool) -> Rocket<Build> {
    info!("Starting aero training portal");

    rocket::build()
        .manage(pool)
        .manage(PlaybackTracker::new())
        .mount(
            "/api",
            routes![
                api_register,
                api_login,
                api_logout,
                api_me,
                api_me_unauthorized,
                api_get_courses,
                api_complete_course,
                api_player_event,
                api_leave_course,
                api_get_quiz,
                api_submit_quiz,
                api_quiz_history,
                api_get_students,
                api_set_student_status,
            ],
        )
        .register("/api", catchers![unauthorized_api])
        .mount("/api", routes![health])
        .attach(TelemetryFairing)
}
