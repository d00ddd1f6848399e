use rocket::Request;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde_json::{Value, json};
use sqlx::SqlitePool;

use crate::db::{get_profile, get_session_by_token};

use super::User;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for User {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let auth_span = tracing::info_span!("user_auth_guard");
        let _guard = auth_span.enter();

        let cookies = request.cookies();

        let token = cookies
            .get_private("session_token")
            .map(|c| c.value().to_string());

        if let Some(token) = token {
            let db = match request.rocket().state::<SqlitePool>() {
                Some(pool) => pool,
                _ => {
                    tracing::error!("Database pool not found in managed state");
                    return Outcome::Error((Status::InternalServerError, ()));
                }
            };

            match get_session_by_token(db, &token).await {
                Ok(session) => {
                    if !session.is_valid() {
                        tracing::warn!("Session token expired");
                        return Outcome::Forward(Status::Unauthorized);
                    }

                    // A valid session without a profile leaves the request
                    // unauthenticated, same as an absent session.
                    match get_profile(db, session.user_id).await {
                        Ok(user) => {
                            tracing::info!(user_id = %user.id, role = %user.role.as_str(), "User authenticated via session token");
                            return Outcome::Success(user);
                        }
                        Err(err) => {
                            tracing::error!(user_id = %session.user_id, error = ?err, "Failed to fetch profile for valid session");
                            return Outcome::Error((Status::InternalServerError, ()));
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(error = ?err, "Invalid session token");
                    return Outcome::Forward(Status::Unauthorized);
                }
            }
        }

        Outcome::Error((Status::Unauthorized, ()))
    }
}

#[catch(401)]
pub fn unauthorized_api(_req: &Request) -> Custom<Json<Value>> {
    let error_json = json!({
        "error": "Unauthorized",
        "message": "Authentication required"
    });

    Custom(Status::Unauthorized, Json(error_json))
}
