#[cfg(test)]
pub mod test_utils {
    use crate::auth::{ApprovalStatus, Role, User};
    use crate::db::{create_account, create_profile, get_profile, insert_quiz_attempt};
    use crate::error::AppError;
    use crate::progress::complete_course;
    use rocket::http::{ContentType, Cookie, Status};
    use rocket::local::asynchronous::Client;
    use serde_json::json;
    use sqlx::{Pool, Sqlite, SqlitePool};
    use std::collections::HashMap;
    use std::sync::Once;
    use tracing::log::LevelFilter;

    static INIT: Once = Once::new();
    pub static STANDARD_PASSWORD: &str = "password123";

    #[derive(Default)]
    pub struct TestDbBuilder {
        users: Vec<TestUser>,
        completed_courses: Vec<(String, String)>,
        quiz_attempts: Vec<(String, f64)>,
    }

    pub struct TestUser {
        pub email: String,
        pub name: String,
        pub cpf: String,
        pub role: Role,
        pub status: ApprovalStatus,
        pub password: String,
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn student(mut self, email: &str, name: &str, cpf: &str) -> Self {
            self.users.push(TestUser {
                email: email.to_string(),
                name: name.to_string(),
                cpf: cpf.to_string(),
                role: Role::Student,
                status: ApprovalStatus::Approved,
                password: STANDARD_PASSWORD.to_string(),
            });
            self
        }

        pub fn pending_student(mut self, email: &str, name: &str, cpf: &str) -> Self {
            self.users.push(TestUser {
                email: email.to_string(),
                name: name.to_string(),
                cpf: cpf.to_string(),
                role: Role::Student,
                status: ApprovalStatus::Pending,
                password: STANDARD_PASSWORD.to_string(),
            });
            self
        }

        pub fn admin(mut self, email: &str, name: &str, cpf: &str) -> Self {
            self.users.push(TestUser {
                email: email.to_string(),
                name: name.to_string(),
                cpf: cpf.to_string(),
                role: Role::Admin,
                status: ApprovalStatus::Approved,
                password: STANDARD_PASSWORD.to_string(),
            });
            self
        }

        /// Seeds a completed course for the user, running the real completion
        /// path so percentage and bonus land as they would in production.
        pub fn completed_course(mut self, email: &str, course_id: &str) -> Self {
            self.completed_courses
                .push((email.to_string(), course_id.to_string()));
            self
        }

        pub fn quiz_attempt(mut self, email: &str, score: f64) -> Self {
            self.quiz_attempts.push((email.to_string(), score));
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            INIT.call_once(|| {
                let _ = env_logger::builder()
                    .filter_level(LevelFilter::Debug)
                    .is_test(true)
                    .try_init();
            });

            let pool = SqlitePool::connect("sqlite::memory:").await?;

            sqlx::migrate!("./migrations").run(&pool).await?;

            let mut user_id_map: HashMap<String, i64> = HashMap::new();

            for user in &self.users {
                let account_id = create_account(&pool, &user.email, &user.password).await?;
                create_profile(&pool, account_id, &user.name, &user.cpf).await?;

                if user.role != Role::Student || user.status != ApprovalStatus::Approved {
                    sqlx::query("UPDATE profiles SET role = ?, status = ? WHERE id = ?")
                        .bind(user.role.as_str())
                        .bind(user.status.as_str())
                        .bind(account_id)
                        .execute(&pool)
                        .await?;
                }

                user_id_map.insert(user.email.clone(), account_id);
            }

            for (email, course_id) in &self.completed_courses {
                if let Some(user_id) = user_id_map.get(email).copied() {
                    let user = get_profile(&pool, user_id).await?;
                    complete_course(&pool, &user, course_id).await?;
                }
            }

            for (email, score) in &self.quiz_attempts {
                if let Some(user_id) = user_id_map.get(email).copied() {
                    insert_quiz_attempt(&pool, user_id, *score).await?;
                }
            }

            Ok(TestDb { pool, user_id_map })
        }
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        pub user_id_map: HashMap<String, i64>,
    }

    impl TestDb {
        pub fn user_id(&self, email: &str) -> Option<i64> {
            self.user_id_map.get(email).copied()
        }

        pub async fn profile(&self, email: &str) -> Result<User, AppError> {
            let id = self
                .user_id(email)
                .ok_or_else(|| AppError::NotFound(format!("No test user {}", email)))?;
            get_profile(&self.pool, id).await
        }
    }

    /// One admin, one approved student and one pending student, which covers
    /// the access-control matrix most API tests need.
    pub async fn create_standard_test_db() -> TestDb {
        TestDbBuilder::new()
            .admin("admin@portal.com", "Admin User", "99988877766")
            .student("student@portal.com", "Student User", "12345678901")
            .pending_student("pending@portal.com", "Pending Student", "22233344455")
            .build()
            .await
            .expect("Failed to build test database")
    }

    pub async fn setup_test_client(test_db: TestDb) -> (Client, TestDb) {
        let rocket = crate::init_rocket(test_db.pool.clone()).await;

        let client = Client::tracked(rocket)
            .await
            .expect("Failed to build test client");

        (client, test_db)
    }

    /// Signs the user in through the real login endpoint and hands back the
    /// session cookies for subsequent requests.
    pub async fn login_test_user(
        client: &Client,
        email: &str,
        password: &str,
    ) -> Vec<Cookie<'static>> {
        let response = client
            .post("/api/login")
            .header(ContentType::JSON)
            .body(
                json!({
                    "email": email,
                    "password": password,
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok, "Login request failed");

        response
            .cookies()
            .iter()
            .map(|cookie| cookie.clone().into_owned())
            .collect()
    }
}
