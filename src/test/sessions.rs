#[cfg(test)]
mod tests {
    use crate::auth::UserSession;
    use crate::db::{
        clean_expired_sessions, create_user_session, get_session_by_token, invalidate_session,
    };
    use crate::error::AppError;
    use crate::test::test_utils::TestDbBuilder;
    use chrono::{Duration, Utc};

    #[test]
    fn test_generated_tokens_are_unique() {
        let first = UserSession::generate_token();
        let second = UserSession::generate_token();

        assert_eq!(first.len(), 32);
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_create_and_fetch_session() {
        let test_db = TestDbBuilder::new()
            .student("student@portal.com", "Student User", "12345678901")
            .build()
            .await
            .unwrap();

        let user_id = test_db.user_id("student@portal.com").unwrap();
        let token = UserSession::generate_token();
        let expires_at = (Utc::now() + Duration::hours(1)).naive_utc();

        create_user_session(&test_db.pool, user_id, &token, expires_at)
            .await
            .unwrap();

        let session = get_session_by_token(&test_db.pool, &token).await.unwrap();

        assert_eq!(session.user_id, user_id);
        assert_eq!(session.token, token);
        assert!(session.is_valid());
    }

    #[tokio::test]
    async fn test_unknown_token_is_an_authentication_error() {
        let test_db = TestDbBuilder::new().build().await.unwrap();

        let result = get_session_by_token(&test_db.pool, "no_such_token").await;

        assert!(matches!(result, Err(AppError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_invalidate_session_removes_it() {
        let test_db = TestDbBuilder::new()
            .student("student@portal.com", "Student User", "12345678901")
            .build()
            .await
            .unwrap();

        let user_id = test_db.user_id("student@portal.com").unwrap();
        let token = UserSession::generate_token();
        let expires_at = (Utc::now() + Duration::hours(1)).naive_utc();

        create_user_session(&test_db.pool, user_id, &token, expires_at)
            .await
            .unwrap();
        invalidate_session(&test_db.pool, &token).await.unwrap();

        let result = get_session_by_token(&test_db.pool, &token).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_expired_session_is_not_valid() {
        let test_db = TestDbBuilder::new()
            .student("student@portal.com", "Student User", "12345678901")
            .build()
            .await
            .unwrap();

        let user_id = test_db.user_id("student@portal.com").unwrap();
        let token = UserSession::generate_token();
        let expires_at = (Utc::now() - Duration::minutes(5)).naive_utc();

        create_user_session(&test_db.pool, user_id, &token, expires_at)
            .await
            .unwrap();

        let session = get_session_by_token(&test_db.pool, &token).await.unwrap();
        assert!(!session.is_valid());
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_expired_sessions() {
        let test_db = TestDbBuilder::new()
            .student("student@portal.com", "Student User", "12345678901")
            .build()
            .await
            .unwrap();

        let user_id = test_db.user_id("student@portal.com").unwrap();

        let expired_token = UserSession::generate_token();
        create_user_session(
            &test_db.pool,
            user_id,
            &expired_token,
            (Utc::now() - Duration::hours(2)).naive_utc(),
        )
        .await
        .unwrap();

        let live_token = UserSession::generate_token();
        create_user_session(
            &test_db.pool,
            user_id,
            &live_token,
            (Utc::now() + Duration::hours(1)).naive_utc(),
        )
        .await
        .unwrap();

        let removed = clean_expired_sessions(&test_db.pool).await.unwrap();
        assert_eq!(removed, 1);

        assert!(get_session_by_token(&test_db.pool, &expired_token)
            .await
            .is_err());
        assert!(get_session_by_token(&test_db.pool, &live_token)
            .await
            .is_ok());
    }
}
