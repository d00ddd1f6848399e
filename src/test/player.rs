#[cfg(test)]
mod tests {
    use crate::player::{PlaybackTracker, PlayerEvent, PlayerState};
    use crate::test::test_utils::{
        STANDARD_PASSWORD, TestDbBuilder, create_standard_test_db, login_test_user,
        setup_test_client,
    };
    use rocket::http::{ContentType, Status};
    use serde_json::json;

    fn event(state: PlayerState, time: f64, duration: f64) -> PlayerEvent {
        PlayerEvent {
            state,
            time,
            duration,
        }
    }

    #[tokio::test]
    async fn test_playing_and_paused_never_trigger_completion() {
        let tracker = PlaybackTracker::new();

        let update = tracker
            .observe(1, "1", event(PlayerState::Playing, 30.0, 600.0))
            .await;
        assert!(update.playing);
        assert!(!update.completion_triggered);
        assert!((update.progress_percent - 5.0).abs() < 1e-9);

        let update = tracker
            .observe(1, "1", event(PlayerState::Paused, 60.0, 600.0))
            .await;
        assert!(!update.playing);
        assert!(!update.completion_triggered);
        assert!((update.progress_percent - 10.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_ended_triggers_completion_exactly_once() {
        let tracker = PlaybackTracker::new();

        let update = tracker
            .observe(1, "1", event(PlayerState::Ended, 600.0, 600.0))
            .await;
        assert!(update.completion_triggered);
        assert_eq!(update.progress_percent, 100.0);
        assert!(!update.playing);

        // The embed re-fires `ended` every poll cycle; the latch swallows
        // every repeat within the viewing.
        for _ in 0..5 {
            let update = tracker
                .observe(1, "1", event(PlayerState::Ended, 600.0, 600.0))
                .await;
            assert!(!update.completion_triggered);
        }
    }

    #[tokio::test]
    async fn test_leaving_the_course_rearms_the_latch() {
        let tracker = PlaybackTracker::new();

        let update = tracker
            .observe(1, "1", event(PlayerState::Ended, 600.0, 600.0))
            .await;
        assert!(update.completion_triggered);

        tracker.clear_course(1, "1").await;

        // A fresh viewing gets a fresh session.
        let update = tracker
            .observe(1, "1", event(PlayerState::Ended, 600.0, 600.0))
            .await;
        assert!(update.completion_triggered);
    }

    #[tokio::test]
    async fn test_progress_percent_is_clamped() {
        let tracker = PlaybackTracker::new();

        let update = tracker
            .observe(1, "1", event(PlayerState::Playing, 700.0, 600.0))
            .await;
        assert_eq!(update.progress_percent, 100.0);

        // Zero duration means the embed has not reported length yet.
        let update = tracker
            .observe(1, "2", event(PlayerState::Playing, 30.0, 0.0))
            .await;
        assert_eq!(update.progress_percent, 0.0);
    }

    #[tokio::test]
    async fn test_sessions_are_keyed_per_user_and_course() {
        let tracker = PlaybackTracker::new();

        tracker
            .observe(1, "1", event(PlayerState::Ended, 600.0, 600.0))
            .await;

        // Another user and another course still have their own latches.
        let update = tracker
            .observe(2, "1", event(PlayerState::Ended, 600.0, 600.0))
            .await;
        assert!(update.completion_triggered);

        let update = tracker
            .observe(1, "2", event(PlayerState::Ended, 600.0, 600.0))
            .await;
        assert!(update.completion_triggered);

        assert_eq!(tracker.session_count().await, 3);
    }

    #[tokio::test]
    async fn test_clear_user_drops_only_that_users_sessions() {
        let tracker = PlaybackTracker::new();

        tracker
            .observe(1, "1", event(PlayerState::Playing, 10.0, 600.0))
            .await;
        tracker
            .observe(1, "2", event(PlayerState::Playing, 10.0, 600.0))
            .await;
        tracker
            .observe(2, "1", event(PlayerState::Playing, 10.0, 600.0))
            .await;

        tracker.clear_user(1).await;

        assert_eq!(tracker.session_count().await, 1);
    }

    #[rocket::async_test]
    async fn test_player_event_api_completes_course_on_ended() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let cookies = login_test_user(&client, "student@portal.com", STANDARD_PASSWORD).await;

        let response = client
            .post("/api/course/1/player")
            .header(ContentType::JSON)
            .cookies(cookies)
            .body(json!({ "state": "playing", "time": 30.0, "duration": 900.0 }).to_string())
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap();
        let update: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(!update["completionTriggered"].as_bool().unwrap());
        assert!(update["user"].is_null());

        let response = client
            .post("/api/course/1/player")
            .header(ContentType::JSON)
            .body(json!({ "state": "ended", "time": 900.0, "duration": 900.0 }).to_string())
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap();
        let update: serde_json::Value = serde_json::from_str(&body).unwrap();

        assert!(update["completionTriggered"].as_bool().unwrap());
        let user = &update["user"];
        assert!(user["progress"][0]["completed"].as_bool().unwrap());
        assert_eq!(user["bonusPoints"].as_i64().unwrap(), 10);

        // The replayed `ended` event changes nothing.
        let response = client
            .post("/api/course/1/player")
            .header(ContentType::JSON)
            .body(json!({ "state": "ended", "time": 900.0, "duration": 900.0 }).to_string())
            .dispatch()
            .await;

        let body = response.into_string().await.unwrap();
        let update: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(!update["completionTriggered"].as_bool().unwrap());
        assert!(update["user"].is_null());
    }

    #[rocket::async_test]
    async fn test_player_event_api_unknown_course() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let cookies = login_test_user(&client, "student@portal.com", STANDARD_PASSWORD).await;

        let response = client
            .post("/api/course/99/player")
            .header(ContentType::JSON)
            .cookies(cookies)
            .body(json!({ "state": "playing", "time": 1.0, "duration": 600.0 }).to_string())
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_leave_course_api_drops_the_session() {
        let test_db = TestDbBuilder::new()
            .student("student@portal.com", "Student User", "12345678901")
            .build()
            .await
            .unwrap();
        let (client, _) = setup_test_client(test_db).await;

        let cookies = login_test_user(&client, "student@portal.com", STANDARD_PASSWORD).await;

        client
            .post("/api/course/1/player")
            .header(ContentType::JSON)
            .cookies(cookies)
            .body(json!({ "state": "ended", "time": 900.0, "duration": 900.0 }).to_string())
            .dispatch()
            .await;

        let response = client.delete("/api/course/1/player").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        // Back into the course: a new viewing can complete again.
        let response = client
            .post("/api/course/1/player")
            .header(ContentType::JSON)
            .body(json!({ "state": "ended", "time": 900.0, "duration": 900.0 }).to_string())
            .dispatch()
            .await;

        let body = response.into_string().await.unwrap();
        let update: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(update["completionTriggered"].as_bool().unwrap());
        assert_eq!(update["user"]["bonusPoints"].as_i64().unwrap(), 20);
    }
}
