//! Server-side view of the embedded video player's event stream.
//!
//! The client polls the embed once a second and forwards
//! `{state, time, duration}` events. One `PlaybackSession` exists per
//! (user, course) pair; its latch guarantees the `Ended` transition triggers
//! course completion exactly once per viewing, however many times the embed
//! re-fires the event. Sessions are dropped on sign-out and when the viewer
//! leaves the course.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    Playing,
    Paused,
    Ended,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PlayerEvent {
    pub state: PlayerState,
    /// Current playback position, seconds.
    pub time: f64,
    /// Total video length, seconds.
    pub duration: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlaybackSession {
    pub progress_percent: f64,
    pub playing: bool,
    completed: bool,
}

impl PlaybackSession {
    /// Folds one player event into the session. Returns true when this event
    /// is the completion trigger for the viewing.
    fn observe(&mut self, event: PlayerEvent) -> bool {
        if event.duration > 0.0 {
            self.progress_percent = ((event.time / event.duration) * 100.0).min(100.0);
        }

        match event.state {
            PlayerState::Playing => {
                self.playing = true;
                false
            }
            PlayerState::Paused => {
                self.playing = false;
                false
            }
            PlayerState::Ended => {
                self.playing = false;
                self.progress_percent = 100.0;
                if self.completed {
                    // Latched: the embed re-fired `ended` within one viewing.
                    false
                } else {
                    self.completed = true;
                    true
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackUpdate {
    pub progress_percent: f64,
    pub playing: bool,
    pub completion_triggered: bool,
}

/// Rocket-managed registry of live playback sessions.
#[derive(Default)]
pub struct PlaybackTracker {
    sessions: Mutex<HashMap<(i64, String), PlaybackSession>>,
}

impl PlaybackTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn observe(&self, user_id: i64, course_id: &str, event: PlayerEvent) -> PlaybackUpdate {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .entry((user_id, course_id.to_string()))
            .or_default();
        let completion_triggered = session.observe(event);

        PlaybackUpdate {
            progress_percent: session.progress_percent,
            playing: session.playing,
            completion_triggered,
        }
    }

    /// Drops the session for one course, returning the viewer to the catalog.
    pub async fn clear_course(&self, user_id: i64, course_id: &str) {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(&(user_id, course_id.to_string()));
    }

    /// Sign-out teardown: every session the user still holds is dropped so no
    /// poll state leaks across sign-ins.
    pub async fn clear_user(&self, user_id: i64) {
        let mut sessions = self.sessions.lock().await;
        sessions.retain(|(owner, _), _| *owner != user_id);
    }

    #[cfg(test)]
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
