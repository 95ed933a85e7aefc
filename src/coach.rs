//! AI coaching pass-through
//!
//! A stateless request/response client for the hosted coaching gateway. It
//! sends a structured snapshot of the user's current entities plus a mode
//! selector and returns either suggested task stubs or free text. The sync
//! layer treats this as a side collaborator; nothing here participates in
//! the sync model.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::BackendError;
use crate::models::Priority;
use crate::store::AppState;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// What the user is asking the coach for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoachMode {
    Suggest,
    Analyze,
    Chat,
}

/// Compact snapshot of the user's entities sent with every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachSnapshot {
    pub open_tasks: Vec<String>,
    pub habits: Vec<HabitSummary>,
    pub goals: Vec<GoalSummary>,
    pub points: u32,
    pub level: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitSummary {
    pub title: String,
    pub current_streak: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalSummary {
    pub title: String,
    pub progress: u8,
}

impl CoachSnapshot {
    pub fn of(state: &AppState) -> Self {
        Self {
            open_tasks: state
                .tasks
                .iter()
                .filter(|t| !t.completed)
                .map(|t| t.title.clone())
                .collect(),
            habits: state
                .habits
                .iter()
                .filter(|h| h.active)
                .map(|h| HabitSummary {
                    title: h.title.clone(),
                    current_streak: h.current_streak,
                })
                .collect(),
            goals: state
                .goals
                .iter()
                .map(|g| GoalSummary {
                    title: g.title.clone(),
                    progress: g.progress,
                })
                .collect(),
            points: state.profile.points,
            level: state.profile.level,
        }
    }
}

/// A task stub suggested by the coach.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSuggestion {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub reward_points: u32,
}

/// Coach response; the variant follows the requested mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoachReply {
    Suggestions { tasks: Vec<TaskSuggestion> },
    Analysis { text: String },
    Chat { text: String },
}

#[derive(Debug, Serialize)]
struct CoachRequest<'a> {
    mode: CoachMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    snapshot: &'a CoachSnapshot,
}

/// Client for the hosted coaching gateway.
#[derive(Debug, Clone)]
pub struct CoachClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl CoachClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(BackendError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// One stateless round trip; `message` is only meaningful in chat mode.
    pub async fn request(
        &self,
        mode: CoachMode,
        message: Option<&str>,
        snapshot: &CoachSnapshot,
    ) -> Result<CoachReply, BackendError> {
        let response = self
            .client
            .post(format!("{}/api/v1/coach", self.base_url))
            .bearer_auth(&self.token)
            .json(&CoachRequest {
                mode,
                message,
                snapshot,
            })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::OK {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(BackendError::api(status.as_u16(), body))
        }
    }
}
