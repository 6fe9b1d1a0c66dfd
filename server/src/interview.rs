use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::normalization;

/// The difficulty assigned to a question.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Medium
    }
}

/// One question in an interview. Order is significant: answers bind to
/// questions by index.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub question: String,

    /// Expected answer length, in minutes.
    #[serde(default)]
    pub expected_duration: u32,

    #[serde(default)]
    pub difficulty: Difficulty,
}

/// A persisted interview definition. Written once at creation, never
/// mutated; each submission embeds a copy of it.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewRecord {
    /// The ID of the interview.
    pub id: String,

    /// The position being interviewed for.
    pub position: String,

    /// The free-text description provided at creation.
    pub description: String,

    /// The kinds of questions requested.
    pub types: String,

    /// The overall duration requested.
    pub duration: String,

    /// The id of the creating user. Empty when the interview was
    /// created without an authenticated user.
    #[serde(default)]
    pub user_id: String,

    /// The questions, in presentation order.
    pub questions: Vec<Question>,

    /// The date and time it was created.
    #[serde(with = "time::serde::timestamp")]
    pub created_at: OffsetDateTime,
}

/// The body of an interview-creation request.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInterview {
    #[serde(default, deserialize_with = "normalization::deserialize_option")]
    pub position: Option<String>,

    #[serde(default, deserialize_with = "normalization::deserialize_option")]
    pub description: Option<String>,

    #[serde(default)]
    pub types: Option<String>,

    #[serde(default)]
    pub duration: Option<String>,

    /// The questions to publish. May be empty; must be present.
    pub questions: Vec<Question>,

    /// A client-supplied owner id, used only when no credential is
    /// presented or the presented one cannot be verified.
    #[serde(default)]
    pub user_id: Option<String>,
}

impl NewInterview {
    /// Builds the persistent record, filling the defaults the
    /// client-facing API tolerates.
    pub fn into_record(self, id: String, user_id: String, created_at: OffsetDateTime) -> InterviewRecord {
        InterviewRecord {
            id,
            position: self.position.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            types: self.types.unwrap_or_default(),
            duration: self.duration.unwrap_or_default(),
            user_id,
            questions: self.questions,
            created_at,
        }
    }
}
