use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::errors::BackendError;
use crate::interview::InterviewRecord;
use crate::normalization;

/// Candidate contact details captured with a submission.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Candidate {
    pub name: String,

    pub email: String,

    /// Empty when the candidate provided no phone number.
    #[serde(default)]
    pub phone: String,
}

/// One answered question, bound to its recording by index.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub question: String,

    /// Index into the submission's recording list.
    pub recording_index: usize,

    /// The stored media reference, or `None` when the question was
    /// skipped or the index points outside the recording list.
    pub video_path: Option<String>,
}

/// An answer as it arrives in a submission request, before its media
/// reference is resolved.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerInput {
    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub question: String,

    pub recording_index: usize,
}

/// The terminal state of a submission. There are no partial or draft
/// states: ingestion either completes or leaves no record.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Completed,
}

/// A persisted candidate submission. Embeds the interview as it
/// existed at submission time; that copy, not the live interview
/// record, anchors ownership checks on later reads.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    /// The ID of the submission.
    pub id: String,

    /// The ID of the originating interview.
    pub interview_id: String,

    /// Copied from the owning interview at submission time.
    #[serde(default)]
    pub user_id: String,

    /// The interview as it existed when the candidate submitted.
    pub original_interview: InterviewRecord,

    pub candidate: Candidate,

    /// One entry per received recording, order preserved; `None` marks
    /// a skipped question.
    pub video_file_paths: Vec<Option<String>>,

    pub answers: Vec<Answer>,

    /// The date and time it was submitted.
    #[serde(with = "time::serde::timestamp")]
    pub submitted_at: OffsetDateTime,

    pub status: SubmissionStatus,
}

/// The projection of a submission returned by listings.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSummary {
    pub id: String,

    pub interview_id: String,

    pub candidate_name: String,

    pub candidate_email: String,

    pub candidate_phone: String,

    pub position: String,

    #[serde(with = "time::serde::timestamp")]
    pub submitted_at: OffsetDateTime,

    pub status: SubmissionStatus,
}

impl From<&SubmissionRecord> for SubmissionSummary {
    fn from(record: &SubmissionRecord) -> Self {
        SubmissionSummary {
            id: record.id.clone(),
            interview_id: record.interview_id.clone(),
            candidate_name: record.candidate.name.clone(),
            candidate_email: record.candidate.email.clone(),
            candidate_phone: record.candidate.phone.clone(),
            position: record.original_interview.position.clone(),
            submitted_at: record.submitted_at,
            status: record.status,
        }
    }
}

/// The body of a submission request.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubmission {
    #[serde(default)]
    pub interview_id: String,

    #[serde(default, deserialize_with = "normalization::deserialize")]
    pub candidate_name: String,

    #[serde(default, deserialize_with = "normalization::deserialize")]
    pub candidate_email: String,

    #[serde(default, deserialize_with = "normalization::deserialize_option")]
    pub candidate_phone: Option<String>,

    /// One entry per question, in order; `None` for skipped questions.
    pub recordings: Vec<Option<String>>,

    #[serde(default)]
    pub answers: Vec<AnswerInput>,
}

impl NewSubmission {
    /// Checks the fields the pipeline cannot proceed without.
    pub fn validate(&self) -> Result<(), BackendError> {
        if self.interview_id.is_empty() {
            return Err(BackendError::MissingField {
                field: "interviewId",
            });
        }

        if self.candidate_name.is_empty() {
            return Err(BackendError::MissingField {
                field: "candidateName",
            });
        }

        if self.candidate_email.is_empty() {
            return Err(BackendError::MissingField {
                field: "candidateEmail",
            });
        }

        Ok(())
    }
}

/// Generates the id for a new submission from its interview and the
/// submission time. Two submissions to the same interview within one
/// millisecond would collide; this design accepts that window.
pub fn generate_id(interview_id: &str, at: OffsetDateTime) -> String {
    let millis = at.unix_timestamp() * 1_000 + i64::from(at.millisecond());

    format!("{}-{}", interview_id, millis)
}

/// Pairs each answer with the media reference at its declared index.
// TODO consider rejecting out-of-range indices instead of nulling them
pub fn bind_answers(answers: Vec<AnswerInput>, media_paths: &[Option<String>]) -> Vec<Answer> {
    answers
        .into_iter()
        .map(|answer| {
            let video_path = media_paths.get(answer.recording_index).cloned().flatten();

            Answer {
                category: answer.category,
                question: answer.question,
                recording_index: answer.recording_index,
                video_path,
            }
        })
        .collect()
}
