use serde::Serialize;

use crate::interview::Question;
use crate::submission::{SubmissionRecord, SubmissionSummary};

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SuccessResponse<'a> {
    Count {
        count: i64,
    },
    Healthz {
        revision: Option<&'a str>,
        timestamp: Option<&'a str>,
        version: &'a str,
    },
    Interview {
        questions: Vec<Question>,
    },
    #[serde(rename_all = "camelCase")]
    InterviewCreated {
        id: String,
        is_first_interview: bool,
        url: String,
    },
    Submission {
        submission: SubmissionRecord,
    },
    Submissions {
        submissions: Vec<SubmissionSummary>,
    },
    Submit {
        success: bool,
        message: &'a str,
    },
}
