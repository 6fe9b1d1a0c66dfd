use serde::Serialize;
use warp::reject;

use crate::errors::BackendError;

#[derive(Debug)]
pub struct Rejection {
    pub(crate) context: Context,
    pub(crate) error: BackendError,
}

impl Rejection {
    pub fn new(context: Context, error: BackendError) -> Self {
        Rejection { context, error }
    }

    pub fn flatten(&self) -> FlattenedRejection {
        FlattenedRejection {
            context: self.context.clone(),
            message: format!("{}", self.error),
        }
    }
}

impl reject::Reject for Rejection {}

#[derive(Debug, Serialize)]
pub struct FlattenedRejection {
    #[serde(flatten)]
    pub(crate) context: Context,
    pub(crate) message: String,
}

// the variants with no fields still use braces so the untagged
// serialization is an empty map, which flattens cleanly
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum Context {
    Body {},
    CreateInterview {},
    Interview {
        id: String,
    },
    InterviewCount {},
    Media {
        name: String,
    },
    Submission {
        id: String,
    },
    Submissions {},
    Submit {
        #[serde(rename = "submissionId")]
        submission_id: Option<String>,
    },
}

impl Context {
    pub fn body() -> Context {
        Context::Body {}
    }

    pub fn create_interview() -> Context {
        Context::CreateInterview {}
    }

    pub fn interview(id: String) -> Context {
        Context::Interview { id }
    }

    pub fn interview_count() -> Context {
        Context::InterviewCount {}
    }

    pub fn media(name: String) -> Context {
        Context::Media { name }
    }

    pub fn submission(id: String) -> Context {
        Context::Submission { id }
    }

    pub fn submissions() -> Context {
        Context::Submissions {}
    }

    pub fn submit(submission_id: Option<String>) -> Context {
        Context::Submit { submission_id }
    }
}
