use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn, Logger};
use time::OffsetDateTime;
use uuid::Uuid;
use warp::{
    http::{Response, StatusCode},
    reject,
    reply::{json, with_header, with_status, Json, Reply, WithStatus},
};

use crate::auth::{self, Verifier};
use crate::db::Db;
use crate::environment::{Environment, SafeStore, VecStore};
use crate::errors::BackendError;
use crate::interview::{InterviewRecord, NewInterview};
use crate::media;
use crate::routes::{
    query::SubmissionsQuery,
    rejection::{Context, Rejection},
    response::SuccessResponse,
};
use crate::submission::{
    self, Candidate, NewSubmission, SubmissionRecord, SubmissionStatus, SubmissionSummary,
};
use crate::urls::Urls;

const SERVER_TIMING_HEADER: &str = "server-timing";
type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;

macro_rules! timed {
    ($($expression:stmt);+) => {
        let start = Instant::now();

        // TODO when `try` blocks are stabilized, we can wrap the body
        // and return the headers even on errors
        let result = { $($expression)+ };

        Ok(Box::new(with_header(
            result,
            SERVER_TIMING_HEADER,
            format_server_timing(start.elapsed()),
        )) as Box<dyn Reply>)
    };
}

pub async fn submit<O: SafeStore + 'static>(
    environment: Environment<O>,
    body: NewSubmission,
) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::submit(None), e);

        body.validate().map_err(error_handler)?;

        let NewSubmission {
            interview_id,
            candidate_name,
            candidate_email,
            candidate_phone,
            recordings,
            answers,
        } = body;

        debug!(environment.logger, "Resolving interview..."; "interview_id" => &interview_id);
        let interview = resolve_interview(
            environment.logger.clone(),
            environment.db.clone(),
            &interview_id,
        )
        .await
        .map_err(error_handler)?;

        let submitted_at = OffsetDateTime::now_utc();
        let id = submission::generate_id(&interview_id, submitted_at);

        let error_handler = |e: BackendError| Rejection::new(Context::submit(Some(id.clone())), e);

        debug!(environment.logger, "Storing recordings..."; "id" => &id, "count" => recordings.len());
        let video_file_paths = store_media(
            environment.store.clone(),
            environment.urls.clone(),
            &id,
            recordings,
        )
        .await
        .map_err(&error_handler)?;

        let answers = submission::bind_answers(answers, &video_file_paths);

        let record = SubmissionRecord {
            id: id.clone(),
            interview_id,
            user_id: interview.user_id.clone(),
            original_interview: interview,
            candidate: Candidate {
                name: candidate_name,
                email: candidate_email,
                phone: candidate_phone.unwrap_or_default(),
            },
            video_file_paths,
            answers,
            submitted_at,
            status: SubmissionStatus::Completed,
        };

        debug!(environment.logger, "Writing submission record..."; "id" => &id);
        environment
            .db
            .insert_submission(record)
            .await
            .map_err(&error_handler)?;

        info!(environment.logger, "Stored submission"; "id" => &id);

        with_status(
            json(&SuccessResponse::Submit {
                success: true,
                message: "Interview submitted successfully",
            }),
            StatusCode::CREATED,
        )
    }
}

pub async fn submissions<O: SafeStore>(
    environment: Environment<O>,
    query: SubmissionsQuery,
    authorization: Option<String>,
) -> RouteResult {
    timed! {
        let user_id = auth::authenticate(environment.verifier.as_ref(), authorization)
            .await
            .map_err(|e| Rejection::new(Context::submissions(), e))?;

        match query.id {
            Some(id) => retrieve_submission(environment, user_id, id).await?,
            None => list_submissions(environment, user_id).await?,
        }
    }
}

pub async fn media<O: SafeStore>(environment: Environment<O>, tail: warp::path::Tail) -> RouteResult {
    timed! {
        let name = tail.as_str().to_owned();
        let error_handler = |e: BackendError| Rejection::new(Context::media(name.clone()), e);

        media::validate_object_name(&name).map_err(&error_handler)?;

        debug!(environment.logger, "Serving media..."; "name" => &name);
        let raw = environment.store.load(&name).await.map_err(&error_handler)?;

        build_media_response(&name, raw).map_err(&error_handler)?
    }
}

pub async fn create_interview<O: SafeStore>(
    environment: Environment<O>,
    authorization: Option<String>,
    body: NewInterview,
) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::create_interview(), e);

        let verified = verify_optional(
            environment.logger.clone(),
            environment.verifier.clone(),
            authorization,
        )
        .await;

        // fall back to the client-supplied owner when no credential
        // verifies
        let user_id = verified.or_else(|| body.user_id.clone()).unwrap_or_default();

        let is_first_interview = first_interview(environment.db.clone(), &user_id)
            .await
            .map_err(&error_handler)?;

        let id = Uuid::new_v4().to_string();
        let record = body.into_record(id.clone(), user_id, OffsetDateTime::now_utc());

        environment
            .db
            .insert_interview(record)
            .await
            .map_err(&error_handler)?;

        info!(environment.logger, "Created interview"; "id" => &id);

        let url = environment.urls.interview(&id);

        with_status(
            json(&SuccessResponse::InterviewCreated {
                id,
                is_first_interview,
                url: url.to_string(),
            }),
            StatusCode::CREATED,
        )
    }
}

pub async fn interview<O: SafeStore>(environment: Environment<O>, id: String) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::interview(id.clone()), e);

        debug!(environment.logger, "Retrieving interview..."; "id" => &id);
        let option = environment
            .db
            .retrieve_interview(&id)
            .await
            .map_err(&error_handler)?;

        // an interview without questions is unusable, so it’s treated
        // as absent
        match option.filter(|record| !record.questions.is_empty()) {
            Some(record) => with_status(
                json(&SuccessResponse::Interview {
                    questions: record.questions,
                }),
                StatusCode::OK,
            ),
            None => with_status(json(&()), StatusCode::NOT_FOUND),
        }
    }
}

pub async fn interview_count<O: SafeStore>(
    environment: Environment<O>,
    authorization: Option<String>,
) -> RouteResult {
    timed! {
        let error_handler = |e: BackendError| Rejection::new(Context::interview_count(), e);

        let user_id = auth::authenticate(environment.verifier.as_ref(), authorization)
            .await
            .map_err(&error_handler)?;

        let count = environment
            .db
            .count_interviews(&user_id)
            .await
            .map_err(&error_handler)?;

        json(&SuccessResponse::Count { count })
    }
}

async fn resolve_interview(
    logger: Arc<Logger>,
    db: Arc<dyn Db + Send + Sync>,
    id: &str,
) -> Result<InterviewRecord, BackendError> {
    let interview = db
        .retrieve_interview(id)
        .await?
        .ok_or_else(|| BackendError::InterviewNotFound { id: id.to_owned() })?;

    if interview.user_id.is_empty() {
        warn!(logger, "Interview has no owner; submission will not appear in any listing"; "id" => id.to_owned());
    }

    Ok(interview)
}

async fn store_media<O: Clone + Send + Sync>(
    store: Arc<VecStore<O>>,
    urls: Arc<Urls>,
    submission_id: &str,
    recordings: Vec<Option<String>>,
) -> Result<Vec<Option<String>>, BackendError> {
    let mut media_paths = vec![];

    for (index, recording) in recordings.into_iter().enumerate() {
        match recording {
            Some(data_url) if !data_url.is_empty() => {
                let raw = media::decode_data_url(&data_url)
                    .map_err(|source| BackendError::MediaDecode { index, source })?;
                let name = media::object_name(submission_id, index);

                store.save(&name, raw).await?;
                media_paths.push(Some(urls.media_ref(&name)));
            }
            // an empty entry, like a null one, marks a skipped question
            _ => media_paths.push(None),
        }
    }

    Ok(media_paths)
}

async fn retrieve_submission<O: SafeStore>(
    environment: Environment<O>,
    user_id: String,
    id: String,
) -> Result<WithStatus<Json>, reject::Rejection> {
    let error_handler = |e: BackendError| Rejection::new(Context::submission(id.clone()), e);

    let record = environment
        .db
        .retrieve_submission(&id)
        .await
        .map_err(&error_handler)?
        .ok_or_else(|| error_handler(BackendError::SubmissionNotFound { id: id.clone() }))?;

    // ownership is anchored to the interview as it was at submission
    // time
    if record.original_interview.user_id != user_id {
        return Err(error_handler(BackendError::Forbidden).into());
    }

    Ok(with_status(
        json(&SuccessResponse::Submission { submission: record }),
        StatusCode::OK,
    ))
}

async fn list_submissions<O: SafeStore>(
    environment: Environment<O>,
    user_id: String,
) -> Result<WithStatus<Json>, reject::Rejection> {
    let mut records = environment
        .db
        .list_submissions()
        .await
        .map_err(|e| Rejection::new(Context::submissions(), e))?;

    records.retain(|record| record.original_interview.user_id == user_id);
    records.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));

    let submissions: Vec<SubmissionSummary> =
        records.iter().map(SubmissionSummary::from).collect();

    Ok(with_status(
        json(&SuccessResponse::Submissions { submissions }),
        StatusCode::OK,
    ))
}

async fn verify_optional(
    logger: Arc<Logger>,
    verifier: Arc<dyn Verifier>,
    header: Option<String>,
) -> Option<String> {
    let header = header?;
    let token = header.strip_prefix("Bearer ")?;

    match verifier.verify(token).await {
        Ok(user_id) => Some(user_id),
        Err(e) => {
            warn!(logger, "Ignoring unverifiable credential: {}", e);
            None
        }
    }
}

async fn first_interview(
    db: Arc<dyn Db + Send + Sync>,
    user_id: &str,
) -> Result<bool, BackendError> {
    // anonymous owners can’t be counted, so each of their interviews
    // presents as the first
    if user_id.is_empty() {
        return Ok(true);
    }

    Ok(db.count_interviews(user_id).await? == 0)
}

fn build_media_response(name: &str, raw: Vec<u8>) -> Result<Response<Vec<u8>>, BackendError> {
    Response::builder()
        .header("content-type", media::MEDIA_TYPE.as_ref())
        .header(
            "content-disposition",
            format!("inline; filename=\"{}\"", name),
        )
        .header("cache-control", media::MEDIA_CACHE_CONTROL)
        .body(raw)
        .map_err(|source| BackendError::MediaResponse { source })
}

fn format_server_timing(seconds: Duration) -> String {
    format!("handler;dur={}", seconds.as_secs_f64() * 1000.0)
}
