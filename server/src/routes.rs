use std::sync::Arc;

use log::{error, Logger};
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, with_status, Json, WithStatus};

use crate::errors::BackendError;

pub mod admin;
mod handlers;
mod query;
mod rejection;
mod response;

pub use internal::*;

/// The maximum request body size to accept. This should be enforced by
/// the HTTP gateway, so on the Rust side it’s set to an unreasonably
/// large number.
const MAX_CONTENT_LENGTH: u64 = 2 * 1024 * 1024 * 1024;

pub async fn format_rejection(
    logger: Arc<Logger>,
    rej: reject::Rejection,
) -> Result<WithStatus<Json>, reject::Rejection> {
    if let Some(r) = rej.find::<rejection::Rejection>() {
        let e = &r.error;
        error!(logger, "Backend error"; "context" => ?r.context, "error" => ?r.error, "status" => %status_code_for(e), "message" => %r.error);
        let flattened = r.flatten();

        return Ok(with_status(json(&flattened), status_code_for(e)));
    }

    if let Some(e) = rej.find::<warp::filters::body::BodyDeserializeError>() {
        error!(logger, "Malformed request body"; "error" => %e);
        let flattened = rejection::FlattenedRejection {
            context: rejection::Context::body(),
            message: format!("{}", e),
        };

        return Ok(with_status(json(&flattened), StatusCode::BAD_REQUEST));
    }

    Err(rej)
}

fn status_code_for(e: &BackendError) -> StatusCode {
    use BackendError::*;

    match e {
        MissingField { .. } | InvalidMediaName { .. } => StatusCode::BAD_REQUEST,
        InterviewNotFound { .. } | SubmissionNotFound { .. } | MediaNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        Unauthorized | InvalidToken => StatusCode::UNAUTHORIZED,
        Forbidden => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

mod internal {
    use warp::filters::{body, header};
    use warp::filters::BoxedFilter;
    use warp::path::end;
    use warp::Filter;
    use warp::Reply;
    use warp::{get as g, path as p, path::param as par, post, query};

    use super::{handlers, query as q, MAX_CONTENT_LENGTH};
    use crate::environment::Environment;

    pub(crate) const SUBMISSIONS_PATH: &str = "submissions";
    pub(crate) const INTERVIEWS_PATH: &str = "interviews";

    type Route = BoxedFilter<(Box<dyn Reply>,)>;

    macro_rules! route_filter {
    ($route_variable:ident; $first:expr) => (let $route_variable = $route_variable.and($first););
    ($route_variable:ident; $first:expr, $($rest:expr),+) => (
        let $route_variable = $route_variable.and($first);
        route_filter!($route_variable; $($rest),+);
    )
}

    macro_rules! route {
    ($name:ident => $handler:ident, $route_variable:ident; $($filters:expr),+) => (
        pub fn $name<O: Clone + Send + Sync + 'static>(environment: Environment<O>) -> Route {
            let $route_variable = warp::any()
                .map(move || environment.clone());

            route_filter!($route_variable; $($filters),+);

            $route_variable.and_then(handlers::$handler)
                .boxed()
        }
    );
}

    route!(make_submit_route => submit, rt; p(SUBMISSIONS_PATH), end(), post(), body::content_length_limit(MAX_CONTENT_LENGTH), body::json());
    route!(make_submissions_route => submissions, rt; p(SUBMISSIONS_PATH), query::<q::SubmissionsQuery>(), end(), g(), header::optional::<String>("authorization"));
    route!(make_create_interview_route => create_interview, rt; p(INTERVIEWS_PATH), end(), post(), header::optional::<String>("authorization"), body::content_length_limit(MAX_CONTENT_LENGTH), body::json());
    route!(make_interview_count_route => interview_count, rt; p(INTERVIEWS_PATH), p("count"), end(), g(), header::optional::<String>("authorization"));
    route!(make_interview_route => interview, rt; p(INTERVIEWS_PATH), par::<String>(), end(), g());

    // the media prefix is configured, so this route can’t go through
    // the macro
    pub fn make_media_route<O: Clone + Send + Sync + 'static>(environment: Environment<O>) -> Route {
        let m = environment.urls.media_path.clone();

        warp::any()
            .map(move || environment.clone())
            .and(p(m))
            .and(g())
            .and(warp::path::tail())
            .and_then(handlers::media)
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use time::OffsetDateTime;
    use warp::http::StatusCode;
    use warp::Filter;

    use super::{
        format_rejection, make_media_route, make_submissions_route, make_submit_route,
    };
    use crate::auth::StaticVerifier;
    use crate::db::{Db, FsDb};
    use crate::environment::Environment;
    use crate::interview::InterviewRecord;
    use crate::store::mock::MockStore;
    use crate::urls::Urls;

    struct Fixture {
        environment: Environment<()>,
        store: Arc<MockStore>,
        // owns the record directory for the lifetime of the test
        _dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().expect("create temporary directory");
        let db = Arc::new(FsDb::create(dir.path().to_path_buf()).expect("create record store"));
        let store = Arc::new(MockStore::default());

        let mut tokens = HashMap::new();
        tokens.insert("token-a".to_owned(), "user-a".to_owned());

        db.insert_interview(InterviewRecord {
            id: "iv1".to_owned(),
            position: "Engineer".to_owned(),
            description: String::new(),
            types: String::new(),
            duration: String::new(),
            user_id: "user-a".to_owned(),
            questions: vec![],
            created_at: OffsetDateTime::now_utc(),
        })
        .await
        .expect("insert interview");

        let environment = Environment::new(
            Arc::new(log::initialize_logger()),
            db,
            Arc::new(Urls::new("http://localhost:8080/", "media")),
            store.clone(),
            Arc::new(StaticVerifier { tokens }),
        );

        Fixture {
            environment,
            store,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn submitting_stores_each_recording() {
        let fixture = fixture().await;
        let filter = make_submit_route(fixture.environment.clone());

        let data_url = format!("data:video/webm;base64,{}", STANDARD.encode(b"clip bytes"));
        let response = warp::test::request()
            .method("POST")
            .path("/submissions")
            .json(&serde_json::json!({
                "interviewId": "iv1",
                "candidateName": "Jane Doe",
                "candidateEmail": "jane@example.com",
                "recordings": [data_url, null, ""],
                "answers": [{ "recordingIndex": 0, "question": "Why Rust?" }]
            }))
            .reply(&filter)
            .await;

        assert_eq!(response.status(), StatusCode::CREATED);

        let map = fixture.store.map.read().expect("mock store lock");
        assert_eq!(map.len(), 1);

        let (name, raw) = map.iter().next().expect("stored object");
        assert!(name.starts_with("video-iv1-"));
        assert!(name.ends_with("-q0.webm"));
        assert_eq!(raw, b"clip bytes");
    }

    #[tokio::test]
    async fn submitting_requires_identity_fields() {
        let fixture = fixture().await;
        let logger = fixture.environment.logger.clone();
        let filter = make_submit_route(fixture.environment.clone())
            .recover(move |r| format_rejection(logger.clone(), r));

        let response = warp::test::request()
            .method("POST")
            .path("/submissions")
            .json(&serde_json::json!({
                "interviewId": "iv1",
                "candidateEmail": "jane@example.com",
                "recordings": []
            }))
            .reply(&filter)
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(fixture
            .store
            .map
            .read()
            .expect("mock store lock")
            .is_empty());
    }

    #[tokio::test]
    async fn listing_requires_a_credential() {
        let fixture = fixture().await;
        let logger = fixture.environment.logger.clone();
        let filter = make_submissions_route(fixture.environment.clone())
            .recover(move |r| format_rejection(logger.clone(), r));

        let response = warp::test::request()
            .path("/submissions")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = warp::test::request()
            .path("/submissions")
            .header("authorization", "Bearer nope")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = warp::test::request()
            .path("/submissions")
            .header("authorization", "Bearer token-a")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn media_objects_are_served_with_headers() {
        let fixture = fixture().await;
        fixture
            .store
            .map
            .write()
            .expect("mock store lock")
            .insert("video-iv1-1-q0.webm".to_owned(), b"clip bytes".to_vec());

        let filter = make_media_route(fixture.environment.clone());

        let response = warp::test::request()
            .path("/media/video-iv1-1-q0.webm")
            .reply(&filter)
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), b"clip bytes");
        assert_eq!(
            response.headers()["content-type"],
            "video/webm"
        );
        assert_eq!(
            response.headers()["cache-control"],
            "public, max-age=31536000"
        );
    }

    #[tokio::test]
    async fn media_names_escaping_the_store_are_rejected() {
        let fixture = fixture().await;
        let logger = fixture.environment.logger.clone();
        let filter = make_media_route(fixture.environment.clone())
            .recover(move |r| format_rejection(logger.clone(), r));

        let response = warp::test::request()
            .path("/media/../../etc/passwd")
            .reply(&filter)
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
