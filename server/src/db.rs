use futures::future::BoxFuture;

use crate::errors::BackendError;
use crate::interview::InterviewRecord;
use crate::submission::SubmissionRecord;

pub trait Db {
    fn count_interviews(&self, user_id: &str) -> BoxFuture<Result<i64, BackendError>>;

    fn insert_interview(&self, record: InterviewRecord) -> BoxFuture<Result<(), BackendError>>;

    fn insert_submission(&self, record: SubmissionRecord) -> BoxFuture<Result<(), BackendError>>;

    fn list_submissions(&self) -> BoxFuture<Result<Vec<SubmissionRecord>, BackendError>>;

    fn retrieve_interview(
        &self,
        id: &str,
    ) -> BoxFuture<Result<Option<InterviewRecord>, BackendError>>;

    fn retrieve_submission(
        &self,
        id: &str,
    ) -> BoxFuture<Result<Option<SubmissionRecord>, BackendError>>;
}

pub use self::fs::*;

mod fs {
    use std::collections::HashMap;
    use std::fs;
    use std::io::ErrorKind;
    use std::path::{Path, PathBuf};
    use std::sync::RwLock;

    use futures::future::BoxFuture;
    use futures::FutureExt;
    use serde::de::DeserializeOwned;
    use serde::Serialize;

    use crate::errors::BackendError;
    use crate::interview::InterviewRecord;
    use crate::io::write_atomic;
    use crate::submission::SubmissionRecord;

    const INTERVIEW_PREFIX: &str = "interview-";
    const SUBMISSION_PREFIX: &str = "submission-";
    const RECORD_EXTENSION: &str = ".json";
    const SUBMISSIONS_DIR: &str = "submissions";

    /// Record store keeping one JSON file per record, with a
    /// read-through cache of interviews keyed by id. The cache is
    /// unbounded and never invalidated: records are write-once.
    pub struct FsDb {
        root: PathBuf,
        interviews: RwLock<HashMap<String, InterviewRecord>>,
    }

    impl FsDb {
        /// Creates the store, ensuring its directories exist.
        pub fn create(root: impl Into<PathBuf>) -> Result<Self, BackendError> {
            let root = root.into();
            fs::create_dir_all(root.join(SUBMISSIONS_DIR)).map_err(BackendError::storage)?;

            Ok(FsDb {
                root,
                interviews: RwLock::new(HashMap::new()),
            })
        }

        fn interview_path(&self, id: &str) -> PathBuf {
            self.root
                .join(format!("{}{}{}", INTERVIEW_PREFIX, id, RECORD_EXTENSION))
        }

        fn submissions_dir(&self) -> PathBuf {
            self.root.join(SUBMISSIONS_DIR)
        }

        fn submission_path(&self, id: &str) -> PathBuf {
            self.submissions_dir()
                .join(format!("{}{}{}", SUBMISSION_PREFIX, id, RECORD_EXTENSION))
        }
    }

    // ids arrive in request paths and bodies, so they must never be
    // allowed to name a file outside the data directory
    fn id_is_safe(id: &str) -> bool {
        !id.is_empty() && !id.contains('/') && !id.contains('\\') && !id.contains("..")
    }

    fn read_record<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, BackendError> {
        let raw = match fs::read(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(BackendError::storage(source)),
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let record =
            serde_json::from_slice(&raw).map_err(|source| BackendError::BadRecord { name, source })?;

        Ok(Some(record))
    }

    fn write_record<T: Serialize>(path: &Path, record: &T) -> Result<(), BackendError> {
        let raw = serde_json::to_vec_pretty(record)
            .map_err(|source| BackendError::SerializeRecord { source })?;

        write_atomic(path, &raw)
    }

    impl super::Db for FsDb {
        fn count_interviews(&self, user_id: &str) -> BoxFuture<Result<i64, BackendError>> {
            let user_id = user_id.to_owned();

            async move {
                let mut count = 0;

                for entry in fs::read_dir(&self.root).map_err(BackendError::storage)? {
                    let entry = entry.map_err(BackendError::storage)?;
                    let name = entry.file_name().to_string_lossy().into_owned();

                    if !name.starts_with(INTERVIEW_PREFIX) || !name.ends_with(RECORD_EXTENSION) {
                        continue;
                    }

                    // an unreadable record is skipped rather than failing the scan
                    if let Ok(Some(record)) = read_record::<InterviewRecord>(&entry.path()) {
                        if record.user_id == user_id {
                            count += 1;
                        }
                    }
                }

                Ok(count)
            }
            .boxed()
        }

        fn insert_interview(&self, record: InterviewRecord) -> BoxFuture<Result<(), BackendError>> {
            async move {
                write_record(&self.interview_path(&record.id), &record)?;

                self.interviews
                    .write()
                    .expect("interview cache lock")
                    .insert(record.id.clone(), record);

                Ok(())
            }
            .boxed()
        }

        fn insert_submission(&self, record: SubmissionRecord) -> BoxFuture<Result<(), BackendError>> {
            async move { write_record(&self.submission_path(&record.id), &record) }.boxed()
        }

        fn list_submissions(&self) -> BoxFuture<Result<Vec<SubmissionRecord>, BackendError>> {
            async move {
                let mut records = vec![];

                for entry in fs::read_dir(self.submissions_dir()).map_err(BackendError::storage)? {
                    let entry = entry.map_err(BackendError::storage)?;
                    let name = entry.file_name().to_string_lossy().into_owned();

                    if !name.starts_with(SUBMISSION_PREFIX) || !name.ends_with(RECORD_EXTENSION) {
                        continue;
                    }

                    // a record that fails to parse is skipped, not fatal
                    if let Ok(Some(record)) = read_record::<SubmissionRecord>(&entry.path()) {
                        records.push(record);
                    }
                }

                Ok(records)
            }
            .boxed()
        }

        fn retrieve_interview(
            &self,
            id: &str,
        ) -> BoxFuture<Result<Option<InterviewRecord>, BackendError>> {
            let id = id.to_owned();

            async move {
                if !id_is_safe(&id) {
                    return Ok(None);
                }

                if let Some(record) = self
                    .interviews
                    .read()
                    .expect("interview cache lock")
                    .get(&id)
                {
                    return Ok(Some(record.clone()));
                }

                let record = read_record::<InterviewRecord>(&self.interview_path(&id))?;

                if let Some(record) = &record {
                    self.interviews
                        .write()
                        .expect("interview cache lock")
                        .insert(id, record.clone());
                }

                Ok(record)
            }
            .boxed()
        }

        fn retrieve_submission(
            &self,
            id: &str,
        ) -> BoxFuture<Result<Option<SubmissionRecord>, BackendError>> {
            let id = id.to_owned();

            async move {
                if !id_is_safe(&id) {
                    return Ok(None);
                }

                read_record::<SubmissionRecord>(&self.submission_path(&id))
            }
            .boxed()
        }
    }

    #[cfg(test)]
    mod tests {
        use std::fs;

        use time::OffsetDateTime;

        use super::super::Db;
        use super::FsDb;
        use crate::interview::InterviewRecord;
        use crate::submission::{Candidate, SubmissionRecord, SubmissionStatus};

        fn interview(id: &str, user_id: &str) -> InterviewRecord {
            InterviewRecord {
                id: id.to_owned(),
                position: "Engineer".to_owned(),
                description: String::new(),
                types: String::new(),
                duration: String::new(),
                user_id: user_id.to_owned(),
                questions: vec![],
                created_at: OffsetDateTime::now_utc(),
            }
        }

        fn submission(id: &str, interview_id: &str, user_id: &str) -> SubmissionRecord {
            SubmissionRecord {
                id: id.to_owned(),
                interview_id: interview_id.to_owned(),
                user_id: user_id.to_owned(),
                original_interview: interview(interview_id, user_id),
                candidate: Candidate {
                    name: "Jane Doe".to_owned(),
                    email: "jane@x.com".to_owned(),
                    phone: String::new(),
                },
                video_file_paths: vec![],
                answers: vec![],
                submitted_at: OffsetDateTime::now_utc(),
                status: SubmissionStatus::Completed,
            }
        }

        #[tokio::test]
        async fn interviews_round_trip() {
            let dir = tempfile::tempdir().expect("create temporary directory");
            let db = FsDb::create(dir.path().to_path_buf()).expect("create record store");

            db.insert_interview(interview("iv1", "user-a"))
                .await
                .expect("insert interview");

            let record = db
                .retrieve_interview("iv1")
                .await
                .expect("retrieve interview")
                .expect("interview exists");
            assert_eq!(record.user_id, "user-a");

            assert!(db
                .retrieve_interview("missing")
                .await
                .expect("retrieve missing interview")
                .is_none());
        }

        #[tokio::test]
        async fn interview_reads_populate_the_cache() {
            let dir = tempfile::tempdir().expect("create temporary directory");

            {
                let db = FsDb::create(dir.path().to_path_buf()).expect("create record store");
                db.insert_interview(interview("iv1", "user-a"))
                    .await
                    .expect("insert interview");
            }

            // a fresh instance starts with an empty cache
            let db = FsDb::create(dir.path().to_path_buf()).expect("recreate record store");
            assert!(db
                .retrieve_interview("iv1")
                .await
                .expect("retrieve interview")
                .is_some());

            // once cached, the record survives removal of the backing file
            fs::remove_file(dir.path().join("interview-iv1.json")).expect("remove record file");
            assert!(db
                .retrieve_interview("iv1")
                .await
                .expect("retrieve cached interview")
                .is_some());
        }

        #[tokio::test]
        async fn counting_filters_by_owner() {
            let dir = tempfile::tempdir().expect("create temporary directory");
            let db = FsDb::create(dir.path().to_path_buf()).expect("create record store");

            db.insert_interview(interview("iv1", "user-a"))
                .await
                .expect("insert first interview");
            db.insert_interview(interview("iv2", "user-a"))
                .await
                .expect("insert second interview");
            db.insert_interview(interview("iv3", "user-b"))
                .await
                .expect("insert third interview");

            assert_eq!(db.count_interviews("user-a").await.expect("count"), 2);
            assert_eq!(db.count_interviews("user-b").await.expect("count"), 1);
            assert_eq!(db.count_interviews("user-c").await.expect("count"), 0);
        }

        #[tokio::test]
        async fn listing_skips_unparseable_submissions() {
            let dir = tempfile::tempdir().expect("create temporary directory");
            let db = FsDb::create(dir.path().to_path_buf()).expect("create record store");

            db.insert_submission(submission("iv1-1", "iv1", "user-a"))
                .await
                .expect("insert submission");

            fs::write(
                dir.path().join("submissions").join("submission-bad.json"),
                b"not json",
            )
            .expect("write corrupt record");

            let records = db.list_submissions().await.expect("list submissions");
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].id, "iv1-1");
        }

        #[tokio::test]
        async fn unsafe_ids_resolve_to_nothing() {
            let dir = tempfile::tempdir().expect("create temporary directory");
            let db = FsDb::create(dir.path().to_path_buf()).expect("create record store");

            assert!(db
                .retrieve_interview("../outside")
                .await
                .expect("retrieve traversal id")
                .is_none());
            assert!(db
                .retrieve_submission("a/b")
                .await
                .expect("retrieve traversal id")
                .is_none());
        }
    }
}
