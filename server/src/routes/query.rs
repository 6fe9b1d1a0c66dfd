use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SubmissionsQuery {
    pub id: Option<String>,
}
