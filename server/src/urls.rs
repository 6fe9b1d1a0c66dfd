use url::Url;

/// The URLs for various resources.
#[derive(Clone, Debug)]
pub struct Urls {
    /// The base URL of the server.
    pub base: Url,

    /// The path under which media is served.
    pub(crate) media_path: String,
}

impl Urls {
    pub fn new(base: impl AsRef<str>, media_path: impl Into<String>) -> Self {
        Urls {
            base: Url::parse(base.as_ref()).expect("parse base URL"),
            media_path: media_path.into(),
        }
    }

    /// The relative reference stored in records and returned to
    /// clients for one media object.
    pub fn media_ref(&self, name: &str) -> String {
        format!("/{}/{}", self.media_path, name)
    }

    /// The shareable URL of an interview.
    pub fn interview(&self, id: &str) -> Url {
        self.base
            .join("interview/")
            .and_then(|u| u.join(id))
            .expect("join interview URL")
    }
}

#[cfg(test)]
mod tests {
    use super::Urls;

    #[test]
    fn media_refs_are_rooted_at_the_media_path() {
        let urls = Urls::new("http://localhost:8080/", "media");

        assert_eq!(
            urls.media_ref("video-iv1-1-q0.webm"),
            "/media/video-iv1-1-q0.webm"
        );
    }

    #[test]
    fn interview_urls_extend_the_base() {
        let urls = Urls::new("https://example.com/", "media");

        assert_eq!(
            urls.interview("iv1").as_str(),
            "https://example.com/interview/iv1"
        );
    }
}
