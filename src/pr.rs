/// A merged pull request found for a commit
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PullRequest {
    /// The PR number
    pub number: u64,
    /// The title of the PR
    pub title: String,
    /// The description, empty when the author left none
    pub body: String,
    /// Link to the PR on the hosting service
    pub url: String,
}

impl PullRequest {
    pub fn new(number: u64) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}
