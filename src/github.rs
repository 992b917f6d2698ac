//! GitHub search for the pull request that merged a commit

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::pr::PullRequest;
use crate::remote::Project;

const TOKEN_HINT: &str =
    "store a GitHub token in the token file (or pass --token-file) and try again";

/// Finds the merged pull request that introduced a commit
pub trait PullRequestResolver {
    /// `Ok(None)` when no merged PR contains `sha`
    fn find_merged_pull_request(&self, sha: &str) -> Result<Option<PullRequest>>;
}

// Response types for the issue search endpoint

#[derive(Deserialize, Debug)]
struct SearchResponse {
    total_count: u64,
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize, Debug)]
struct SearchItem {
    number: u64,
    #[serde(default)]
    title: String,
    body: Option<String>,
    #[serde(default)]
    html_url: String,
}

impl From<SearchItem> for PullRequest {
    fn from(item: SearchItem) -> Self {
        PullRequest::new(item.number)
            .with_title(item.title)
            .with_body(item.body.unwrap_or_default())
            .with_url(item.html_url)
    }
}

/// Blocking client for the GitHub REST search API
pub struct GitHubClient {
    http: Client,
    api_url: String,
    project: Project,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(project: Project, token: Option<String>) -> Result<Self> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            api_url: project.api_url(),
            project,
            token,
        })
    }

    /// Point the client at a different API root
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    fn search_url(&self, sha: &str) -> String {
        format!(
            "{}/search/issues?q=sha:{}+type:pr+is:merged+repo:{}",
            self.api_url.trim_end_matches('/'),
            sha,
            self.project.slug()
        )
    }
}

impl PullRequestResolver for GitHubClient {
    fn find_merged_pull_request(&self, sha: &str) -> Result<Option<PullRequest>> {
        let url = self.search_url(sha);
        log::debug!("Searching {}", url);

        let mut request = self
            .http
            .get(&url)
            .header(ACCEPT, "application/vnd.github+json")
            .header(
                USER_AGENT,
                concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
            );
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("token {}", token));
        }

        let response = request.send()?;
        let status = response.status();
        let remaining = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());
        if let Some(remaining) = remaining {
            log::debug!("GitHub search requests remaining: {}", remaining);
        }

        let body = response.text()?;
        interpret_search(sha, status, remaining, &body)
    }
}

/// Turn a search response into zero or one pull request
fn interpret_search(
    sha: &str,
    status: StatusCode,
    remaining: Option<u64>,
    body: &str,
) -> Result<Option<PullRequest>> {
    match status {
        StatusCode::UNAUTHORIZED => {
            return Err(Error::AuthenticationOrRate(format!(
                "the token was rejected (401); {}",
                TOKEN_HINT
            )));
        }
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            let exhausted = status == StatusCode::TOO_MANY_REQUESTS
                || remaining == Some(0)
                || body.to_lowercase().contains("rate limit");
            let reason = if exhausted {
                "search rate limit exhausted".to_string()
            } else {
                format!("access denied ({})", status.as_u16())
            };
            return Err(Error::AuthenticationOrRate(format!("{}; {}", reason, TOKEN_HINT)));
        }
        status if !status.is_success() => {
            return Err(Error::GitHubApi {
                status: status.as_u16(),
                body: body.to_string(),
            });
        }
        _ => {}
    }

    let response: SearchResponse = serde_json::from_str(body)?;
    match response.total_count {
        0 => Ok(None),
        1 => Ok(response.items.into_iter().next().map(PullRequest::from)),
        count => Err(Error::MultiplePullRequests {
            sha: sha.to_string(),
            count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::runtime::Runtime;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SHA: &str = "5f1c8a7e2b9d4c3a1e0f6b8d7c5a4e3f2d1c0b9a";

    fn project() -> Project {
        Project {
            host: "github.com".to_string(),
            owner: "ceph".to_string(),
            name: "ceph-ansible".to_string(),
        }
    }

    #[test]
    fn test_search_url() {
        let client = GitHubClient::new(project(), None).unwrap();
        assert_eq!(
            client.search_url(SHA),
            format!(
                "https://api.github.com/search/issues?q=sha:{}+{}",
                SHA, "type:pr+is:merged+repo:ceph/ceph-ansible"
            )
        );

        let client = client.with_api_url("http://127.0.0.1:8080/");
        assert!(client
            .search_url(SHA)
            .starts_with("http://127.0.0.1:8080/search/issues?q="));
    }

    #[test]
    fn test_interpret_single_match() {
        let body = r#"{
            "total_count": 1,
            "incomplete_results": false,
            "items": [{
                "number": 2210,
                "title": "rgw: fix multisite",
                "body": "Fixes rhbz#1507907",
                "html_url": "https://github.com/ceph/ceph-ansible/pull/2210"
            }]
        }"#;

        let pr = interpret_search(SHA, StatusCode::OK, Some(29), body)
            .unwrap()
            .unwrap();
        assert_eq!(pr.number, 2210);
        assert_eq!(pr.title, "rgw: fix multisite");
        assert_eq!(pr.body, "Fixes rhbz#1507907");
        assert_eq!(pr.url, "https://github.com/ceph/ceph-ansible/pull/2210");
    }

    #[test]
    fn test_interpret_null_body() {
        let body = r#"{"total_count": 1, "items": [{"number": 7, "title": "t", "body": null}]}"#;
        let pr = interpret_search(SHA, StatusCode::OK, None, body)
            .unwrap()
            .unwrap();
        assert_eq!(pr.body, "");
    }

    #[test]
    fn test_interpret_no_match() {
        let body = r#"{"total_count": 0, "incomplete_results": false, "items": []}"#;
        assert_eq!(interpret_search(SHA, StatusCode::OK, None, body).unwrap(), None);
    }

    #[test]
    fn test_interpret_multiple_matches() {
        let body = r#"{"total_count": 2, "items": [
            {"number": 1, "title": "a", "body": ""},
            {"number": 2, "title": "b", "body": ""}
        ]}"#;
        let err = interpret_search(SHA, StatusCode::OK, None, body).unwrap_err();
        assert!(matches!(err, Error::MultiplePullRequests { count: 2, .. }));
    }

    #[test]
    fn test_interpret_bad_token() {
        let err = interpret_search(SHA, StatusCode::UNAUTHORIZED, None, "{}").unwrap_err();
        assert!(matches!(err, Error::AuthenticationOrRate(_)));
        assert!(err.to_string().contains("token"));
    }

    #[test]
    fn test_interpret_rate_limited() {
        let body = r#"{"message": "API rate limit exceeded for 10.0.0.1."}"#;
        let err = interpret_search(SHA, StatusCode::FORBIDDEN, Some(0), body).unwrap_err();
        assert!(matches!(err, Error::AuthenticationOrRate(_)));
        assert!(err.to_string().contains("rate limit exhausted"));

        let err = interpret_search(SHA, StatusCode::TOO_MANY_REQUESTS, None, "").unwrap_err();
        assert!(matches!(err, Error::AuthenticationOrRate(_)));
    }

    #[test]
    fn test_interpret_server_error() {
        let err = interpret_search(SHA, StatusCode::BAD_GATEWAY, None, "oops").unwrap_err();
        assert!(matches!(err, Error::GitHubApi { status: 502, .. }));
    }

    #[test]
    fn test_interpret_garbage_body() {
        let err = interpret_search(SHA, StatusCode::OK, None, "<html>").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    const SINGLE_MATCH: &str = r#"{
        "total_count": 1,
        "items": [{
            "number": 2210,
            "title": "rgw: fix multisite",
            "body": "Fixes rhbz#1507907",
            "html_url": "https://github.com/ceph/ceph-ansible/pull/2210"
        }]
    }"#;

    /// Starts a local server with `mocks` mounted
    ///
    /// The blocking client must not run inside the runtime, so only the
    /// server setup goes through `block_on`.
    fn serve(rt: &Runtime, mocks: Vec<Mock>) -> MockServer {
        rt.block_on(async {
            let server = MockServer::start().await;
            for mock in mocks {
                mock.mount(&server).await;
            }
            server
        })
    }

    fn search_query() -> String {
        format!("sha:{} type:pr is:merged repo:ceph/ceph-ansible", SHA)
    }

    #[test]
    fn test_client_finds_single_match() {
        let rt = Runtime::new().unwrap();
        let server = serve(
            &rt,
            vec![Mock::given(method("GET"))
                .and(path("/search/issues"))
                .and(query_param("q", search_query().as_str()))
                .respond_with(
                    ResponseTemplate::new(200)
                        .insert_header("X-RateLimit-Remaining", "29")
                        .set_body_string(SINGLE_MATCH),
                )
                .expect(1)],
        );

        let client = GitHubClient::new(project(), None)
            .unwrap()
            .with_api_url(server.uri());
        let pr = client.find_merged_pull_request(SHA).unwrap().unwrap();

        assert_eq!(pr.number, 2210);
        assert_eq!(pr.body, "Fixes rhbz#1507907");
        assert_eq!(pr.url, "https://github.com/ceph/ceph-ansible/pull/2210");
    }

    #[test]
    fn test_client_rate_limit_exhausted() {
        let rt = Runtime::new().unwrap();
        let server = serve(
            &rt,
            vec![Mock::given(method("GET"))
                .and(path("/search/issues"))
                .respond_with(
                    ResponseTemplate::new(403)
                        .insert_header("X-RateLimit-Remaining", "0")
                        .set_body_string(r#"{"message": "Forbidden"}"#),
                )],
        );

        let client = GitHubClient::new(project(), None)
            .unwrap()
            .with_api_url(server.uri());
        let err = client.find_merged_pull_request(SHA).unwrap_err();

        assert!(matches!(err, Error::AuthenticationOrRate(_)));
        assert!(err.to_string().contains("rate limit exhausted"));
    }

    #[test]
    fn test_client_sends_token() {
        let rt = Runtime::new().unwrap();
        let server = serve(
            &rt,
            vec![Mock::given(method("GET"))
                .and(path("/search/issues"))
                .and(header("authorization", "token abc123"))
                .respond_with(ResponseTemplate::new(200).set_body_string(SINGLE_MATCH))],
        );

        let client = GitHubClient::new(project(), Some("abc123".to_string()))
            .unwrap()
            .with_api_url(server.uri());
        let pr = client.find_merged_pull_request(SHA).unwrap();
        assert_eq!(pr.map(|pr| pr.number), Some(2210));

        // Without the header nothing matches and the server answers 404
        let anonymous = GitHubClient::new(project(), None)
            .unwrap()
            .with_api_url(server.uri());
        let err = anonymous.find_merged_pull_request(SHA).unwrap_err();
        assert!(matches!(err, Error::GitHubApi { status: 404, .. }));
    }
}
