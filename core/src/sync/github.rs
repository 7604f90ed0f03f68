use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{SyncError, SyncGateway};
use crate::config::SyncConfig;
use crate::models::RepoId;

const USER_AGENT: &str = concat!("marknest/", env!("CARGO_PKG_VERSION"));

/// [`SyncGateway`] backed by the GitHub contents API.
pub struct GitHubGateway {
    client: Client,
    token: String,
    repo: RepoId,
    api_base: String,
    branch: Option<String>,
}

#[derive(Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: String,
}

#[derive(Serialize)]
struct PutRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

impl GitHubGateway {
    pub fn new(token: String, repo: RepoId, config: &SyncConfig) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SyncError::Network(e.to_string()))?;

        Ok(Self {
            client,
            token,
            repo,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            branch: config.branch.clone(),
        })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base,
            self.repo.owner,
            self.repo.name,
            path.trim_start_matches('/')
        )
    }

    fn fetch(&self, path: &str) -> Result<Option<ContentsResponse>, SyncError> {
        let mut request = self
            .client
            .get(self.contents_url(path))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json");
        if let Some(branch) = &self.branch {
            request = request.query(&[("ref", branch)]);
        }

        let response = request.send().map_err(transport_error)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response)?;
        let body = response
            .json::<ContentsResponse>()
            .map_err(|e| SyncError::Decode(e.to_string()))?;
        Ok(Some(body))
    }
}

impl SyncGateway for GitHubGateway {
    fn read(&self, path: &str) -> Result<Option<Vec<u8>>, SyncError> {
        match self.fetch(path)? {
            Some(file) => decode_content(&file.content).map(Some),
            None => Ok(None),
        }
    }

    fn upload(&self, path: &str, bytes: &[u8]) -> Result<(), SyncError> {
        let existing = self.fetch(path)?;
        let body = PutRequest {
            message: "Update notes backup",
            content: STANDARD.encode(bytes),
            sha: existing.as_ref().map(|f| f.sha.as_str()),
            branch: self.branch.as_deref(),
        };

        let response = self
            .client
            .put(self.contents_url(path))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .json(&body)
            .send()
            .map_err(transport_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SyncError::NotFound(self.repo.to_string()));
        }
        check_status(response)?;
        Ok(())
    }
}

fn transport_error(e: reqwest::Error) -> SyncError {
    if e.is_timeout() {
        SyncError::Timeout
    } else {
        SyncError::Network(e.to_string())
    }
}

fn check_status(response: Response) -> Result<Response, SyncError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(SyncError::Unauthorized);
    }
    let message = response.text().unwrap_or_default();
    Err(SyncError::Remote {
        status: status.as_u16(),
        message,
    })
}

/// GitHub wraps base64 payloads at 60 columns.
fn decode_content(content: &str) -> Result<Vec<u8>, SyncError> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| SyncError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contents_url() {
        let config = SyncConfig {
            api_base: "https://example.test/api/".to_string(),
            ..SyncConfig::default()
        };
        let gateway = GitHubGateway::new(
            "token".to_string(),
            RepoId::parse("alice/notes").unwrap(),
            &config,
        )
        .unwrap();
        assert_eq!(
            gateway.contents_url("/notes-backup.json"),
            "https://example.test/api/repos/alice/notes/contents/notes-backup.json"
        );
    }

    #[test]
    fn test_decode_wrapped_content() {
        let encoded = STANDARD.encode(b"{\"notes\":[]}");
        let (head, tail) = encoded.split_at(6);
        let wrapped = format!("{}\n{}\n", head, tail);
        assert_eq!(decode_content(&wrapped).unwrap(), b"{\"notes\":[]}".to_vec());
        assert!(matches!(decode_content("!!!"), Err(SyncError::Decode(_))));
    }

    #[test]
    fn test_put_request_omits_missing_sha() {
        let body = PutRequest {
            message: "m",
            content: "Y29udGVudA==".to_string(),
            sha: None,
            branch: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("sha").is_none());
        assert!(value.get("branch").is_none());
    }
}
