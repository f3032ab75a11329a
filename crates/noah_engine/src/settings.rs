use std::time::Duration;

use url::Url;

use crate::{ApiError, FailureKind, UploadId};

/// Relative endpoint paths, joined onto [`ClientSettings::base_url`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub session: String,
    pub upload: String,
    /// Prefix of the status socket; the upload id is appended.
    pub status: String,
    pub lookup: String,
    pub lookup_param: String,
    pub meta: String,
    pub files: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            session: "get-upload-id".to_string(),
            upload: "upload".to_string(),
            status: "ws/upload-progress/".to_string(),
            lookup: "fetch-rj-info".to_string(),
            lookup_param: "rj_code".to_string(),
            meta: "api/files/meta".to_string(),
            files: "api/files".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    /// Base for the status socket. Derived from `base_url` when unset.
    pub status_base_url: Option<String>,
    pub connect_timeout: Duration,
    /// Whole-request timeout. Off by default so large uploads are never cut.
    pub request_timeout: Option<Duration>,
    pub upload_concurrency: usize,
    pub chunk_size: usize,
    pub endpoints: Endpoints,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/".to_string(),
            status_base_url: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            upload_concurrency: 3,
            chunk_size: 64 * 1024,
            endpoints: Endpoints::default(),
        }
    }
}

impl ClientSettings {
    pub fn endpoint_url(&self, path: &str) -> Result<Url, ApiError> {
        join(&parse_base(&self.base_url)?, path)
    }

    pub fn status_url(&self, upload_id: &UploadId) -> Result<Url, ApiError> {
        let base = match self.status_base_url.as_deref() {
            Some(raw) => parse_base(raw)?,
            None => {
                let mut base = parse_base(&self.base_url)?;
                let scheme = match base.scheme() {
                    "https" => "wss",
                    _ => "ws",
                };
                base.set_scheme(scheme).map_err(|()| {
                    ApiError::new(
                        FailureKind::InvalidUrl,
                        format!("cannot derive a socket url from {}", self.base_url),
                    )
                })?;
                base
            }
        };
        let prefix = join(&base, &self.endpoints.status)?;
        join(&with_trailing_slash(prefix), upload_id.as_str())
    }
}

fn parse_base(raw: &str) -> Result<Url, ApiError> {
    let url = Url::parse(raw)
        .map_err(|err| ApiError::new(FailureKind::InvalidUrl, format!("{raw}: {err}")))?;
    Ok(with_trailing_slash(url))
}

// Url::join replaces the last segment unless the base ends with '/'.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn join(base: &Url, path: &str) -> Result<Url, ApiError> {
    base.join(path.trim_start_matches('/'))
        .map_err(|err| ApiError::new(FailureKind::InvalidUrl, format!("{path}: {err}")))
}
