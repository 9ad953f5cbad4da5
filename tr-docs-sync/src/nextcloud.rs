#![doc = "Nextcloud WebDAV client: the real `RemoteStorage` used by the CLI for folder checks, folder creation and file uploads."]
//
//! # Nextcloud Integration (CLI <-> Core)
//!
//! Bridges the [`RemoteStorage`] trait from `tr-docs-sync-core` to a Nextcloud
//! server over WebDAV. Every remote path is resolved below
//! `{NC_URL}/remote.php/dav/files/{NC_AUTH_USER}/` and every request carries
//! basic auth.
//!
//! | Operation       | Request                       | Accepted statuses        |
//! |-----------------|-------------------------------|--------------------------|
//! | `folder_exists` | `PROPFIND` with `Depth: 0`    | 207/2xx (yes), 404 (no)  |
//! | `make_dirs`     | `MKCOL` on every prefix       | 201/2xx, 405 (exists)    |
//! | `upload_file`   | streamed `PUT`                | 2xx                      |
//!
//! Uploads stream the file from disk and attach an `OC-Checksum` header so
//! the server can verify what it stored.

use std::path::Path;

use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client, Method, Response, StatusCode};
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;
use url::Url;

use tr_docs_sync_core::config::NextcloudSettings;
use tr_docs_sync_core::contract::RemoteStorage;
use tr_docs_sync_core::error::RemoteError;

/// Path of the per-user WebDAV root below the server URL.
const DAV_FILES_ROOT: [&str; 3] = ["remote.php", "dav", "files"];

/// WebDAV client bound to one Nextcloud account.
#[derive(Clone)]
pub struct NextcloudClient {
    http: Client,
    files_root: Url,
    user: String,
    password: String,
    propfind: Method,
    mkcol: Method,
}

impl std::fmt::Debug for NextcloudClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NextcloudClient")
            .field("files_root", &self.files_root.as_str())
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl NextcloudClient {
    pub fn new(settings: &NextcloudSettings) -> Result<Self, RemoteError> {
        let mut files_root = Url::parse(&settings.url).map_err(|e| {
            tracing::error!(error = ?e, url = %settings.url, "Failed to parse NC_URL");
            RemoteError::InvalidUrl(format!("{}: {e}", settings.url))
        })?;
        files_root
            .path_segments_mut()
            .map_err(|_| RemoteError::InvalidUrl(settings.url.clone()))?
            .pop_if_empty()
            .extend(DAV_FILES_ROOT)
            .push(&settings.user);

        let http = Client::builder()
            .build()
            .map_err(|e| RemoteError::Request {
                path: String::new(),
                message: e.to_string(),
            })?;

        tracing::info!(
            files_root = %files_root,
            user = %settings.user,
            password_set = !settings.password.is_empty(),
            "Initialised Nextcloud client"
        );

        Ok(Self {
            http,
            files_root,
            user: settings.user.clone(),
            password: settings.password.clone(),
            propfind: webdav_method("PROPFIND")?,
            mkcol: webdav_method("MKCOL")?,
        })
    }

    /// Absolute WebDAV URL for a `/`-separated path below the user's root.
    pub fn url_for(&self, remote_path: &str) -> Result<Url, RemoteError> {
        let mut url = self.files_root.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::InvalidUrl(self.files_root.to_string()))?
            .extend(remote_path.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        remote_path: &str,
    ) -> Result<Response, RemoteError> {
        request
            .basic_auth(&self.user, Some(&self.password))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, remote_path, "WebDAV request failed");
                RemoteError::Request {
                    path: remote_path.to_string(),
                    message: e.to_string(),
                }
            })
    }

    async fn mkcol(&self, remote_path: &str) -> Result<bool, RemoteError> {
        let url = self.url_for(remote_path)?;
        let response = self
            .send(self.http.request(self.mkcol.clone(), url), remote_path)
            .await?;

        match response.status() {
            StatusCode::METHOD_NOT_ALLOWED => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(status_error("MKCOL", remote_path, status)),
        }
    }
}

#[async_trait]
impl RemoteStorage for NextcloudClient {
    async fn folder_exists(&self, remote_path: &str) -> Result<bool, RemoteError> {
        let url = self.url_for(remote_path)?;
        let response = self
            .send(
                self.http
                    .request(self.propfind.clone(), url)
                    .header("Depth", "0"),
                remote_path,
            )
            .await?;

        let exists = match response.status() {
            StatusCode::NOT_FOUND => false,
            status if status.is_success() => true,
            status => return Err(status_error("PROPFIND", remote_path, status)),
        };
        tracing::debug!(remote_path, exists, "Checked remote folder");
        Ok(exists)
    }

    async fn make_dirs(&self, remote_path: &str) -> Result<(), RemoteError> {
        let segments: Vec<&str> = remote_path.split('/').filter(|s| !s.is_empty()).collect();
        for depth in 1..=segments.len() {
            let prefix = segments[..depth].join("/");
            if self.mkcol(&prefix).await? {
                tracing::info!(remote_path = %prefix, "Created remote folder");
            } else {
                tracing::debug!(remote_path = %prefix, "Remote folder already exists");
            }
        }
        Ok(())
    }

    async fn upload_file(&self, remote_path: &str, local_path: &Path) -> Result<u64, RemoteError> {
        let io_error = |source: std::io::Error| RemoteError::Io {
            path: local_path.to_path_buf(),
            source,
        };

        let (checksum, size) = sha256_file(local_path).await.map_err(io_error)?;
        let file = tokio::fs::File::open(local_path).await.map_err(io_error)?;
        let url = self.url_for(remote_path)?;

        tracing::info!(
            local_path = %local_path.display(),
            remote_path,
            bytes = size,
            "Uploading file"
        );

        let request = self
            .http
            .put(url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_LENGTH, size)
            .header("OC-Checksum", format!("SHA256:{checksum}"))
            .body(Body::wrap_stream(ReaderStream::new(file)));
        let response = self.send(request, remote_path).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error("PUT", remote_path, status));
        }
        tracing::info!(remote_path, status = status.as_u16(), "Upload finished");
        Ok(size)
    }
}

fn webdav_method(name: &'static str) -> Result<Method, RemoteError> {
    Method::from_bytes(name.as_bytes()).map_err(|e| RemoteError::Request {
        path: String::new(),
        message: format!("invalid HTTP method {name}: {e}"),
    })
}

fn status_error(method: &str, remote_path: &str, status: StatusCode) -> RemoteError {
    tracing::error!(method, remote_path, status = status.as_u16(), "Unexpected WebDAV status");
    RemoteError::Status {
        method: method.to_string(),
        path: remote_path.to_string(),
        status: status.as_u16(),
    }
}

/// Hex SHA-256 digest and byte length of a file, read in chunks.
async fn sha256_file(path: &Path) -> std::io::Result<(String, u64)> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    let mut size = 0u64;
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        size += n as u64;
    }
    Ok((format!("{:x}", hasher.finalize()), size))
}
