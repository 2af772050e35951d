// SPDX-FileCopyrightText: 2026 FarmLink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Download of photos attached to inbound messages.
//!
//! Provider media URLs require the receiving account's credentials, so
//! photos are copied into the local media directory and served from
//! `/uploads/` from then on. Credentials are only ever sent to the
//! provider's own hosts; any other URL is fetched anonymously.

use std::path::{Path, PathBuf};
use std::time::Duration;

use farmlink_core::FarmlinkError;
use reqwest::header::CONTENT_TYPE;
use secrecy::ExposeSecret;
use reqwest::Url;
use tracing::{debug, info, warn};

use crate::pool::ProviderAccount;

/// URL path prefix under which saved media is served.
pub const MEDIA_URL_PREFIX: &str = "/uploads";

/// Largest media body accepted (WhatsApp's own media limit).
pub const MAX_MEDIA_BYTES: u64 = 16 * 1024 * 1024;

const PROVIDER_MEDIA_HOST: (&str, u16) = ("api.twilio.com", 443);

/// Saves inbound media into a local directory.
#[derive(Debug, Clone)]
pub struct MediaDownloader {
    client: reqwest::Client,
    media_dir: PathBuf,
    /// `(host, port)` pairs that may receive account credentials.
    credential_hosts: Vec<(String, u16)>,
    max_bytes: u64,
}

impl MediaDownloader {
    pub fn new(media_dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self, FarmlinkError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FarmlinkError::Http {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            media_dir: media_dir.into(),
            credential_hosts: vec![(PROVIDER_MEDIA_HOST.0.to_string(), PROVIDER_MEDIA_HOST.1)],
            max_bytes: MAX_MEDIA_BYTES,
        })
    }

    /// Also trust the host of `base_url` (the configured provider API) with
    /// account credentials.
    pub fn with_credential_base(mut self, base_url: &str) -> Self {
        match Url::parse(base_url).ok().as_ref().and_then(host_and_port) {
            Some(host) => {
                if !self.credential_hosts.contains(&host) {
                    self.credential_hosts.push(host);
                }
            }
            None => warn!(base_url, "provider base URL has no host, ignoring"),
        }
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    /// Fetch `url` and store it. `account` is sent as basic auth only when
    /// the URL points at a provider host.
    ///
    /// Returns the public path of the saved file, e.g.
    /// `/uploads/product-<uuid>.jpg`.
    pub async fn download(
        &self,
        url: &str,
        account: Option<&ProviderAccount>,
    ) -> Result<String, FarmlinkError> {
        let parsed = Url::parse(url).map_err(|e| FarmlinkError::Http {
            message: format!("invalid media URL: {e}"),
            source: Some(Box::new(e)),
        })?;
        let mut request = self.client.get(parsed.clone());
        if let Some(account) = account {
            if self.is_credential_host(&parsed) {
                request = request.basic_auth(account.id(), Some(account.secret().expose_secret()));
            } else {
                debug!(
                    host = parsed.host_str().unwrap_or_default(),
                    "media host is not a provider host, fetching anonymously"
                );
            }
        }

        let mut response = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FarmlinkError::Http {
                message: format!("media download failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if let Some(length) = response.content_length() {
            if length > self.max_bytes {
                return Err(self.too_large(length));
            }
        }
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| FarmlinkError::Http {
            message: format!("media body unreadable: {e}"),
            source: Some(Box::new(e)),
        })? {
            let total = (bytes.len() + chunk.len()) as u64;
            if total > self.max_bytes {
                return Err(self.too_large(total));
            }
            bytes.extend_from_slice(&chunk);
        }

        let extension = file_extension(content_type.as_deref(), url);
        let filename = format!("product-{}.{extension}", uuid::Uuid::new_v4().simple());
        debug!(bytes = bytes.len(), file = %filename, "saving inbound media");

        tokio::fs::create_dir_all(&self.media_dir)
            .await
            .map_err(|e| storage_error(&self.media_dir, e))?;
        let path = self.media_dir.join(&filename);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| storage_error(&path, e))?;

        let public = format!("{MEDIA_URL_PREFIX}/{filename}");
        info!(path = %public, "inbound media saved");
        Ok(public)
    }

    fn is_credential_host(&self, url: &Url) -> bool {
        host_and_port(url).is_some_and(|host| self.credential_hosts.contains(&host))
    }

    fn too_large(&self, bytes: u64) -> FarmlinkError {
        FarmlinkError::Http {
            message: format!("media body exceeds {} bytes (got at least {bytes})", self.max_bytes),
            source: None,
        }
    }
}

fn host_and_port(url: &Url) -> Option<(String, u16)> {
    let host = url.host_str()?.to_ascii_lowercase();
    Some((host, url.port_or_known_default()?))
}

fn storage_error(path: &Path, e: std::io::Error) -> FarmlinkError {
    FarmlinkError::Storage {
        source: Box::new(std::io::Error::new(
            e.kind(),
            format!("{}: {e}", path.display()),
        )),
    }
}

/// Pick a file extension from the response content type, then the URL.
fn file_extension(content_type: Option<&str>, url: &str) -> &'static str {
    match content_type.map(|c| c.split(';').next().unwrap_or(c).trim()) {
        Some("image/png") => return "png",
        Some("image/webp") => return "webp",
        Some("image/jpeg" | "image/jpg") => return "jpg",
        _ => {}
    }
    let lower = url.to_ascii_lowercase();
    if lower.contains(".png") {
        "png"
    } else if lower.contains(".webp") {
        "webp"
    } else {
        "jpg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use wiremock::matchers::{basic_auth, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn extension_prefers_content_type() {
        assert_eq!(file_extension(Some("image/png"), "https://x/a.jpg"), "png");
        assert_eq!(file_extension(Some("image/jpeg; charset=binary"), "x"), "jpg");
        assert_eq!(file_extension(None, "https://x/photo.PNG"), "png");
        assert_eq!(file_extension(Some("application/octet-stream"), "https://x/m"), "jpg");
    }

    #[tokio::test]
    async fn downloads_with_account_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Media/ME1"))
            .and(basic_auth("AC1", "secret"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(vec![0x89, b'P', b'N', b'G']),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let downloader = MediaDownloader::new(dir.path().join("uploads"), Duration::from_secs(5))
            .unwrap()
            .with_credential_base(&server.uri());
        let public = downloader
            .download(&format!("{}/Media/ME1", server.uri()), Some(&account()))
            .await
            .unwrap();
        assert!(public.starts_with("/uploads/product-"));
        assert!(public.ends_with(".png"));

        let file = dir
            .path()
            .join("uploads")
            .join(public.trim_start_matches("/uploads/"));
        assert_eq!(std::fs::read(file).unwrap(), vec![0x89, b'P', b'N', b'G']);
    }

    fn account() -> ProviderAccount {
        ProviderAccount::new(
            "AC1",
            SecretString::from("secret".to_string()),
            vec!["whatsapp:+1".into()],
        )
    }

    #[tokio::test]
    async fn credentials_are_withheld_from_foreign_hosts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/jpeg")
                    .set_body_bytes(vec![0xFF, 0xD8]),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        // Only the default provider host is trusted.
        let downloader = MediaDownloader::new(dir.path(), Duration::from_secs(5)).unwrap();
        downloader
            .download(&format!("{}/Media/ME1", server.uri()), Some(&account()))
            .await
            .unwrap();

        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 1);
        assert!(!received[0].headers.contains_key("authorization"));
    }

    #[test]
    fn credential_hosts_match_host_and_port() {
        let downloader = MediaDownloader::new("uploads", Duration::from_secs(5))
            .unwrap()
            .with_credential_base("http://127.0.0.1:8080");
        let trusted = |u: &str| downloader.is_credential_host(&Url::parse(u).unwrap());

        assert!(trusted("https://api.twilio.com/2010-04-01/Accounts/AC1/Media/ME1"));
        assert!(trusted("https://API.TWILIO.COM/x"));
        assert!(trusted("http://127.0.0.1:8080/Media/ME1"));
        assert!(!trusted("http://127.0.0.1:9090/Media/ME1"));
        assert!(!trusted("http://api.twilio.com/x"));
        assert!(!trusted("https://api.twilio.com.evil.example/x"));
    }

    #[tokio::test]
    async fn oversized_body_is_refused() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 2048]))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let downloader = MediaDownloader::new(dir.path().join("uploads"), Duration::from_secs(5))
            .unwrap()
            .with_max_bytes(1024);
        let err = downloader
            .download(&format!("{}/Media/big", server.uri()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, FarmlinkError::Http { .. }));
        assert!(!dir.path().join("uploads").exists());
    }

    #[tokio::test]
    async fn http_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let downloader = MediaDownloader::new(dir.path(), Duration::from_secs(5)).unwrap();
        let err = downloader
            .download(&format!("{}/Media/missing", server.uri()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, FarmlinkError::Http { .. }));
    }
}
