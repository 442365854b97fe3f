//! HTTP transfer primitives: size probe and streamed GET to a file.

use std::path::Path;

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::CONTENT_LENGTH;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use url::Url;

use super::error::DownloadError;

/// Thin wrapper over a shared [`reqwest::Client`] for track transfers.
///
/// The wrapped client carries the site headers; see
/// [`HttpSettings`](crate::http_client::HttpSettings).
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Wraps an already configured client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Returns the remote size from a HEAD request's `Content-Length`.
    ///
    /// `Ok(None)` means the server answered but did not state a size.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] for a network failure or non-success status.
    #[instrument(skip(self))]
    pub async fn probe_content_length(&self, url: &str) -> Result<Option<u64>, DownloadError> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }
        // Read the header directly: `Response::content_length` reports the
        // (empty) body size for HEAD responses.
        let length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());
        debug!(?length, "probed remote size");
        Ok(length)
    }

    /// Streams `url` into `path`, truncating any previous content.
    ///
    /// The transfer is abandoned at `deadline` or when `cancel` fires. Any
    /// partially written file is removed before an error is returned; a
    /// failure before the body starts leaves an existing file untouched.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] describing why the transfer stopped.
    #[instrument(skip(self, cancel), fields(path = %path.display()))]
    pub async fn fetch_to_file(
        &self,
        url: &str,
        path: &Path,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<u64, DownloadError> {
        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let send = self.client.get(url).send();
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DownloadError::cancelled(url)),
            () = tokio::time::sleep_until(deadline) => return Err(DownloadError::timeout(url)),
            result = send => result.map_err(|e| DownloadError::network(url, e))?,
        };
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::io(parent, e))?;
        }
        let mut file = File::create(path)
            .await
            .map_err(|e| DownloadError::io(path, e))?;

        let result = stream_to_file(&mut file, response, url, path, deadline, cancel).await;
        if result.is_err() {
            drop(file);
            debug!("removing partial file after failed transfer");
            let _ = tokio::fs::remove_file(path).await;
        }
        result
    }
}

/// Copies the response body into `file`, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    path: &Path,
    deadline: Instant,
    cancel: &CancellationToken,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;
    let expired = tokio::time::sleep_until(deadline);
    tokio::pin!(expired);

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DownloadError::cancelled(url)),
            () = &mut expired => return Err(DownloadError::timeout(url)),
            next = stream.next() => next,
        };
        let Some(chunk_result) = next else {
            break;
        };
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(path, e))?;
        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(path, e))?;

    Ok(bytes_written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client() -> HttpClient {
        HttpClient::new(Client::new())
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(30)
    }

    #[tokio::test]
    async fn test_fetch_to_file_writes_body_and_creates_parents() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.mp3"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"audio-bytes".to_vec()))
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("Chill/Aoi - Rainy Day.mp3");

        let bytes = client()
            .fetch_to_file(
                &format!("{}/a.mp3", server.uri()),
                &dest,
                far_deadline(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(bytes, 11);
        assert_eq!(std::fs::read(&dest).unwrap(), b"audio-bytes");
    }

    #[tokio::test]
    async fn test_fetch_to_file_truncates_existing_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new".to_vec()))
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("a.mp3");
        std::fs::write(&dest, b"much longer old content").unwrap();

        client()
            .fetch_to_file(&server.uri(), &dest, far_deadline(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_fetch_to_file_http_error_leaves_no_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("a.mp3");

        let result = client()
            .fetch_to_file(&server.uri(), &dest, far_deadline(), &CancellationToken::new())
            .await;
        assert!(matches!(
            result,
            Err(DownloadError::HttpStatus { status: 404, .. })
        ));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_fetch_to_file_deadline_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"data".to_vec())
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("a.mp3");

        let result = client()
            .fetch_to_file(
                &server.uri(),
                &dest,
                Instant::now() + Duration::from_millis(200),
                &CancellationToken::new(),
            )
            .await;
        assert!(matches!(result, Err(DownloadError::Timeout { .. })));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_fetch_to_file_cancelled_before_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("a.mp3");
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let result = client()
            .fetch_to_file(&server.uri(), &dest, far_deadline(), &cancel)
            .await;
        assert!(matches!(result, Err(DownloadError::Cancelled { .. })));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_fetch_to_file_rejects_invalid_url() {
        let dir = TempDir::new().unwrap();
        let result = client()
            .fetch_to_file(
                "not a url",
                &dir.path().join("a.mp3"),
                far_deadline(),
                &CancellationToken::new(),
            )
            .await;
        assert!(matches!(result, Err(DownloadError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_probe_content_length_reads_header() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0_u8; 4096]))
            .mount(&server)
            .await;
        let length = client().probe_content_length(&server.uri()).await.unwrap();
        assert_eq!(length, Some(4096));
    }

    #[tokio::test]
    async fn test_probe_content_length_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        assert!(client().probe_content_length(&server.uri()).await.is_err());
    }
}
