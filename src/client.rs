use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::redirect::Policy;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::{EnlargeOptions, JobConfig};
use crate::errors::{Result, VanceError};
use crate::models::{
    Envelope, ProcessOptions, ProgressData, Status, TransformData, TransformResult, UploadData,
};
use crate::scale::scale_for_dimensions;

const DEFAULT_BASE_URL: &str = "https://api-service.vanceai.com/web_api/v1";
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// The service rejects uploads above this size, so oversized files fail
/// before any bytes leave the machine.
const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Submitted in place of a caller webhook so the service takes the pollable
/// path instead of holding the job for a completion callback.
const NOOP_WEBHOOK: &str = "http://127.0.0.1/";

/// Builder for constructing a [`Client`] with custom configuration.
///
/// # Example
///
/// ```no_run
/// use vanceai::ClientBuilder;
/// use std::time::Duration;
///
/// # fn example() -> vanceai::Result<()> {
/// let client = ClientBuilder::new()
///     .api_token("your_api_token")
///     .base_url("https://custom.example.com/web_api/v1")
///     .connect_timeout(Duration::from_secs(5))
///     .request_timeout(Duration::from_secs(10))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    api_token: Option<String>,
    base_url: String,
    connect_timeout: Duration,
    request_timeout: Duration,
    follow_redirects: bool,
}

impl ClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            api_token: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            follow_redirects: true,
        }
    }

    /// Set the API token sent with every request.
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Override the base URL (defaults to the public web API endpoint).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the TCP connect timeout (defaults to 3 seconds).
    pub fn connect_timeout(mut self, d: Duration) -> Self {
        self.connect_timeout = d;
        self
    }

    /// Set the overall per-request timeout (defaults to 5 seconds).
    pub fn request_timeout(mut self, d: Duration) -> Self {
        self.request_timeout = d;
        self
    }

    /// Follow HTTP redirects (defaults to true).
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    /// Build the [`Client`].
    ///
    /// If no token was set via [`api_token`](Self::api_token), the builder
    /// will attempt to read the `VANCEAI_API_TOKEN` environment variable.
    ///
    /// Returns [`VanceError::Config`] if no token is available.
    pub fn build(self) -> Result<Client> {
        let api_token = self
            .api_token
            .or_else(|| std::env::var("VANCEAI_API_TOKEN").ok())
            .ok_or_else(|| {
                VanceError::Config(
                    "API token is required. Pass it to ClientBuilder::api_token() \
                     or set the VANCEAI_API_TOKEN environment variable."
                        .into(),
                )
            })?;

        let redirects = if self.follow_redirects {
            Policy::limited(10)
        } else {
            Policy::none()
        };
        let http = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .redirect(redirects)
            .build()
            .map_err(VanceError::Http)?;

        Ok(Client {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            api_token,
            http,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Request payload shapes the web API accepts.
enum Payload {
    Multipart(Form),
    Form(Vec<(&'static str, String)>),
}

/// The VanceAI API client.
///
/// Use [`Client::new`] for quick construction or [`ClientBuilder`] for full
/// control. The client is immutable after construction and holds no
/// per-job state, so a single instance can drive many jobs from
/// independent tasks concurrently.
///
/// # Example
///
/// ```no_run
/// use vanceai::{Client, EnlargeOptions};
///
/// # async fn example() -> vanceai::Result<()> {
/// let client = Client::new("your_api_token");
///
/// // Upload, enlarge 2x, and download, blocking until complete
/// let output = client.enlarge("photo.jpg", &EnlargeOptions::default(), None).await?;
/// println!("written to {}", output.display());
/// # Ok(())
/// # }
/// ```
pub struct Client {
    base_url: String,
    api_token: String,
    http: reqwest::Client,
}

impl Client {
    /// Create a new client with the given API token and default settings.
    ///
    /// For customization, use [`ClientBuilder`] instead.
    pub fn new(api_token: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");

        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: api_token.into(),
            http,
        }
    }

    /// Upload a local image and return the server-issued `uid` handle.
    ///
    /// The handle is consumed by [`transform`](Self::transform); the client
    /// does not keep it.
    ///
    /// # Errors
    ///
    /// - [`VanceError::File`] if the file is missing or unreadable.
    /// - [`VanceError::Validation`] if the file exceeds the 10 MB upload
    ///   limit. Checked before any network I/O.
    pub async fn upload(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();

        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| VanceError::file(path, e.to_string()))?;
        if meta.len() > MAX_UPLOAD_BYTES {
            return Err(VanceError::Validation(format!(
                "{} is {} bytes, above the {} byte upload limit",
                path.display(),
                meta.len(),
                MAX_UPLOAD_BYTES
            )));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| VanceError::file(path, e.to_string()))?;

        debug!("uploading {} ({} bytes)", path.display(), bytes.len());

        let form = Form::new()
            .text("api_token", self.api_token.clone())
            .part("file", Part::bytes(bytes).file_name(file_name));
        let data: UploadData = self.execute_json("upload", Payload::Multipart(form)).await?;
        Ok(data.uid)
    }

    /// Submit a transformation job for a previously uploaded file.
    ///
    /// `webhook` is the URL the service notifies on completion; pass `None`
    /// to leave it out and query [`progress`](Self::progress) yourself.
    ///
    /// # Errors
    ///
    /// Returns [`VanceError::Transform`] if the response carries no
    /// transaction id or no status.
    pub async fn transform(
        &self,
        uid: &str,
        config: &JobConfig,
        webhook: Option<&str>,
    ) -> Result<TransformResult> {
        let mut fields = vec![
            ("api_token", self.api_token.clone()),
            ("uid", uid.to_string()),
            ("jconfig", config.to_wire()),
        ];
        if let Some(url) = webhook {
            fields.push(("webhook", url.to_string()));
        }

        let data: TransformData = self.execute_json("transform", Payload::Form(fields)).await?;

        let trans_id = data
            .trans_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| VanceError::Transform("response carries no trans_id".into()))?;
        let status = data.status.ok_or_else(|| {
            VanceError::Transform(format!("response for {trans_id} carries no status"))
        })?;

        debug!("transform submitted: trans_id={trans_id} status={status}");
        Ok(TransformResult { trans_id, status })
    }

    /// Query the current status of a submitted job.
    ///
    /// Safe to call repeatedly: the query reads server-side state without
    /// advancing it.
    pub async fn progress(&self, trans_id: &str) -> Result<Status> {
        let form = Form::new()
            .text("api_token", self.api_token.clone())
            .text("trans_id", trans_id.to_string());
        let data: ProgressData = self
            .execute_json("progress", Payload::Multipart(form))
            .await?;
        Ok(data.status)
    }

    /// Download the finished result for `trans_id` into `dest`, returning
    /// the number of bytes written.
    ///
    /// The destination is re-checked after the write; a missing or empty
    /// file is an error even when the write call itself reported success.
    ///
    /// # Errors
    ///
    /// Returns [`VanceError::File`] if the destination directory is not
    /// writable, the response body is empty, or the write fails.
    pub async fn download(&self, trans_id: &str, dest: impl AsRef<Path>) -> Result<u64> {
        let dest = dest.as_ref();

        let dir = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let dir_meta = tokio::fs::metadata(dir).await.map_err(|e| {
            VanceError::file(dest, format!("destination directory {}: {e}", dir.display()))
        })?;
        if !dir_meta.is_dir() || dir_meta.permissions().readonly() {
            return Err(VanceError::file(
                dest,
                format!("destination directory {} is not writable", dir.display()),
            ));
        }

        let form = Form::new()
            .text("api_token", self.api_token.clone())
            .text("trans_id", trans_id.to_string());
        let body = self.execute("download", Payload::Multipart(form)).await?;
        if body.is_empty() {
            return Err(VanceError::file(
                dest,
                format!("empty download body for transform id {trans_id}"),
            ));
        }

        tokio::fs::write(dest, &body)
            .await
            .map_err(|e| VanceError::file(dest, e.to_string()))?;

        // Re-stat rather than trusting the write call, so a size-zero file
        // left by cached filesystem metadata still counts as a failure.
        let written = tokio::fs::metadata(dest).await.map(|m| m.len()).unwrap_or(0);
        if written == 0 {
            return Err(VanceError::file(dest, "downloaded file is missing or empty"));
        }

        debug!("downloaded {written} bytes to {}", dest.display());
        Ok(written)
    }

    /// Upload `path`, submit `config`, poll until the job finishes, and
    /// download the result.
    ///
    /// This is the highest-level method: the caller never sees the polling.
    /// Use [`ProcessOptions`] to tune the poll interval, the total
    /// wall-clock budget, the output path, and the progress callback.
    ///
    /// Returns the path of the downloaded file.
    ///
    /// # Errors
    ///
    /// - [`VanceError::Transform`] if the job reports a fatal status.
    /// - [`VanceError::Timeout`] if the budget runs out before the result
    ///   is downloaded.
    /// - Any error from the underlying operations.
    pub async fn process(
        &self,
        path: impl AsRef<Path>,
        config: &JobConfig,
        opts: Option<ProcessOptions>,
    ) -> Result<PathBuf> {
        let path = path.as_ref();
        let opts = opts.unwrap_or_default();

        let dest = match opts.output {
            Some(ref out) => out.clone(),
            None => {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "download".to_string());
                std::env::temp_dir().join(file_name)
            }
        };

        let uid = self.upload(path).await?;
        let webhook = opts.webhook.as_deref().unwrap_or(NOOP_WEBHOOK);
        let submitted = self.transform(&uid, config, Some(webhook)).await?;

        self.poll(&submitted, &dest, &opts).await?;
        Ok(dest)
    }

    /// Enlarge an image with the image-enlarger module.
    ///
    /// Builds the job configuration from `options` and runs the full
    /// upload, transform, poll, download flow. Returns the local path of
    /// the enlarged image.
    pub async fn enlarge(
        &self,
        path: impl AsRef<Path>,
        options: &EnlargeOptions,
        opts: Option<ProcessOptions>,
    ) -> Result<PathBuf> {
        let config = JobConfig::enlarge(options)?;
        self.process(path, &config, opts).await
    }

    /// Enlarge an image by the smallest supported scale that carries either
    /// dimension past the given minimum.
    ///
    /// The scale in `options` is ignored; it is resolved from the source
    /// image's dimensions instead. Resolution failures
    /// ([`VanceError::Image`], [`VanceError::Validation`]) surface before
    /// any network call.
    pub async fn enlarge_to_dimensions(
        &self,
        path: impl AsRef<Path>,
        min_width: u32,
        min_height: u32,
        options: &EnlargeOptions,
        opts: Option<ProcessOptions>,
    ) -> Result<PathBuf> {
        let path = path.as_ref();
        let scale = scale_for_dimensions(path, min_width, min_height)?;
        let options = EnlargeOptions {
            scale,
            ..options.clone()
        };
        self.enlarge(path, &options, opts).await
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    /// Execute one POST against the service and return the raw body.
    ///
    /// A non-2xx status maps to [`VanceError::Remote`] with the code's
    /// documented description. No retries happen here; the poll loop owns
    /// all retry policy.
    async fn execute(&self, endpoint: &str, payload: Payload) -> Result<Vec<u8>> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let req = match payload {
            Payload::Multipart(form) => self.http.post(&url).multipart(form),
            Payload::Form(fields) => self.http.post(&url).form(&fields),
        };

        let response = req.send().await.map_err(VanceError::Http)?;
        let status = response.status();
        if !status.is_success() {
            return Err(VanceError::remote(status.as_u16()));
        }

        let body = response.bytes().await.map_err(VanceError::Http)?;
        Ok(body.to_vec())
    }

    /// Execute and unwrap the `{data, code}` envelope the JSON endpoints use.
    async fn execute_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        payload: Payload,
    ) -> Result<T> {
        let body = self.execute(endpoint, payload).await?;
        let envelope: Envelope<T> = serde_json::from_slice(&body)
            .map_err(|e| VanceError::Transform(format!("malformed {endpoint} response: {e}")))?;
        Ok(envelope.data)
    }

    /// Drive a submitted job to a terminal state: check the status, then
    /// conditionally download, then sleep, once per interval, at most
    /// `timeout / poll_interval` times.
    async fn poll(
        &self,
        submitted: &TransformResult,
        dest: &Path,
        opts: &ProcessOptions,
    ) -> Result<u64> {
        let trans_id = &submitted.trans_id;

        if submitted.status.is_fatal() {
            return Err(VanceError::Transform(format!(
                "transform id {trans_id} reported fatal status at submission"
            )));
        }
        if submitted.status.is_finished() {
            // Completed synchronously: no polling round needed.
            match self.download(trans_id, dest).await {
                Ok(written) => return Ok(written),
                Err(e) => warn!("download after synchronous finish failed, polling: {e}"),
            }
        }

        let max_polls = (opts.timeout.as_millis() / opts.poll_interval.as_millis().max(1)) as u32;
        for _ in 0..max_polls {
            let status = self.progress(trans_id).await?;
            if let Some(ref cb) = opts.on_progress {
                cb(&status);
            }

            match status {
                Status::Fatal => {
                    return Err(VanceError::Transform(format!(
                        "transform id {trans_id} reported fatal status"
                    )));
                }
                Status::Finished => match self.download(trans_id, dest).await {
                    Ok(written) => return Ok(written),
                    // A failed download does not end the job; the result
                    // stays claimable on the next check.
                    Err(e) => {
                        warn!("download for finished transform id {trans_id} failed, retrying on next check: {e}")
                    }
                },
                _ => {}
            }

            tokio::time::sleep(opts.poll_interval).await;
        }

        Err(VanceError::Timeout {
            trans_id: trans_id.clone(),
        })
    }
}
