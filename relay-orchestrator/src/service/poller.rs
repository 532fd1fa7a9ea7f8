//! Completion Poller
//!
//! After generation starts: wait a grace period, then look for the artifact
//! a bounded number of times. The first check that yields a source URL and a
//! successful download wins. Running out of checks is a soft outcome.

use chrono::{DateTime, Utc};
use relay_driver::{AutomationDriver, ElementLocator, SessionHandle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::config::PollSettings;
use crate::service::error::{AutomationError, Result};

/// Longest prompt prefix used in artifact file names
const PROMPT_PREFIX_CHARS: usize = 20;

/// Numbered variants tried when jobs finish in the same second
const MAX_NAME_VARIANTS: u32 = 100;

pub struct CompletionPoller {
    driver: Arc<dyn AutomationDriver>,
    http: reqwest::Client,
    settings: PollSettings,
    artifact_dir: PathBuf,
    artifact: ElementLocator,
}

impl CompletionPoller {
    pub fn new(
        driver: Arc<dyn AutomationDriver>,
        http: reqwest::Client,
        settings: PollSettings,
        artifact_dir: PathBuf,
        artifact: ElementLocator,
    ) -> Self {
        Self {
            driver,
            http,
            settings,
            artifact_dir,
            artifact,
        }
    }

    /// Returns the downloaded file name, or `None` once every check came up empty.
    pub async fn wait_for_artifact(
        &self,
        session: &SessionHandle,
        prompt: &str,
    ) -> Result<Option<String>> {
        debug!("Waiting {:?} before the first check", self.settings.grace);
        tokio::time::sleep(self.settings.grace).await;

        for attempt in 1..=self.settings.max_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.settings.interval).await;
            }

            debug!(
                "Checking for artifact (attempt {}/{})",
                attempt, self.settings.max_attempts
            );

            let Some(source) = self.artifact_source(session).await else {
                continue;
            };

            match self.download(&source, prompt).await {
                Ok(filename) => {
                    info!("Artifact downloaded: {}", filename);
                    return Ok(Some(filename));
                }
                Err(e) => warn!("Artifact download failed on attempt {}: {}", attempt, e),
            }
        }

        info!(
            "No artifact after {} checks",
            self.settings.max_attempts
        );
        Ok(None)
    }

    async fn artifact_source(&self, session: &SessionHandle) -> Option<String> {
        let element = match self.driver.locate(session, &self.artifact).await {
            Ok(Some(element)) => element,
            Ok(None) => return None,
            Err(e) => {
                warn!("Artifact lookup failed: {}", e);
                return None;
            }
        };

        match self.driver.read_attribute(&element, "src").await {
            Ok(Some(src)) if !src.trim().is_empty() => Some(src),
            Ok(_) => {
                debug!("Artifact element has no source yet");
                None
            }
            Err(e) => {
                warn!("Reading artifact source failed: {}", e);
                None
            }
        }
    }

    /// Streams `url` into the artifact directory.
    async fn download(&self, url: &str, prompt: &str) -> Result<String> {
        self.store_artifact(url, &artifact_filename(prompt, Utc::now()))
            .await
    }

    /// Downloads `url` under `base_name`, or under a numbered variant when
    /// another job already holds that name.
    async fn store_artifact(&self, url: &str, base_name: &str) -> Result<String> {
        let mut response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AutomationError::Download(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AutomationError::Download(format!(
                "artifact fetch answered {}",
                status
            )));
        }

        let (filename, target) = self.reserve_name(base_name).await?;
        let partial = self.artifact_dir.join(format!("{}.part", filename));

        let written = write_stream(&mut response, &partial).await;
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&partial).await;
            let _ = tokio::fs::remove_file(&target).await;
            return Err(e);
        }

        if let Err(e) = tokio::fs::rename(&partial, &target).await {
            let _ = tokio::fs::remove_file(&partial).await;
            let _ = tokio::fs::remove_file(&target).await;
            return Err(AutomationError::Download(format!(
                "finalizing {}: {}",
                filename, e
            )));
        }

        Ok(filename)
    }

    /// Claims an unused file name by creating it empty; the finished
    /// download is renamed over it.
    async fn reserve_name(&self, base_name: &str) -> Result<(String, PathBuf)> {
        let stem = base_name.strip_suffix(".mp4").unwrap_or(base_name);

        for n in 1..=MAX_NAME_VARIANTS {
            let filename = if n == 1 {
                base_name.to_string()
            } else {
                format!("{}_{}.mp4", stem, n)
            };
            let path = self.artifact_dir.join(&filename);

            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(_) => return Ok((filename, path)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(AutomationError::Download(format!(
                        "{}: {}",
                        path.display(),
                        e
                    )));
                }
            }
        }

        Err(AutomationError::Download(format!(
            "no free file name for {}",
            base_name
        )))
    }
}

async fn write_stream(response: &mut reqwest::Response, path: &Path) -> Result<u64> {
    let io_err = |e: std::io::Error| AutomationError::Download(format!("{}: {}", path.display(), e));

    let mut file = tokio::fs::File::create(path).await.map_err(io_err)?;
    let mut total = 0u64;

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| AutomationError::Download(e.to_string()))?
    {
        file.write_all(&chunk).await.map_err(io_err)?;
        total += chunk.len() as u64;
    }

    file.flush().await.map_err(io_err)?;
    debug!("Wrote {} bytes to {}", total, path.display());
    Ok(total)
}

/// `video_<prompt prefix>_<YYYYmmdd_HHMMSS>.mp4`
///
/// Whitespace becomes `_`; anything other than ASCII alphanumerics, space,
/// `-`, `_` and `.` is dropped.
pub fn artifact_filename(prompt: &str, now: DateTime<Utc>) -> String {
    let prefix: String = prompt.chars().take(PROMPT_PREFIX_CHARS).collect();
    let raw = format!("video_{}_{}.mp4", prefix, now.format("%Y%m%d_%H%M%S"));

    raw.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| is_filename_char(*c))
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Characters allowed in artifact file names
pub fn is_filename_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::FakeDriver;
    use chrono::TimeZone;
    use relay_driver::Locator;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(max_attempts: u32) -> PollSettings {
        PollSettings {
            grace: Duration::ZERO,
            interval: Duration::ZERO,
            max_attempts,
        }
    }

    fn poller(driver: Arc<FakeDriver>, dir: &Path, max_attempts: u32) -> CompletionPoller {
        CompletionPoller::new(
            driver,
            reqwest::Client::new(),
            settings(max_attempts),
            dir.to_path_buf(),
            ElementLocator::new("artifact", vec![Locator::css("video")]),
        )
    }

    #[test]
    fn test_artifact_filename_format() {
        let now = Utc.with_ymd_and_hms(2025, 8, 27, 18, 15, 0).unwrap();
        assert_eq!(
            artifact_filename("dog running in a park", now),
            "video_dog_running_in_a_par_20250827_181500.mp4"
        );
    }

    #[test]
    fn test_artifact_filename_strips_unsafe_characters() {
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let prompts = [
            "../../etc/passwd",
            "a/b\\c:d*e?f\"g<h>i|j",
            "tab\tnew\nline\r\0nul",
            "émoji 🎬 ünïcödé",
            "",
        ];

        for prompt in prompts {
            let name = artifact_filename(prompt, now);
            assert!(name.chars().all(is_filename_char), "unsafe name: {:?}", name);
            assert!(name.starts_with("video_"));
            assert!(name.ends_with("_20250102_030405.mp4"));
            assert!(!name.contains('/'));
        }
    }

    #[tokio::test]
    async fn test_downloads_artifact_on_first_hit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fake video bytes".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let driver = Arc::new(FakeDriver::new());
        driver.with(|s| {
            s.artifact_after_checks = Some(2);
            s.artifact_url = format!("{}/v.mp4", server.uri());
        });
        let session = driver.start_session(Path::new("/tmp/U1")).await.unwrap();

        let filename = poller(driver.clone(), dir.path(), 5)
            .wait_for_artifact(&session, "dog running in a park")
            .await
            .unwrap()
            .unwrap();

        assert!(filename.starts_with("video_dog_running_in_a_par_"));
        let bytes = std::fs::read(dir.path().join(&filename)).unwrap();
        assert_eq!(bytes, b"fake video bytes");
        assert_eq!(driver.with(|s| s.artifact_checks), 2);
    }

    #[tokio::test]
    async fn test_exhaustion_is_soft_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let driver = Arc::new(FakeDriver::new());
        driver.with(|s| s.artifact_after_checks = None);
        let session = driver.start_session(Path::new("/tmp/U1")).await.unwrap();

        let result = poller(driver.clone(), dir.path(), 4)
            .wait_for_artifact(&session, "cat")
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(driver.with(|s| s.artifact_checks), 4);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_polling() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v.mp4"))
            .respond_with(ResponseTemplate::new(403))
            .expect(3)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let driver = Arc::new(FakeDriver::new());
        driver.with(|s| s.artifact_url = format!("{}/v.mp4", server.uri()));
        let session = driver.start_session(Path::new("/tmp/U1")).await.unwrap();

        let result = poller(driver, dir.path(), 3)
            .wait_for_artifact(&session, "cat")
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_same_second_artifacts_get_distinct_names() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"first video".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"second video".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let poller = poller(Arc::new(FakeDriver::new()), dir.path(), 1);
        let now = Utc.with_ymd_and_hms(2025, 8, 27, 18, 15, 0).unwrap();
        let base = artifact_filename("same prompt", now);
        let url_a = format!("{}/a.mp4", server.uri());
        let url_b = format!("{}/b.mp4", server.uri());

        let (a, b) = tokio::join!(
            poller.store_artifact(&url_a, &base),
            poller.store_artifact(&url_b, &base),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_ne!(a, b);
        let mut names = vec![a.clone(), b.clone()];
        names.sort();
        assert_eq!(
            names,
            vec![base.clone(), "video_same_prompt_20250827_181500_2.mp4".to_string()]
        );
        assert_eq!(std::fs::read(dir.path().join(&a)).unwrap(), b"first video");
        assert_eq!(std::fs::read(dir.path().join(&b)).unwrap(), b"second video");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }
}
