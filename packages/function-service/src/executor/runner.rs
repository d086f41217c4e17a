//! Sandbox runner — one-shot container execution via the Docker Engine API.

use bollard::container::{
    Config as ContainerConfig, LogOutput, LogsOptions, RemoveContainerOptions,
    WaitContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::Docker;
use futures_util::StreamExt;
use thiserror::Error;
use uuid::Uuid;

use crate::domains::function::Function;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
    #[error("image pull error: {0}")]
    ImagePull(String),
    #[error("container create error: {0}")]
    ContainerCreate(String),
    #[error("container start error: {0}")]
    ContainerStart(String),
    #[error("container wait error: {0}")]
    ContainerWait(String),
    #[error("container exited with code {0}")]
    NonZeroExit(i64),
    #[error("container logs error: {0}")]
    Logs(String),
    #[error("job timed out after {0} seconds")]
    DeadlineExceeded(u64),
}

/// Single-operation capability consumed by the executor. Production uses
/// [`DockerRunner`]; tests inject a deterministic fake.
#[async_trait::async_trait]
pub trait Runner: Send + Sync {
    async fn run(&self, function: &Function) -> Result<String, RunnerError>;
}

pub struct DockerRunner {
    client: Docker,
    job_deadline_secs: u64,
}

impl DockerRunner {
    pub fn new(job_deadline_secs: u64) -> Result<Self, bollard::errors::Error> {
        let client = Docker::connect_with_local_defaults()?;
        Ok(Self {
            client,
            job_deadline_secs,
        })
    }

    fn select_image_and_command(language: &str, code: &str) -> Result<(String, Vec<String>), RunnerError> {
        match language {
            "python" => Ok((
                "python:3.10-alpine".to_string(),
                vec!["python".to_string(), "-c".to_string(), code.to_string()],
            )),
            "go" => Err(RunnerError::UnsupportedLanguage(language.to_string())),
            _ => Ok((
                "alpine".to_string(),
                vec!["echo".to_string(), code.to_string()],
            )),
        }
    }

    async fn pull_if_not_exists(&self, image: &str) -> Result<(), RunnerError> {
        if self.client.inspect_image(image).await.is_ok() {
            return Ok(());
        }

        let options = Some(CreateImageOptions {
            from_image: image,
            ..Default::default()
        });

        let mut stream = self.client.create_image(options, None, None);
        while let Some(result) = stream.next().await {
            result.map_err(|e| RunnerError::ImagePull(e.to_string()))?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Runner for DockerRunner {
    async fn run(&self, function: &Function) -> Result<String, RunnerError> {
        let (image, cmd) = Self::select_image_and_command(&function.language, &function.code)?;

        self.pull_if_not_exists(&image).await?;

        let container_name = format!(
            "fn-{}-{}",
            function.language,
            Uuid::new_v4().simple().to_string().chars().take(8).collect::<String>()
        );

        let container_config = ContainerConfig {
            image: Some(image),
            cmd: Some(cmd),
            tty: Some(false),
            ..Default::default()
        };

        let container = self
            .client
            .create_container::<&str, String>(
                Some(bollard::container::CreateContainerOptions {
                    name: &container_name,
                    platform: None,
                }),
                container_config,
            )
            .await
            .map_err(|e| RunnerError::ContainerCreate(e.to_string()))?;
        let container_id = container.id;

        let result = self.run_and_collect(&container_id).await;

        let _ = self
            .client
            .remove_container(
                &container_id,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await;

        result
    }
}

impl DockerRunner {
    async fn run_and_collect(&self, container_id: &str) -> Result<String, RunnerError> {
        self.client
            .start_container::<String>(container_id, None)
            .await
            .map_err(|e| RunnerError::ContainerStart(e.to_string()))?;

        let wait = tokio::time::timeout(
            std::time::Duration::from_secs(self.job_deadline_secs),
            self.client
                .wait_container(container_id, None::<WaitContainerOptions<String>>)
                .next(),
        )
        .await;

        match wait {
            Err(_) => return Err(RunnerError::DeadlineExceeded(self.job_deadline_secs)),
            Ok(None) => {}
            Ok(Some(Ok(response))) => {
                if response.status_code != 0 {
                    return Err(RunnerError::NonZeroExit(response.status_code));
                }
            }
            Ok(Some(Err(e))) => return Err(RunnerError::ContainerWait(e.to_string())),
        }

        self.collect_logs(container_id).await
    }

    async fn collect_logs(&self, container_id: &str) -> Result<String, RunnerError> {
        let mut stream = self.client.logs(
            container_id,
            Some(LogsOptions::<String> {
                stdout: true,
                stderr: true,
                ..Default::default()
            }),
        );

        let mut stdout_buf = String::new();
        let mut stderr_buf = String::new();
        while let Some(chunk) = stream.next().await {
            match chunk.map_err(|e| RunnerError::Logs(e.to_string()))? {
                LogOutput::StdOut { message } => {
                    stdout_buf.push_str(&String::from_utf8_lossy(&message));
                }
                LogOutput::StdErr { message } => {
                    stderr_buf.push_str(&String::from_utf8_lossy(&message));
                }
                _ => {}
            }
        }

        let mut combined = stdout_buf;
        combined.push_str(&stderr_buf);
        Ok(sanitize(&combined))
    }
}

/// Strips control bytes and collapses newlines into the literal `\n` escape,
/// guaranteeing the transcript contains no raw newline or control byte.
/// Idempotent: sanitizing an already-sanitized transcript is a no-op.
fn sanitize(raw: &str) -> String {
    const STRIP: [u8; 13] = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x0B, 0x0C, 0x0E, 0x0F,
    ];

    // All stripped bytes are single-byte ASCII control codes, so removing
    // them never splits a multi-byte UTF-8 sequence; re-decoding the
    // filtered bytes (rather than casting each byte to a `char`) keeps
    // non-ASCII transcript output intact.
    let filtered_bytes: Vec<u8> = raw.bytes().filter(|b| !STRIP.contains(b)).collect();
    let filtered = String::from_utf8(filtered_bytes)
        .expect("stripping ASCII control bytes preserves UTF-8 validity");

    let mut out = String::with_capacity(filtered.len());
    let mut chars = filtered.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\\n");
            }
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}
