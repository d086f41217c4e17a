//! In-memory repository and fake runner doubles for executor/HTTP tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use function_core::domains::function::{Function, FunctionRepository, RepositoryError as FnRepoError};
use function_core::domains::job::{Job, JobRepository, RepositoryError as JobRepoError};
use function_core::executor::{Runner, RunnerError};
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryFunctionRepository {
    functions: Mutex<HashMap<Uuid, Function>>,
}

#[async_trait]
impl FunctionRepository for InMemoryFunctionRepository {
    async fn create(&self, function: &Function) -> Result<(), FnRepoError> {
        self.functions
            .lock()
            .unwrap()
            .insert(function.id, function.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Function, FnRepoError> {
        self.functions
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(FnRepoError::NotFound)
    }

    async fn list(&self) -> Result<Vec<Function>, FnRepoError> {
        let mut functions: Vec<Function> = self.functions.lock().unwrap().values().cloned().collect();
        functions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(functions)
    }
}

#[derive(Default)]
pub struct InMemoryJobRepository {
    jobs: Mutex<HashMap<Uuid, Job>>,
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn create(&self, job: &Job) -> Result<(), JobRepoError> {
        self.jobs.lock().unwrap().insert(job.id, job.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Job, JobRepoError> {
        self.jobs
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(JobRepoError::NotFound)
    }

    async fn update(&self, job: &Job) -> Result<(), JobRepoError> {
        self.jobs.lock().unwrap().insert(job.id, job.clone());
        Ok(())
    }

    async fn list_running(&self) -> Result<Vec<Job>, JobRepoError> {
        use function_core::domains::job::JobStatus;
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .values()
            .filter(|j| j.status == JobStatus::Running)
            .cloned()
            .collect())
    }
}

/// A runner whose behavior is scripted per test instead of touching a
/// real Docker daemon.
pub enum FakeRunner {
    Echo,
    Fail(String),
    /// Simulates `DockerRunner`'s own internal deadline firing, so tests
    /// can exercise the scheduler's handling of that error without a real
    /// 30-second wait on a live container.
    DeadlineExceeded(u64),
}

#[async_trait]
impl Runner for FakeRunner {
    async fn run(&self, function: &Function) -> Result<String, RunnerError> {
        match self {
            FakeRunner::Echo => Ok(format!("{}\\n", function.code)),
            FakeRunner::Fail(message) => Err(RunnerError::ContainerCreate(message.clone())),
            FakeRunner::DeadlineExceeded(secs) => Err(RunnerError::DeadlineExceeded(*secs)),
        }
    }
}
