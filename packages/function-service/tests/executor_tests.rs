mod support;

use std::sync::Arc;
use std::time::Duration;

use function_core::domains::function::{Function, FunctionRepository};
use function_core::domains::job::{Job, JobRepository, JobStatus};
use function_core::executor::{ExecRequest, Executor};
use support::{FakeRunner, InMemoryFunctionRepository, InMemoryJobRepository};

async fn wait_for_terminal(job_repo: &InMemoryJobRepository, job_id: uuid::Uuid) -> Job {
    for _ in 0..200 {
        let job = job_repo.get_by_id(job_id).await.unwrap();
        if matches!(job.status, JobStatus::Done | JobStatus::Error) {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("job never reached a terminal state");
}

#[tokio::test]
async fn happy_path_marks_job_done_with_transcript() {
    let function_repo = Arc::new(InMemoryFunctionRepository::default());
    let job_repo = Arc::new(InMemoryJobRepository::default());
    let runner = Arc::new(FakeRunner::Echo);

    let function = Function::new("u1".into(), "print(1+1)".into(), "python".into());
    function_repo.create(&function).await.unwrap();

    let job = Job::new(function.id);
    job_repo.create(&job).await.unwrap();

    let executor = Arc::new(Executor::new(job_repo.clone(), function_repo, runner, 2));
    executor.start();
    executor
        .enqueue(ExecRequest {
            job_id: job.id,
            function_id: function.id,
        })
        .await;

    let terminal = wait_for_terminal(&job_repo, job.id).await;
    assert_eq!(terminal.status, JobStatus::Done);
    assert_eq!(terminal.result, "print(1+1)\\n");
    executor.stop();
}

#[tokio::test]
async fn missing_function_marks_job_error() {
    let function_repo = Arc::new(InMemoryFunctionRepository::default());
    let job_repo = Arc::new(InMemoryJobRepository::default());
    let runner = Arc::new(FakeRunner::Echo);

    let orphan_function_id = uuid::Uuid::new_v4();
    let job = Job::new(orphan_function_id);
    job_repo.create(&job).await.unwrap();

    let executor = Arc::new(Executor::new(job_repo.clone(), function_repo, runner, 1));
    executor.start();
    executor
        .enqueue(ExecRequest {
            job_id: job.id,
            function_id: orphan_function_id,
        })
        .await;

    let terminal = wait_for_terminal(&job_repo, job.id).await;
    assert_eq!(terminal.status, JobStatus::Error);
    assert_eq!(terminal.result, "function not found");
    executor.stop();
}

#[tokio::test]
async fn runner_failure_marks_job_error_with_runner_message() {
    let function_repo = Arc::new(InMemoryFunctionRepository::default());
    let job_repo = Arc::new(InMemoryJobRepository::default());
    let runner = Arc::new(FakeRunner::Fail("container create error: boom".into()));

    let function = Function::new("u1".into(), "code".into(), "python".into());
    function_repo.create(&function).await.unwrap();
    let job = Job::new(function.id);
    job_repo.create(&job).await.unwrap();

    let executor = Arc::new(Executor::new(job_repo.clone(), function_repo, runner, 1));
    executor.start();
    executor
        .enqueue(ExecRequest {
            job_id: job.id,
            function_id: function.id,
        })
        .await;

    let terminal = wait_for_terminal(&job_repo, job.id).await;
    assert_eq!(terminal.status, JobStatus::Error);
    assert!(terminal.result.contains("boom"));
    executor.stop();
}

#[tokio::test]
async fn runner_deadline_marks_job_timed_out() {
    let function_repo = Arc::new(InMemoryFunctionRepository::default());
    let job_repo = Arc::new(InMemoryJobRepository::default());
    // The real 30s deadline is enforced inside `DockerRunner::run`, which
    // needs a live Docker daemon to exercise end to end. `FakeRunner`
    // simulates the error `DockerRunner` would surface so the scheduler's
    // handling of it — marking the job with the exact timeout message and
    // nothing more — is still covered here.
    let runner = Arc::new(FakeRunner::DeadlineExceeded(30));

    let function = Function::new("u1".into(), "code".into(), "python".into());
    function_repo.create(&function).await.unwrap();
    let job = Job::new(function.id);
    job_repo.create(&job).await.unwrap();

    let executor = Arc::new(Executor::new(job_repo.clone(), function_repo, runner, 1));
    executor.start();
    executor
        .enqueue(ExecRequest {
            job_id: job.id,
            function_id: function.id,
        })
        .await;

    let terminal = wait_for_terminal(&job_repo, job.id).await;
    assert_eq!(terminal.status, JobStatus::Error);
    assert_eq!(terminal.result, "job timed out after 30 seconds");
    executor.stop();
}

#[tokio::test]
async fn recover_stranded_jobs_marks_running_jobs_as_error() {
    let function_repo = Arc::new(InMemoryFunctionRepository::default());
    let job_repo = Arc::new(InMemoryJobRepository::default());
    let runner = Arc::new(FakeRunner::Echo);

    let function = Function::new("u1".into(), "code".into(), "python".into());
    function_repo.create(&function).await.unwrap();

    let mut stranded = Job::new(function.id);
    stranded.mark_running();
    job_repo.create(&stranded).await.unwrap();

    let executor = Executor::new(job_repo.clone(), function_repo, runner, 1);
    let recovered = executor.recover_stranded_jobs().await.unwrap();
    assert_eq!(recovered, 1);

    let job = job_repo.get_by_id(stranded.id).await.unwrap();
    assert_eq!(job.status, JobStatus::Error);
    assert_eq!(job.result, "job interrupted by restart");
}
