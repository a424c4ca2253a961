//! Integration tests for the job ingestion/status/artifact HTTP surface.
//!
//! These tests require a running master bound to `API_URL`, with NATS and
//! Postgres reachable behind it (`schema.sql` applied, `md5_phone_map_bin`
//! seeded). Run `cargo run -p master` (with its dependencies up) before
//! running these tests.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_URL: &str = "http://localhost:8080";

#[derive(Debug, Serialize, Deserialize)]
struct CreateJobResponse {
    #[serde(rename = "jobId")]
    job_id: String,
    #[serde(rename = "droppedLines")]
    dropped_lines: u64,
}

#[derive(Debug, Deserialize)]
struct JobRow {
    #[serde(rename = "jobId")]
    job_id: String,
    status: String,
    #[serde(rename = "totalHashes")]
    total_hashes: i64,
    #[serde(rename = "batchesExpected")]
    batches_expected: i32,
    #[serde(rename = "batchesCompleted")]
    batches_completed: i32,
    #[serde(rename = "foundCount")]
    found_count: i64,
}

async fn server_running(client: &reqwest::Client) -> bool {
    client
        .get(format!("{API_URL}/health"))
        .send()
        .await
        .is_ok()
}

async fn upload(client: &reqwest::Client, body: &str) -> CreateJobResponse {
    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(body.as_bytes().to_vec()).file_name("hashes.txt"),
    );

    let response = client
        .post(format!("{API_URL}/api/jobs"))
        .multipart(form)
        .send()
        .await
        .expect("failed to upload job");

    assert_eq!(response.status(), reqwest::StatusCode::ACCEPTED);
    response.json().await.expect("failed to parse response")
}

async fn poll_until_completed(client: &reqwest::Client, job_id: &str) -> JobRow {
    for _ in 0..30 {
        let job: JobRow = client
            .get(format!("{API_URL}/api/jobs/{job_id}"))
            .send()
            .await
            .expect("failed to fetch job")
            .json()
            .await
            .expect("failed to parse job");

        if job.status == "COMPLETED" {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    panic!("job {job_id} never completed");
}

#[tokio::test]
async fn empty_upload_completes_immediately_with_header_only_csv() {
    let client = reqwest::Client::new();
    if !server_running(&client).await {
        println!("Skipping test: master not running at {API_URL}");
        return;
    }

    let created = upload(&client, "\n\nshort\ntoolonghashvalueabcdefabcdefabcdefabc\n").await;
    assert_eq!(created.dropped_lines, 2);

    let job = poll_until_completed(&client, &created.job_id).await;
    assert_eq!(job.total_hashes, 0);
    assert_eq!(job.batches_expected, 0);
    assert_eq!(job.batches_completed, 0);
    assert_eq!(job.found_count, 0);

    let csv = client
        .get(format!("{API_URL}/api/jobs/{}/results", created.job_id))
        .send()
        .await
        .expect("failed to fetch results")
        .text()
        .await
        .expect("failed to read body");
    assert_eq!(csv, "hash,phone\n");
}

#[tokio::test]
async fn unknown_job_returns_not_found() {
    let client = reqwest::Client::new();
    if !server_running(&client).await {
        println!("Skipping test: master not running at {API_URL}");
        return;
    }

    let response = client
        .get(format!(
            "{API_URL}/api/jobs/00000000-0000-0000-0000-000000000000"
        ))
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    let response = client
        .get(format!(
            "{API_URL}/api/jobs/00000000-0000-0000-0000-000000000000/results"
        ))
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mixed_valid_and_invalid_lines_yields_only_valid_targets() {
    let client = reqwest::Client::new();
    if !server_running(&client).await {
        println!("Skipping test: master not running at {API_URL}");
        return;
    }

    let body = "a1b2c3d4e5f6789012345678901234ab\nshort\n\
                1234567890abcdef1234567890abcdef\n\n\
                fedcba0987654321fedcba0987654321";
    let created = upload(&client, body).await;

    let job = poll_until_completed(&client, &created.job_id).await;
    assert_eq!(job.total_hashes, 3);
    assert_eq!(job.batches_expected, 1);
}

#[tokio::test]
async fn list_jobs_only_returns_completed() {
    let client = reqwest::Client::new();
    if !server_running(&client).await {
        println!("Skipping test: master not running at {API_URL}");
        return;
    }

    let created = upload(&client, "deadbeefdeadbeefdeadbeefdeadbeef").await;
    poll_until_completed(&client, &created.job_id).await;

    let jobs: Vec<JobRow> = client
        .get(format!("{API_URL}/api/jobs"))
        .send()
        .await
        .expect("failed to list jobs")
        .json()
        .await
        .expect("failed to parse jobs");

    assert!(jobs.iter().all(|j| j.status == "COMPLETED"));
    assert!(jobs.iter().any(|j| j.job_id == created.job_id));
}
