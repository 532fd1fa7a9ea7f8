//! Job-related API endpoints

use crate::OrchestratorClient;
use crate::error::Result;
use relay_core::domain::job::Job;
use relay_core::dto::job::{JobAccepted, SessionsOverview, SubmitJob};

impl OrchestratorClient {
    /// Submit an automation job on `route`.
    ///
    /// Returns as soon as the orchestrator has queued the job; progress is
    /// reported to the request's callback URL.
    pub async fn submit_job(&self, route: &str, req: &SubmitJob) -> Result<JobAccepted> {
        let url = self.url(&format!("/automation/{}", route));
        tracing::debug!("Submitting job to {}", url);
        let response = self.client.post(&url).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Get the history row of a job
    pub async fn get_job(&self, job_id: &str) -> Result<Job> {
        let url = self.url(&format!("/jobs/{}", job_id));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Jobs currently queued or running
    pub async fn sessions(&self) -> Result<SessionsOverview> {
        let response = self.client.get(self.url("/sessions")).send().await?;

        self.handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use crate::OrchestratorClient;
    use relay_core::domain::job::JobStatus;
    use relay_core::dto::job::SubmitJob;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_submit_job() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/automation/google-flow"))
            .and(body_partial_json(json!({ "jobId": "J1", "userId": "U1" })))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({
                "status": "accepted",
                "jobId": "J1",
                "message": "Job J1 accepted for processing",
                "action": "create_project"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OrchestratorClient::new(server.uri());
        let req = SubmitJob {
            job_id: Some("J1".to_string()),
            user_id: Some("U1".to_string()),
            ..Default::default()
        };
        let accepted = client.submit_job("google-flow", &req).await.unwrap();

        assert_eq!(accepted.job_id, "J1");
        assert_eq!(accepted.status, "accepted");
    }

    #[tokio::test]
    async fn test_submit_job_surfaces_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(503)
                    .set_body_json(json!({ "error": "Job queue is full, try again later" })),
            )
            .mount(&server)
            .await;

        let client = OrchestratorClient::new(server.uri());
        let err = client
            .submit_job("google-flow", &SubmitJob::default())
            .await
            .unwrap_err();

        assert!(err.is_queue_full());
    }

    #[tokio::test]
    async fn test_get_job() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs/J1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "J1",
                "userId": "U1",
                "prompt": "dog running in a park",
                "model": "video",
                "action": "create_project",
                "route": "google-flow",
                "callbackUrl": "http://caller.example.com/cb",
                "timeoutSeconds": 300,
                "status": "completed_no_artifact",
                "createdAt": "2025-08-27T18:15:00Z",
                "completedAt": "2025-08-27T18:20:00Z",
                "resultArtifact": null,
                "error": null,
                "errorKind": null
            })))
            .mount(&server)
            .await;

        let client = OrchestratorClient::new(server.uri());
        let job = client.get_job("J1").await.unwrap();
        assert_eq!(job.status, JobStatus::CompletedNoArtifact);

        let missing = client.get_job("J2").await.unwrap_err();
        assert!(missing.is_not_found());
    }
}
