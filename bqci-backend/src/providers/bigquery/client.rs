//! BigQuery HTTP client

use super::types::{
    ApiError, CopyJobConfig, DatasetInsertRequest, DatasetReference, Job, JobConfiguration,
    JobInsertRequest, JobReference, QueryJobConfig, TableReference,
};
use crate::{CatalogBackend, CopyRequest, QueryBackend};
use async_trait::async_trait;
use bqci_core::{BackendError, BigQueryConfig, DatasetRef, JobHandle, JobState, TableRef};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// BigQuery v2 REST client.
///
/// Cheap to share behind an `Arc`; `reqwest::Client` pools connections
/// internally and every call is independent.
pub struct BigQueryClient {
    client: Client,
    config: BigQueryConfig,
    base_url: String,
    /// Jobs whose insert response was already DONE, keyed by job id.
    /// Consumed by the first `poll` of that job.
    settled: Mutex<HashMap<String, JobState>>,
}

/// What a request was about, for error messages.
struct Call<'a> {
    endpoint: &'static str,
    resource: &'a str,
}

impl BigQueryClient {
    pub fn new(config: BigQueryConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| BackendError::Transport {
                reason: format!("Failed to build HTTP client: {}", e),
            })?;
        let base_url = config.api_base_url.trim_end_matches('/').to_string();

        Ok(Self {
            client,
            config,
            base_url,
            settled: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &BigQueryConfig {
        &self.config
    }

    fn new_job_reference(&self) -> JobReference {
        JobReference {
            project_id: self.config.project_id.clone(),
            job_id: format!("bqci_{}", Uuid::now_v7().simple()),
            location: self.config.location.clone(),
        }
    }

    fn job_request(&self, method: Method, job: &JobHandle, suffix: &str) -> RequestBuilder {
        let url = format!(
            "{}/projects/{}/jobs/{}{}",
            self.base_url, self.config.project_id, job.job_id, suffix
        );
        let request = self.client.request(method, url);
        match job.location.as_ref().or(self.config.location.as_ref()) {
            Some(location) => request.query(&[("location", location)]),
            None => request,
        }
    }

    fn settled(&self) -> MutexGuard<'_, HashMap<String, JobState>> {
        self.settled.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Handle for an inserted job, remembering its state if it already finished.
    fn record_insert(&self, job: Job) -> JobHandle {
        let state = job.state();
        let mut handle = JobHandle::new(job.job_reference.job_id);
        if let Some(location) = job.job_reference.location {
            handle = handle.with_location(location);
        }
        if state.is_done() {
            self.settled().insert(handle.job_id.clone(), state);
        }
        handle
    }

    async fn insert_job(&self, configuration: JobConfiguration, call: Call<'_>) -> Result<JobHandle, BackendError> {
        let body = JobInsertRequest {
            job_reference: self.new_job_reference(),
            configuration,
        };
        let url = format!("{}/projects/{}/jobs", self.base_url, self.config.project_id);
        let job: Job = self.send_json(self.client.post(&url).json(&body), &call).await?;
        Ok(self.record_insert(job))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        call: &Call<'_>,
    ) -> Result<T, BackendError> {
        let response = self.send(request, call).await?;
        response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse {
                reason: format!("{}: failed to parse response: {}", call.endpoint, e),
            })
    }

    async fn send(&self, request: RequestBuilder, call: &Call<'_>) -> Result<reqwest::Response, BackendError> {
        let response = request
            .bearer_auth(&self.config.access_token)
            .send()
            .await
            .map_err(|e| BackendError::Transport {
                reason: format!("{}: {}", call.endpoint, e),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = match serde_json::from_str::<ApiError>(&error_text) {
            Ok(api_error) => api_error.error.message,
            Err(_) => error_text,
        };
        Err(classify_error(status, call, message))
    }
}

fn classify_error(status: StatusCode, call: &Call<'_>, message: String) -> BackendError {
    match status {
        StatusCode::BAD_REQUEST if call.endpoint == "jobs.insert(query)" => {
            BackendError::MalformedQuery { message }
        }
        StatusCode::NOT_FOUND => BackendError::NotFound {
            resource: call.resource.to_string(),
        },
        StatusCode::CONFLICT => BackendError::AlreadyExists {
            resource: call.resource.to_string(),
        },
        _ => BackendError::RequestFailed {
            endpoint: call.endpoint.to_string(),
            status: status.as_u16(),
            message,
        },
    }
}

fn table_reference(table: &TableRef) -> TableReference {
    TableReference {
        project_id: table.project_id.clone(),
        dataset_id: table.dataset_id.clone(),
        table_id: table.table_id.clone(),
    }
}

#[async_trait]
impl QueryBackend for BigQueryClient {
    async fn submit(&self, query: &str) -> Result<JobHandle, BackendError> {
        let configuration = JobConfiguration {
            query: Some(QueryJobConfig {
                query: query.to_string(),
                use_legacy_sql: false,
            }),
            copy: None,
        };
        let handle = self
            .insert_job(
                configuration,
                Call {
                    endpoint: "jobs.insert(query)",
                    resource: "query job",
                },
            )
            .await?;
        tracing::debug!(job = %handle, "Query job submitted");
        Ok(handle)
    }

    async fn poll(&self, job: &JobHandle) -> Result<JobState, BackendError> {
        if let Some(state) = self.settled().remove(&job.job_id) {
            return Ok(state);
        }
        let call = Call {
            endpoint: "jobs.get",
            resource: &job.job_id,
        };
        let response: Job = self
            .send_json(self.job_request(Method::GET, job, ""), &call)
            .await?;
        Ok(response.state())
    }

    async fn cancel(&self, job: &JobHandle) -> Result<(), BackendError> {
        let call = Call {
            endpoint: "jobs.cancel",
            resource: &job.job_id,
        };
        self.settled().remove(&job.job_id);
        self.send(self.job_request(Method::POST, job, "/cancel"), &call)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogBackend for BigQueryClient {
    fn default_project(&self) -> &str {
        &self.config.project_id
    }

    async fn get_dataset(&self, dataset: &DatasetRef) -> Result<(), BackendError> {
        let url = format!(
            "{}/projects/{}/datasets/{}",
            self.base_url, dataset.project_id, dataset.dataset_id
        );
        let resource = format!("Dataset {}", dataset);
        self.send(
            self.client.get(url),
            &Call {
                endpoint: "datasets.get",
                resource: &resource,
            },
        )
        .await?;
        Ok(())
    }

    async fn create_dataset(&self, dataset: &DatasetRef) -> Result<(), BackendError> {
        let url = format!("{}/projects/{}/datasets", self.base_url, dataset.project_id);
        let body = DatasetInsertRequest {
            dataset_reference: DatasetReference {
                project_id: dataset.project_id.clone(),
                dataset_id: dataset.dataset_id.clone(),
            },
            location: self.config.location.clone(),
        };
        let resource = format!("Dataset {}", dataset);
        self.send(
            self.client.post(url).json(&body),
            &Call {
                endpoint: "datasets.insert",
                resource: &resource,
            },
        )
        .await?;
        tracing::info!(dataset = %dataset, "Dataset created");
        Ok(())
    }

    async fn get_table(&self, table: &TableRef) -> Result<(), BackendError> {
        let url = format!(
            "{}/projects/{}/datasets/{}/tables/{}",
            self.base_url, table.project_id, table.dataset_id, table.table_id
        );
        let resource = format!("Table {}", table);
        self.send(
            self.client.get(url),
            &Call {
                endpoint: "tables.get",
                resource: &resource,
            },
        )
        .await?;
        Ok(())
    }

    async fn submit_copy(&self, request: &CopyRequest) -> Result<JobHandle, BackendError> {
        let mut source_table = table_reference(&request.source);
        source_table.table_id = request.source_table_id();

        let configuration = JobConfiguration {
            query: None,
            copy: Some(CopyJobConfig {
                source_table,
                destination_table: table_reference(&request.destination),
                operation_type: request.operation.as_str().to_string(),
            }),
        };
        let resource = request.destination.to_string();
        self.insert_job(
            configuration,
            Call {
                endpoint: "jobs.insert(copy)",
                resource: &resource,
            },
        )
        .await
    }
}

impl std::fmt::Debug for BigQueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BigQueryClient")
            .field("base_url", &self.base_url)
            .field("project_id", &self.config.project_id)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(location: Option<&str>) -> BigQueryClient {
        let mut config = BigQueryConfig::new("acme", "token");
        config.api_base_url = "https://bq.example.test/bigquery/v2/".to_string();
        config.location = location.map(str::to_string);
        BigQueryClient::new(config).unwrap()
    }

    fn job_url(client: &BigQueryClient, method: Method, job: &JobHandle, suffix: &str) -> String {
        client
            .job_request(method, job, suffix)
            .build()
            .unwrap()
            .url()
            .to_string()
    }

    fn inserted(json: &str) -> Job {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_job_url_uses_handle_location_first() {
        let client = client(Some("US"));
        let job = JobHandle::new("bqci_1").with_location("EU");
        assert_eq!(
            job_url(&client, Method::GET, &job, ""),
            "https://bq.example.test/bigquery/v2/projects/acme/jobs/bqci_1?location=EU"
        );
        assert_eq!(
            job_url(&client, Method::POST, &JobHandle::new("bqci_2"), "/cancel"),
            "https://bq.example.test/bigquery/v2/projects/acme/jobs/bqci_2/cancel?location=US"
        );
    }

    #[test]
    fn test_job_url_without_location() {
        let client = client(None);
        assert_eq!(
            job_url(&client, Method::GET, &JobHandle::new("bqci_1"), ""),
            "https://bq.example.test/bigquery/v2/projects/acme/jobs/bqci_1"
        );
    }

    #[test]
    fn test_job_url_encodes_location() {
        let client = client(None);
        let job = JobHandle::new("bqci_1").with_location("asia east&x=1");
        assert_eq!(
            job_url(&client, Method::GET, &job, ""),
            "https://bq.example.test/bigquery/v2/projects/acme/jobs/bqci_1?location=asia+east%26x%3D1"
        );
    }

    #[tokio::test]
    async fn test_insert_already_failed_is_reported_on_first_poll() {
        // Unroutable base URL: any request that reaches the network fails with Transport.
        let mut config = BigQueryConfig::new("acme", "token");
        config.api_base_url = "http://127.0.0.1:9".to_string();
        let client = BigQueryClient::new(config).unwrap();

        let handle = client.record_insert(inserted(
            r#"{
                "jobReference": {"projectId": "acme", "jobId": "bqci_1", "location": "US"},
                "status": {"state": "DONE", "errorResult": {"reason": "invalidQuery", "message": "Unrecognized name: x"}}
            }"#,
        ));
        assert_eq!(handle.location.as_deref(), Some("US"));
        assert_eq!(
            client.poll(&handle).await.unwrap(),
            JobState::Failed("invalidQuery: Unrecognized name: x".to_string())
        );
        assert!(client.settled().is_empty());
    }

    #[test]
    fn test_insert_still_running_is_not_recorded() {
        let client = client(None);
        let handle = client.record_insert(inserted(
            r#"{"jobReference": {"projectId": "acme", "jobId": "bqci_2"}, "status": {"state": "RUNNING"}}"#,
        ));
        assert_eq!(handle.job_id, "bqci_2");
        assert!(client.settled().is_empty());
    }

    #[test]
    fn test_new_job_reference_is_unique() {
        let client = client(None);
        let a = client.new_job_reference();
        let b = client.new_job_reference();
        assert!(a.job_id.starts_with("bqci_"));
        assert_ne!(a.job_id, b.job_id);
    }

    #[test]
    fn test_classify_error() {
        let query = Call {
            endpoint: "jobs.insert(query)",
            resource: "query job",
        };
        assert!(matches!(
            classify_error(StatusCode::BAD_REQUEST, &query, "Syntax error".to_string()),
            BackendError::MalformedQuery { .. }
        ));

        let dataset = Call {
            endpoint: "datasets.insert",
            resource: "Dataset acme.dev",
        };
        assert_eq!(
            classify_error(StatusCode::CONFLICT, &dataset, "exists".to_string()),
            BackendError::AlreadyExists {
                resource: "Dataset acme.dev".to_string()
            }
        );
        assert!(matches!(
            classify_error(StatusCode::BAD_REQUEST, &dataset, "bad".to_string()),
            BackendError::RequestFailed { status: 400, .. }
        ));
        assert!(matches!(
            classify_error(StatusCode::NOT_FOUND, &dataset, "missing".to_string()),
            BackendError::NotFound { .. }
        ));
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", client(None));
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("\"token\""));
    }
}
