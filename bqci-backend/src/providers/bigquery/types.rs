//! BigQuery REST request and response types

use bqci_core::JobState;
use serde::{Deserialize, Serialize};

// ============================================================================
// REFERENCES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReference {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetReference {
    pub project_id: String,
    pub dataset_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReference {
    pub project_id: String,
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

// ============================================================================
// JOB TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInsertRequest {
    pub job_reference: JobReference,
    pub configuration: JobConfiguration,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<QueryJobConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copy: Option<CopyJobConfig>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryJobConfig {
    pub query: String,
    pub use_legacy_sql: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyJobConfig {
    pub source_table: TableReference,
    pub destination_table: TableReference,
    /// `SNAPSHOT` or `CLONE`
    pub operation_type: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub job_reference: JobReference,
    #[serde(default)]
    pub status: Option<JobStatus>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    /// `PENDING`, `RUNNING` or `DONE`
    pub state: String,
    #[serde(default)]
    pub error_result: Option<ErrorProto>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorProto {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl ErrorProto {
    pub fn describe(&self) -> String {
        match (&self.reason, &self.message) {
            (Some(reason), Some(message)) => format!("{}: {}", reason, message),
            (None, Some(message)) => message.clone(),
            (Some(reason), None) => reason.clone(),
            (None, None) => "unknown error".to_string(),
        }
    }
}

impl Job {
    /// Interpret the job status. A job with no status yet is pending.
    pub fn state(&self) -> JobState {
        match &self.status {
            Some(status) if status.state == "DONE" => match &status.error_result {
                Some(error) => JobState::Failed(error.describe()),
                None => JobState::Succeeded,
            },
            _ => JobState::Pending,
        }
    }
}

// ============================================================================
// DATASET TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetInsertRequest {
    pub dataset_reference: DatasetReference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: u16,
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(json: &str) -> Job {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_running_job_is_pending() {
        let job = job(r#"{
            "jobReference": {"projectId": "acme", "jobId": "bqci_1", "location": "US"},
            "status": {"state": "RUNNING"}
        }"#);
        assert_eq!(job.state(), JobState::Pending);
        assert_eq!(job.job_reference.location.as_deref(), Some("US"));
    }

    #[test]
    fn test_done_without_error_succeeds() {
        let job = job(r#"{
            "jobReference": {"projectId": "acme", "jobId": "bqci_1"},
            "status": {"state": "DONE"}
        }"#);
        assert_eq!(job.state(), JobState::Succeeded);
    }

    #[test]
    fn test_done_with_error_result_fails() {
        let job = job(r#"{
            "jobReference": {"projectId": "acme", "jobId": "bqci_1"},
            "status": {
                "state": "DONE",
                "errorResult": {"reason": "notFound", "message": "Not found: Table acme:ds.t9"},
                "errors": [{"reason": "notFound", "message": "Not found: Table acme:ds.t9"}]
            }
        }"#);
        assert_eq!(
            job.state(),
            JobState::Failed("notFound: Not found: Table acme:ds.t9".to_string())
        );
    }

    #[test]
    fn test_missing_status_is_pending() {
        let job = job(r#"{"jobReference": {"projectId": "acme", "jobId": "bqci_1"}}"#);
        assert_eq!(job.state(), JobState::Pending);
    }

    #[test]
    fn test_query_insert_serializes_camel_case() {
        let request = JobInsertRequest {
            job_reference: JobReference {
                project_id: "acme".to_string(),
                job_id: "bqci_1".to_string(),
                location: None,
            },
            configuration: JobConfiguration {
                query: Some(QueryJobConfig {
                    query: "SELECT 1;".to_string(),
                    use_legacy_sql: false,
                }),
                copy: None,
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["configuration"]["query"]["useLegacySql"], false);
        assert_eq!(value["jobReference"]["jobId"], "bqci_1");
        assert!(value["configuration"].get("copy").is_none());
        assert!(value["jobReference"].get("location").is_none());
    }

    #[test]
    fn test_api_error_body() {
        let err: ApiError = serde_json::from_str(
            r#"{"error": {"code": 409, "message": "Already Exists: Dataset acme:dev", "status": "ALREADY_EXISTS"}}"#,
        )
        .unwrap();
        assert_eq!(err.error.code, 409);
        assert_eq!(err.error.status.as_deref(), Some("ALREADY_EXISTS"));
    }
}
