//! Import job creation
//!
//! Hands the stored upload over to the contact service. The job runs
//! asynchronously server-side; its later status changes are not tracked.

use crate::client::ContactServiceClient;
use crate::error::{ImportError, Result};
use crate::jsonapi::{Document, NewResource, NewResourceDocument, ToOne};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

const IMPORT_CONTACTS_RESOURCE: &str = "import-contacts";
const IMPORT_CONTACTS_TYPE: &str = "import-contacts";
const UPLOADS_TYPE: &str = "uploads";

/// Server-side import job state
///
/// Only `queued` is acted on; any other value is kept verbatim for logging.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ImportJobStatus {
    Queued,
    Other(String),
}

impl ImportJobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ImportJobStatus::Queued => "queued",
            ImportJobStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for ImportJobStatus {
    fn from(raw: String) -> Self {
        if raw == "queued" {
            ImportJobStatus::Queued
        } else {
            ImportJobStatus::Other(raw)
        }
    }
}

impl Serialize for ImportJobStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for ImportJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `attributes` sent when creating an import
#[derive(Debug, Clone, Serialize)]
pub struct ImportContactAttributes {
    pub status: ImportJobStatus,
    #[serde(rename = "unique-primary-phone")]
    pub unique_primary_phone: bool,
}

/// `relationships` sent when creating an import
#[derive(Debug, Clone, Serialize)]
pub struct ImportContactRelationships {
    pub upload: ToOne,
}

pub type ImportContactRequest =
    NewResourceDocument<ImportContactAttributes, ImportContactRelationships>;

/// Request document creating a queued import for `upload_id`
pub fn import_contact_request(upload_id: &str) -> ImportContactRequest {
    NewResourceDocument {
        data: NewResource {
            kind: IMPORT_CONTACTS_TYPE,
            attributes: ImportContactAttributes {
                status: ImportJobStatus::Queued,
                unique_primary_phone: true,
            },
            relationships: ImportContactRelationships {
                upload: ToOne::new(UPLOADS_TYPE, upload_id),
            },
        },
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ImportJobAttributes {
    #[serde(default)]
    status: Option<ImportJobStatus>,
}

/// Created import job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportJob {
    pub id: String,
    pub status: ImportJobStatus,
}

/// Creates import jobs on the contact service
#[derive(Debug, Clone)]
pub struct ImportSubmitter {
    client: ContactServiceClient,
}

impl ImportSubmitter {
    pub fn new(client: ContactServiceClient) -> Self {
        Self { client }
    }

    /// `POST import-contacts` referencing the upload
    pub async fn submit(&self, upload_id: &str) -> Result<ImportJob> {
        let request = import_contact_request(upload_id);

        let document: Document<ImportJobAttributes> = self
            .client
            .post_json(IMPORT_CONTACTS_RESOURCE, &request)
            .await
            .map_err(|e| ImportError::SubmissionFailed(e.to_string()))?;

        if document.data.id.trim().is_empty() {
            return Err(ImportError::SubmissionFailed(
                "response is missing data.id".to_string(),
            ));
        }

        let job = ImportJob {
            status: document
                .data
                .attributes
                .and_then(|a| a.status)
                .unwrap_or(ImportJobStatus::Queued),
            id: document.data.id,
        };

        tracing::info!(
            upload_id = %upload_id,
            import_id = %job.id,
            status = %job.status,
            "Import job created"
        );

        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_references_upload() {
        let value = serde_json::to_value(import_contact_request("up_1")).unwrap();

        assert_eq!(value["data"]["type"], "import-contacts");
        assert_eq!(value["data"]["relationships"]["upload"]["data"]["id"], "up_1");
        assert_eq!(value["data"]["relationships"]["upload"]["data"]["type"], "uploads");
    }

    #[test]
    fn test_request_full_shape() {
        let value = serde_json::to_value(import_contact_request("up_9")).unwrap();
        assert_eq!(
            value,
            json!({
                "data": {
                    "type": "import-contacts",
                    "attributes": {
                        "status": "queued",
                        "unique-primary-phone": true
                    },
                    "relationships": {
                        "upload": {
                            "data": {"type": "uploads", "id": "up_9"}
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_upload_id_is_escaped() {
        let value = serde_json::to_value(import_contact_request("a\"b")).unwrap();
        assert_eq!(value["data"]["relationships"]["upload"]["data"]["id"], "a\"b");
    }

    #[test]
    fn test_unknown_status_keeps_server_value() {
        let status: ImportJobStatus = serde_json::from_value(json!("processing")).unwrap();
        assert_eq!(status, ImportJobStatus::Other("processing".to_string()));
        assert_eq!(status.to_string(), "processing");

        let status: ImportJobStatus = serde_json::from_value(json!("queued")).unwrap();
        assert_eq!(status, ImportJobStatus::Queued);
        assert_eq!(status.to_string(), "queued");
    }

    #[test]
    fn test_status_serializes_as_plain_string() {
        assert_eq!(serde_json::to_value(ImportJobStatus::Queued).unwrap(), json!("queued"));
        assert_eq!(
            serde_json::to_value(ImportJobStatus::Other("done".to_string())).unwrap(),
            json!("done")
        );
    }
}
