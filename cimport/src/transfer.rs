//! Direct-to-storage file transfer
//!
//! Rebuilds the presigned POST described by a [`TransferContract`] and sends
//! the file to the storage endpoint. This client never carries contact
//! service credentials; the contract's own headers are the only custom ones.

use crate::client::USER_AGENT;
use crate::error::{ImportError, Result};
use crate::file_descriptor::FileDescriptor;
use crate::registrar::TransferContract;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::time::Duration;

/// Extra form field the presigned policy requires, holding the MIME type
pub const CONTENT_TYPE_FIELD: &str = "Content-Type";

/// Name of the binary file part
pub const FILE_FIELD: &str = "file";

/// The only status the storage endpoint returns for an accepted upload
pub const SUCCESS_STATUS: StatusCode = StatusCode::NO_CONTENT;

fn transfer_error(message: impl Into<String>) -> ImportError {
    ImportError::TransferFailed {
        status: None,
        body: message.into(),
    }
}

/// Sends files to the storage backend using presigned contracts
#[derive(Debug, Clone)]
pub struct TransferExecutor {
    http_client: reqwest::Client,
}

impl TransferExecutor {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ImportError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }

    /// Upload the described file under the given contract
    ///
    /// `upload_id` is only used for logging. Succeeds on HTTP 204 and
    /// nothing else.
    pub async fn transfer(
        &self,
        upload_id: &str,
        contract: &TransferContract,
        descriptor: &FileDescriptor,
    ) -> Result<()> {
        let bytes = tokio::fs::read(descriptor.path()).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ImportError::FileNotFound(descriptor.path().to_path_buf())
            } else {
                transfer_error(format!(
                    "Failed to read {}: {}",
                    descriptor.path().display(),
                    e
                ))
            }
        })?;

        if bytes.len() as u64 != descriptor.size_bytes() {
            tracing::warn!(
                upload_id = %upload_id,
                declared = descriptor.size_bytes(),
                actual = bytes.len(),
                "File size changed since the upload was registered"
            );
        }

        let headers = build_headers(contract)?;
        let form = build_form(contract, descriptor, bytes)?;

        tracing::debug!(
            upload_id = %upload_id,
            url = %contract.target_url,
            headers = headers.len(),
            parts = contract.required_form_fields.len() + 2,
            "Sending file to storage"
        );

        let response = self
            .http_client
            .post(contract.target_url.clone())
            .headers(headers)
            .multipart(form)
            .send()
            .await
            .map_err(|e| transfer_error(e.to_string()))?;

        let status = response.status();
        if status == SUCCESS_STATUS {
            tracing::info!(upload_id = %upload_id, "File transferred to storage");
            return Ok(());
        }

        let body = failure_body(response.text().await);
        tracing::error!(
            upload_id = %upload_id,
            status = status.as_u16(),
            "Storage rejected the upload"
        );
        Err(ImportError::TransferFailed {
            status: Some(status.as_u16()),
            body,
        })
    }
}

/// Response body for error reporting, or why it could not be read
fn failure_body<E: std::fmt::Display>(read: std::result::Result<String, E>) -> String {
    read.unwrap_or_else(|e| format!("<unreadable body: {}>", e))
}

/// Literal request headers demanded by the contract
///
/// Uses `append` so repeated names are all sent.
pub fn build_headers(contract: &TransferContract) -> Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(contract.required_headers.len());
    for (name, value) in contract.required_headers.iter() {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| transfer_error(format!("Invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| transfer_error(format!("Invalid value for header {}: {}", name, e)))?;
        headers.append(name, value);
    }
    Ok(headers)
}

/// Multipart body: contract fields in order, then `Content-Type`, then the
/// file part
pub fn build_form(
    contract: &TransferContract,
    descriptor: &FileDescriptor,
    bytes: Vec<u8>,
) -> Result<Form> {
    let mut form = Form::new();
    for (name, value) in contract.required_form_fields.iter() {
        form = form.text(name.to_string(), value.to_string());
    }
    form = form.text(CONTENT_TYPE_FIELD, descriptor.mime_type().as_str());

    let file_part = Part::bytes(bytes)
        .file_name(descriptor.name().to_string())
        .mime_str(descriptor.mime_type().as_str())
        .map_err(|e| transfer_error(format!("Invalid file part: {}", e)))?;

    Ok(form.part(FILE_FIELD, file_part))
}


#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::jsonapi::OrderedPairs;
    use reqwest::Url;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn fixture(dir: &TempDir, name: &str, content: &[u8]) -> FileDescriptor {
        let file: PathBuf = dir.path().join(name);
        std::fs::write(&file, content).unwrap();
        FileDescriptor::resolve(&file).await.unwrap()
    }

    fn contract_for(server: &MockServer) -> TransferContract {
        TransferContract {
            target_url: Url::parse(&format!("{}/bucket", server.uri())).unwrap(),
            required_headers: [("x-amz-acl", "private"), ("x-amz-server-side-encryption", "AES256")]
                .into_iter()
                .collect::<OrderedPairs>(),
            required_form_fields: [
                ("key", "uploads/abc/import.csv"),
                ("policy", "eyJwb2xpY3kiOiJ0ZXN0In0="),
                ("x-amz-signature", "deadbeef"),
            ]
            .into_iter()
            .collect::<OrderedPairs>(),
        }
    }

    /// Names of multipart parts in body order
    fn part_names(body: &[u8]) -> Vec<String> {
        let text = String::from_utf8_lossy(body);
        let marker = "form-data; name=\"";
        text.match_indices(marker)
            .map(|(i, _)| {
                let rest = &text[i + marker.len()..];
                rest[..rest.find('"').unwrap()].to_string()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_transfer_builds_presigned_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bucket"))
            .and(header("x-amz-acl", "private"))
            .and(header("x-amz-server-side-encryption", "AES256"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let descriptor = fixture(&dir, "import.csv", b"name,phone\nAda,555-0100\n").await;
        let executor = TransferExecutor::new(Duration::from_secs(5)).unwrap();

        executor
            .transfer("up_1", &contract_for(&server), &descriptor)
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];

        assert_eq!(
            part_names(&request.body),
            vec!["key", "policy", "x-amz-signature", "Content-Type", "file"]
        );

        let body = String::from_utf8_lossy(&request.body);
        assert!(body.contains("filename=\"import.csv\""));
        assert!(body.contains("\r\n\r\ntext/csv\r\n"));
        assert!(body.contains("name,phone\nAda,555-0100\n"));
        assert!(request.headers.get("authorization").is_none());
        assert!(request.headers.get("x-account-key").is_none());
    }

    #[tokio::test]
    async fn test_transfer_with_empty_contract_sends_two_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let descriptor = fixture(&dir, "book.xlsx", b"PK\x03\x04").await;
        let contract = TransferContract {
            target_url: Url::parse(&format!("{}/bucket", server.uri())).unwrap(),
            required_headers: OrderedPairs::default(),
            required_form_fields: OrderedPairs::default(),
        };

        TransferExecutor::new(Duration::from_secs(5))
            .unwrap()
            .transfer("up_2", &contract, &descriptor)
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(part_names(&requests[0].body), vec!["Content-Type", "file"]);
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body
            .contains("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"));
    }

    #[tokio::test]
    async fn test_success_status_ignores_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204).set_body_string("ignored"))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let descriptor = fixture(&dir, "import.csv", b"a,b\n").await;

        let result = TransferExecutor::new(Duration::from_secs(5))
            .unwrap()
            .transfer("up_3", &contract_for(&server), &descriptor)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_other_statuses_fail() {
        for code in [200u16, 201, 400, 403, 500] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(code).set_body_string("<Error>nope</Error>"))
                .mount(&server)
                .await;

            let dir = TempDir::new().unwrap();
            let descriptor = fixture(&dir, "import.csv", b"a,b\n").await;

            let result = TransferExecutor::new(Duration::from_secs(5))
                .unwrap()
                .transfer("up_4", &contract_for(&server), &descriptor)
                .await;

            match result {
                Err(ImportError::TransferFailed { status, body }) => {
                    assert_eq!(status, Some(code));
                    assert_eq!(body, "<Error>nope</Error>");
                }
                other => panic!("status {} should fail, got {:?}", code, other),
            }
        }
    }

    #[tokio::test]
    async fn test_size_drift_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let descriptor = fixture(&dir, "import.csv", b"a,b\n").await;
        std::fs::write(descriptor.path(), b"a,b\nc,d\ne,f\n").unwrap();

        let result = TransferExecutor::new(Duration::from_secs(5))
            .unwrap()
            .transfer("up_5", &contract_for(&server), &descriptor)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_file_removed_after_resolution() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let descriptor = fixture(&dir, "import.csv", b"a,b\n").await;
        std::fs::remove_file(descriptor.path()).unwrap();

        let result = TransferExecutor::new(Duration::from_secs(5))
            .unwrap()
            .transfer("up_6", &contract_for(&server), &descriptor)
            .await;
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }
}
