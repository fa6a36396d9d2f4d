//! Upload registration
//!
//! Announces the file to the contact service and receives the presigned
//! storage contract that authorizes the direct upload.

use crate::client::ContactServiceClient;
use crate::error::{ImportError, Result};
use crate::file_descriptor::{FileDescriptor, MimeType};
use crate::jsonapi::{Document, OrderedPairs};
use reqwest::Url;
use serde::{Deserialize, Serialize};

const UPLOADS_RESOURCE: &str = "uploads";

/// Registration request body
///
/// A flat object, not a JSON:API envelope.
#[derive(Debug, Clone, Serialize)]
pub struct UploadRegistration<'a> {
    pub name: &'a str,
    #[serde(rename = "type")]
    pub mime_type: MimeType,
    pub size: u64,
}

impl<'a> From<&'a FileDescriptor> for UploadRegistration<'a> {
    fn from(descriptor: &'a FileDescriptor) -> Self {
        Self {
            name: descriptor.name(),
            mime_type: descriptor.mime_type(),
            size: descriptor.size_bytes(),
        }
    }
}

/// `attributes` of the `uploads` resource returned by registration
#[derive(Debug, Clone, Deserialize)]
pub struct UploadAttributes {
    #[serde(rename = "request-url")]
    pub request_url: String,
    #[serde(rename = "request-headers")]
    pub request_headers: OrderedPairs,
    #[serde(rename = "request-form-data")]
    pub request_form_data: OrderedPairs,
}

/// Presigned storage upload contract
///
/// Server-dictated; headers and form fields are applied verbatim and in
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferContract {
    pub target_url: Url,
    pub required_headers: OrderedPairs,
    pub required_form_fields: OrderedPairs,
}

/// A registered, not yet verified, upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadIntent {
    pub id: String,
    pub contract: TransferContract,
}

impl TryFrom<Document<UploadAttributes>> for UploadIntent {
    type Error = ImportError;

    fn try_from(document: Document<UploadAttributes>) -> Result<Self> {
        let resource = document.data;
        if resource.id.trim().is_empty() {
            return Err(ImportError::RegistrationFailed(
                "response is missing data.id".to_string(),
            ));
        }

        let attributes = resource.attributes.ok_or_else(|| {
            ImportError::RegistrationFailed("response is missing data.attributes".to_string())
        })?;

        let target_url = Url::parse(&attributes.request_url).map_err(|e| {
            ImportError::RegistrationFailed(format!(
                "invalid request-url '{}': {}",
                attributes.request_url, e
            ))
        })?;

        Ok(Self {
            id: resource.id,
            contract: TransferContract {
                target_url,
                required_headers: attributes.request_headers,
                required_form_fields: attributes.request_form_data,
            },
        })
    }
}

/// Registers upload intents with the contact service
#[derive(Debug, Clone)]
pub struct UploadRegistrar {
    client: ContactServiceClient,
}

impl UploadRegistrar {
    pub fn new(client: ContactServiceClient) -> Self {
        Self { client }
    }

    /// `POST uploads` for the described file
    pub async fn register(&self, descriptor: &FileDescriptor) -> Result<UploadIntent> {
        let request = UploadRegistration::from(descriptor);

        let document: Document<UploadAttributes> = self
            .client
            .post_json(UPLOADS_RESOURCE, &request)
            .await
            .map_err(|e| ImportError::RegistrationFailed(e.to_string()))?;

        let intent = UploadIntent::try_from(document)?;

        tracing::info!(
            upload_id = %intent.id,
            headers = intent.contract.required_headers.len(),
            form_fields = intent.contract.required_form_fields.len(),
            "Upload registered"
        );

        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: &str) -> Result<UploadIntent> {
        let document: Document<UploadAttributes> = serde_json::from_str(body)
            .map_err(|e| ImportError::RegistrationFailed(e.to_string()))?;
        UploadIntent::try_from(document)
    }

    #[test]
    fn test_contract_from_registration_response() {
        let intent = parse(
            r#"{"data":{"id":"up_1","attributes":{"request-url":"https://s3/x","request-headers":[{"h1":"v1"}],"request-form-data":[{"key":"k1"}]}}}"#,
        )
        .unwrap();

        assert_eq!(intent.id, "up_1");
        assert_eq!(intent.contract.target_url.as_str(), "https://s3/x");
        assert_eq!(
            intent.contract.required_headers,
            [("h1", "v1")].into_iter().collect::<OrderedPairs>()
        );
        assert_eq!(
            intent.contract.required_form_fields,
            [("key", "k1")].into_iter().collect::<OrderedPairs>()
        );
    }

    #[test]
    fn test_numeric_form_field_is_kept_as_text() {
        let intent = parse(
            r#"{"data":{"id":"up_2","attributes":{"request-url":"https://s3/x","request-headers":[],"request-form-data":[{"key":"k1"},{"success_action_status":204}]}}}"#,
        )
        .unwrap();

        assert_eq!(
            intent.contract.required_form_fields,
            [("key", "k1"), ("success_action_status", "204")]
                .into_iter()
                .collect::<OrderedPairs>()
        );
    }

    #[test]
    fn test_missing_attributes() {
        let result = parse(r#"{"data":{"id":"up_1"}}"#);
        assert!(matches!(result, Err(ImportError::RegistrationFailed(_))));
    }

    #[test]
    fn test_missing_request_url() {
        let result = parse(
            r#"{"data":{"id":"up_1","attributes":{"request-headers":[],"request-form-data":[]}}}"#,
        );
        assert!(matches!(result, Err(ImportError::RegistrationFailed(_))));
    }

    #[test]
    fn test_blank_id() {
        let result = parse(
            r#"{"data":{"id":"","attributes":{"request-url":"https://s3/x","request-headers":[],"request-form-data":[]}}}"#,
        );
        assert!(matches!(result, Err(ImportError::RegistrationFailed(_))));
    }

    #[test]
    fn test_relative_request_url_rejected() {
        let result = parse(
            r#"{"data":{"id":"up_1","attributes":{"request-url":"/bucket","request-headers":[],"request-form-data":[]}}}"#,
        );
        assert!(matches!(result, Err(ImportError::RegistrationFailed(_))));
    }

    #[test]
    fn test_registration_body_is_flat() {
        let request = UploadRegistration {
            name: "it's \"quoted\".csv",
            mime_type: MimeType::Csv,
            size: 1024,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({"name": "it's \"quoted\".csv", "type": "text/csv", "size": 1024})
        );
    }
}
