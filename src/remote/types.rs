use crate::codec::EncodedPayload;
use crate::error::RemoteError;
use crate::frame::CapturedImage;
use crate::session::Operation;
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// JSON body shared by both endpoints: `{"image": "<base64>"}`
#[derive(Debug, Serialize)]
pub struct ImageRequestBody<'a> {
    pub image: &'a str,
}

/// One submission. Built right before sending and never modified.
#[derive(Debug, Clone)]
pub struct RemoteRequest {
    id: Uuid,
    operation: Operation,
    payload: EncodedPayload,
}

impl RemoteRequest {
    pub fn new(id: Uuid, operation: Operation, payload: EncodedPayload) -> Self {
        Self {
            id,
            operation,
            payload,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn payload(&self) -> &EncodedPayload {
        &self.payload
    }

    pub fn body(&self) -> ImageRequestBody<'_> {
        ImageRequestBody {
            image: self.payload.as_str(),
        }
    }
}

/// Parsed server answer, consumed as soon as it arrives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteResponse {
    Score { status: String, image_ref: String },
    Upload { status: String, url: Url },
}

impl RemoteResponse {
    pub fn status(&self) -> &str {
        match self {
            RemoteResponse::Score { status, .. } | RemoteResponse::Upload { status, .. } => status,
        }
    }

    /// Result image reference of a score response
    pub fn image_ref(&self) -> Option<&str> {
        match self {
            RemoteResponse::Score { image_ref, .. } => Some(image_ref),
            RemoteResponse::Upload { .. } => None,
        }
    }

    /// Destination of an upload response
    pub fn url(&self) -> Option<&Url> {
        match self {
            RemoteResponse::Upload { url, .. } => Some(url),
            RemoteResponse::Score { .. } => None,
        }
    }

    /// Validate a JSON body for the given operation
    pub fn from_json(operation: Operation, body: &Value) -> Result<Self, RemoteError> {
        let status = required_string(operation, body, "status")?;

        match operation {
            Operation::Score => Ok(RemoteResponse::Score {
                status,
                image_ref: required_string(operation, body, "image")?,
            }),
            Operation::Upload => {
                let raw = required_string(operation, body, "url")?;
                let url = Url::parse(&raw).map_err(|e| RemoteError::Protocol {
                    operation,
                    details: format!("`url` is not an absolute URL ({}): {}", raw, e),
                })?;
                Ok(RemoteResponse::Upload { status, url })
            }
        }
    }
}

fn required_string(operation: Operation, body: &Value, field: &str) -> Result<String, RemoteError> {
    match body.get(field) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(other) => Err(RemoteError::Protocol {
            operation,
            details: format!("`{}` should be a string, got {}", field, other),
        }),
        None => Err(RemoteError::Protocol {
            operation,
            details: format!("missing `{}` field", field),
        }),
    }
}

/// Result of a score call: the response plus the fetched board, when it decoded
#[derive(Debug, Clone)]
pub struct ScoreOutcome {
    pub response: RemoteResponse,
    pub image: Option<CapturedImage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_score_response_parsing() {
        let body = json!({"status": "Black wins by 3.5", "image": "abc.png"});
        let response = RemoteResponse::from_json(Operation::Score, &body).unwrap();

        assert_eq!(
            response,
            RemoteResponse::Score {
                status: "Black wins by 3.5".to_string(),
                image_ref: "abc.png".to_string(),
            }
        );
        assert_eq!(response.status(), "Black wins by 3.5");
    }

    #[test]
    fn test_missing_fields_are_protocol_errors() {
        let body = json!({"status": "ok"});
        let err = RemoteResponse::from_json(Operation::Score, &body).unwrap_err();
        assert!(matches!(err, RemoteError::Protocol { ref details, .. } if details.contains("image")));

        let err = RemoteResponse::from_json(Operation::Upload, &json!({"url": "https://x.io"}))
            .unwrap_err();
        assert!(matches!(err, RemoteError::Protocol { ref details, .. } if details.contains("status")));
    }

    #[test]
    fn test_upload_url_must_be_absolute() {
        let body = json!({"status": "ok", "url": "/g/1"});
        assert!(RemoteResponse::from_json(Operation::Upload, &body).is_err());

        let body = json!({"status": "ok", "url": "https://example.com/g/1"});
        match RemoteResponse::from_json(Operation::Upload, &body).unwrap() {
            RemoteResponse::Upload { url, .. } => assert_eq!(url.as_str(), "https://example.com/g/1"),
            other => panic!("unexpected response {:?}", other),
        }
    }

    #[test]
    fn test_non_string_field_rejected() {
        let body = json!({"status": 1, "image": "a.png"});
        assert!(RemoteResponse::from_json(Operation::Score, &body).is_err());
    }

    #[test]
    fn test_request_body_serialization() {
        let body = ImageRequestBody { image: "QUJD" };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"image":"QUJD"}"#);
    }
}
