//! Shared types used on the HTTP wire.
//!
//! Both the server handlers and [`ApiClient`](crate::client::ApiClient)
//! serialize these, so the JSON shape lives in exactly one place. Request
//! fields are optional: a missing field is a 400 with a readable message, not
//! a deserialization rejection.

use serde::{Deserialize, Serialize};

/// One successfully enhanced upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedFile {
    /// Client-side filename as uploaded.
    pub original: String,
    /// Name the original is stored under in the uploads directory.
    pub source_filename: String,
    /// Generated name in the results directory.
    pub enhanced: String,
    /// Public URL of the enhanced image.
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub processed_files: Vec<ProcessedFile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReprocessRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_filename: Option<String>,
    /// Data URL (or bare base64) of the overlay layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReprocessResponse {
    pub success: bool,
    /// Cache-busted URL of the rewritten image.
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameResponse {
    pub success: bool,
    pub new_filename: String,
    pub url: String,
}

/// Body of every non-2xx JSON response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reprocess_request_uses_camel_case() {
        let req: ReprocessRequest =
            serde_json::from_value(json!({"targetFilename": "a.png", "overlay": "AQID"})).unwrap();
        assert_eq!(req.target_filename.as_deref(), Some("a.png"));
        assert_eq!(req.overlay.as_deref(), Some("AQID"));
    }

    #[test]
    fn missing_request_fields_deserialize_as_none() {
        let req: RenameRequest = serde_json::from_value(json!({"oldFilename": "a.png"})).unwrap();
        assert_eq!(req.old_filename.as_deref(), Some("a.png"));
        assert!(req.new_filename.is_none());
    }

    #[test]
    fn rename_response_shape() {
        let body = serde_json::to_value(RenameResponse {
            success: true,
            new_filename: "kitty.png".into(),
            url: "/results/kitty.png".into(),
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"success": true, "newFilename": "kitty.png", "url": "/results/kitty.png"})
        );
    }

    #[test]
    fn upload_response_keeps_snake_case() {
        let body = serde_json::to_value(UploadResponse {
            processed_files: vec![ProcessedFile {
                original: "cat.jpg".into(),
                source_filename: "files-1-x.jpg".into(),
                enhanced: "enhanced_cat_1.jpg".into(),
                url: "/results/enhanced_cat_1.jpg".into(),
            }],
        })
        .unwrap();
        assert_eq!(body["processed_files"][0]["source_filename"], "files-1-x.jpg");
    }
}
