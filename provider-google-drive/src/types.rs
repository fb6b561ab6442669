//! Drive API v3 wire types
//!
//! Only the fields requested through `FILE_FIELDS` are modelled.
//! Reference: https://developers.google.com/drive/api/v3/reference/files

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    #[serde(default)]
    pub parents: Vec<String>,
    pub web_view_link: Option<String>,
    /// Short-lived; absent for folders and most audio
    pub thumbnail_link: Option<String>,
    #[serde(default)]
    pub trashed: bool,
}

/// `files.list` page
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesListResponse {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    pub next_page_token: Option<String>,
    /// Drive could not search every corpus, so the page may be missing items
    #[serde(default)]
    pub incomplete_search: bool,
}

/// Error envelope on non-2xx responses
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_drive_file() {
        let json = r#"{
            "id": "abc123",
            "name": "Autumn Leaves.pdf",
            "mimeType": "application/pdf",
            "parents": ["folder1"],
            "webViewLink": "https://drive.google.com/file/d/abc123/view",
            "thumbnailLink": "https://lh3.googleusercontent.com/abc",
            "trashed": false
        }"#;

        let file: DriveFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.id, "abc123");
        assert_eq!(file.name, "Autumn Leaves.pdf");
        assert_eq!(file.mime_type, "application/pdf");
        assert_eq!(file.parents, vec!["folder1".to_string()]);
        assert!(file.web_view_link.is_some());
    }

    #[test]
    fn test_deserialize_minimal_file() {
        let json = r#"{"id": "f", "name": "n", "mimeType": "audio/mpeg"}"#;

        let file: DriveFile = serde_json::from_str(json).unwrap();
        assert!(file.parents.is_empty());
        assert!(file.thumbnail_link.is_none());
        assert!(!file.trashed);
    }

    #[test]
    fn test_deserialize_files_list_response() {
        let json = r#"{
            "files": [
                {
                    "id": "file1",
                    "name": "song1.mp3",
                    "mimeType": "audio/mpeg",
                    "parents": []
                }
            ],
            "nextPageToken": "token123",
            "incompleteSearch": false
        }"#;

        let response: FilesListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.files.len(), 1);
        assert_eq!(response.next_page_token, Some("token123".to_string()));
        assert!(!response.incomplete_search);
    }

    #[test]
    fn test_deserialize_empty_listing() {
        let response: FilesListResponse = serde_json::from_str("{}").unwrap();
        assert!(response.files.is_empty());
        assert!(response.next_page_token.is_none());
    }

    #[test]
    fn test_deserialize_api_error() {
        let json = r#"{"error": {"code": 404, "message": "File not found: x."}}"#;
        let response: ApiErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.error.code, 404);
        assert_eq!(response.error.message, "File not found: x.");
    }
}
