use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use uuid::Uuid;

use crate::{GridFsResult, GridFsResource};

/// Stream of bytes for file content
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Engine-native document: ordered string keys to JSON values
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Lazy sequence of file records produced by a find
pub type FileStream = Pin<Box<dyn Stream<Item = GridFsResult<StoredFile>> + Send>>;

/// Lazy sequence of resolved resources
pub type ResourceStream = Pin<Box<dyn Stream<Item = GridFsResult<GridFsResource>> + Send>>;

/// Identifier of a stored file, generated by the storage engine on upload
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub String);

impl FileId {
    /// Generate a new random file ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Create from existing string
    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index entry describing one uploaded file.
///
/// Field names serialize to the engine-native names (`_id`, `chunkSize`,
/// `uploadDate`), so a record converted to a [`Document`] can be matched
/// directly against a translated filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    #[serde(rename = "_id")]
    pub id: FileId,
    pub filename: Option<String>,
    pub length: u64,
    pub chunk_size: u32,
    #[serde(serialize_with = "serialize_upload_date")]
    pub upload_date: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Document,
}

impl StoredFile {
    /// Convert to the engine-native document form
    pub fn to_document(&self) -> GridFsResult<Document> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(doc) => Ok(doc),
            _ => Ok(Document::new()),
        }
    }

    /// Look up a metadata entry
    pub fn metadata_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }
}

/// Fixed nanosecond precision so upload dates order correctly as strings
fn serialize_upload_date<S: serde::Serializer>(
    date: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

/// What a download stream is opened for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadTarget {
    Id(FileId),
    /// Latest revision stored under a filename
    Filename(String),
}

impl DownloadTarget {
    /// Target a record by name, falling back to its identifier for unnamed files
    pub fn for_file(file: &StoredFile) -> Self {
        match &file.filename {
            Some(name) => Self::Filename(name.clone()),
            None => Self::Id(file.id.clone()),
        }
    }
}

impl std::fmt::Display for DownloadTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id `{}`", id),
            Self::Filename(name) => write!(f, "filename `{}`", name),
        }
    }
}

/// Request to store a file
#[derive(Debug, Clone, Default)]
pub struct GridFsPut {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub metadata: Option<Document>,
}

impl GridFsPut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filename<S: Into<String>>(mut self, filename: S) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Document) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_metadata_entry<K: Into<String>, V: Into<serde_json::Value>>(
        mut self,
        key: K,
        value: V,
    ) -> Self {
        self.metadata
            .get_or_insert_with(Document::new)
            .insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_file() -> StoredFile {
        StoredFile {
            id: FileId::from_string("abc".to_string()),
            filename: Some("foo.xml".to_string()),
            length: 11,
            chunk_size: 4,
            upload_date: Utc::now(),
            metadata: json!({ "_contentType": "application/xml" })
                .as_object()
                .cloned()
                .unwrap(),
        }
    }

    #[test]
    fn test_record_document_uses_native_names() {
        let doc = sample_file().to_document().unwrap();

        assert_eq!(doc.get("_id"), Some(&json!("abc")));
        assert_eq!(doc.get("chunkSize"), Some(&json!(4)));
        assert!(doc.contains_key("uploadDate"));
        assert_eq!(doc["metadata"]["_contentType"], json!("application/xml"));
    }

    #[test]
    fn test_upload_dates_order_as_strings() {
        let at = |rfc3339: &str| {
            let mut file = sample_file();
            file.upload_date = DateTime::parse_from_rfc3339(rfc3339)
                .unwrap()
                .with_timezone(&Utc);
            file.to_document().unwrap()["uploadDate"]
                .as_str()
                .unwrap()
                .to_string()
        };

        let whole = at("2024-01-01T00:00:00Z");
        let half = at("2024-01-01T00:00:00.5Z");
        let later = at("2024-01-01T00:00:00.500001Z");
        assert_eq!(half, "2024-01-01T00:00:00.500000000Z");
        assert!(whole < half);
        assert!(half < later);

        let file: StoredFile = serde_json::from_value(serde_json::Value::Object(
            sample_file().to_document().unwrap(),
        ))
        .unwrap();
        assert_eq!(file.filename.as_deref(), Some("foo.xml"));
    }

    #[test]
    fn test_download_target_prefers_filename() {
        let mut file = sample_file();
        assert_eq!(
            DownloadTarget::for_file(&file),
            DownloadTarget::Filename("foo.xml".to_string())
        );

        file.filename = None;
        assert_eq!(
            DownloadTarget::for_file(&file),
            DownloadTarget::Id(FileId::from_string("abc".to_string()))
        );
    }

    #[test]
    fn test_put_metadata_entries_accumulate() {
        let put = GridFsPut::new()
            .with_metadata_entry("a", 1)
            .with_metadata_entry("b", "two");

        let metadata = put.metadata.unwrap();
        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata["b"], json!("two"));
    }
}
