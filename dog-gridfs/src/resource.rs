use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;

use crate::{ByteStream, Document, FileId, GridFsResult, StoredFile, CONTENT_TYPE_FIELD};

/// A stored file paired with an open content stream positioned at offset zero.
///
/// The stream belongs to whoever holds the resource; dropping it closes the
/// stream.
pub struct GridFsResource {
    file: StoredFile,
    content: ByteStream,
}

impl GridFsResource {
    pub(crate) fn new(file: StoredFile, content: ByteStream) -> Self {
        Self { file, content }
    }

    pub fn id(&self) -> &FileId {
        &self.file.id
    }

    pub fn filename(&self) -> Option<&str> {
        self.file.filename.as_deref()
    }

    /// Content type recorded at upload, if any
    pub fn content_type(&self) -> Option<&str> {
        self.file
            .metadata
            .get(CONTENT_TYPE_FIELD)
            .and_then(|v| v.as_str())
    }

    pub fn content_length(&self) -> u64 {
        self.file.length
    }

    pub fn upload_date(&self) -> DateTime<Utc> {
        self.file.upload_date
    }

    pub fn metadata(&self) -> &Document {
        &self.file.metadata
    }

    pub fn file(&self) -> &StoredFile {
        &self.file
    }

    pub fn into_stream(self) -> ByteStream {
        self.content
    }

    pub fn into_parts(self) -> (StoredFile, ByteStream) {
        (self.file, self.content)
    }

    /// Drain the content stream into memory
    pub async fn read_to_end(self) -> GridFsResult<Bytes> {
        let buffer = self
            .content
            .try_fold(BytesMut::new(), |mut buffer, chunk| async move {
                buffer.extend_from_slice(&chunk);
                Ok(buffer)
            })
            .await?;
        Ok(buffer.freeze())
    }
}

impl std::fmt::Debug for GridFsResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridFsResource")
            .field("file", &self.file)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resource(chunks: Vec<&'static str>) -> GridFsResource {
        let file = StoredFile {
            id: FileId::from_string("f1".to_string()),
            filename: Some("someName".to_string()),
            length: chunks.iter().map(|c| c.len() as u64).sum(),
            chunk_size: 4,
            upload_date: Utc::now(),
            metadata: json!({ "_contentType": "contentType" })
                .as_object()
                .cloned()
                .unwrap(),
        };
        let stream = futures_util::stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok::<_, std::io::Error>(Bytes::from_static(c.as_bytes()))),
        );
        GridFsResource::new(file, Box::pin(stream))
    }

    #[test]
    fn test_accessors() {
        let res = resource(vec!["Hell", "o"]);
        assert_eq!(res.id().as_str(), "f1");
        assert_eq!(res.filename(), Some("someName"));
        assert_eq!(res.content_type(), Some("contentType"));
        assert_eq!(res.content_length(), 5);
    }

    #[tokio::test]
    async fn test_read_to_end() {
        let bytes = resource(vec!["Hell", "o Wo", "rld"]).read_to_end().await.unwrap();
        assert_eq!(&bytes[..], b"Hello World");
    }
}
