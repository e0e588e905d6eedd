use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use chrono::Utc;
use futures_util::StreamExt;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use super::filter;
use crate::{
    ByteStream, Document, DownloadTarget, FileId, FileStream, FindRequest, GridFsBucket,
    GridFsConfig, GridFsError, GridFsResult, StoredFile, UploadOptions,
};

struct FileEntry {
    file: StoredFile,
    chunks: Vec<Bytes>,
}

/// In-memory bucket. Clones share the same storage.
#[derive(Clone)]
pub struct MemoryBucket {
    name: String,
    default_chunk_size: u32,
    /// Records in insertion order, which is the natural order of a find
    files: Arc<RwLock<Vec<FileEntry>>>,
}

impl MemoryBucket {
    pub fn new() -> Self {
        Self::with_config(&GridFsConfig::default())
    }

    pub fn with_config(config: &GridFsConfig) -> Self {
        Self {
            name: config.bucket_name.clone(),
            default_chunk_size: config.chunk_size_bytes,
            files: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Number of stored files
    pub fn file_count(&self) -> usize {
        self.files.read().len()
    }

    /// Number of chunks a file was split into
    pub fn chunk_count(&self, id: &FileId) -> Option<usize> {
        self.files
            .read()
            .iter()
            .find(|entry| &entry.file.id == id)
            .map(|entry| entry.chunks.len())
    }

    fn snapshot(&self) -> Vec<StoredFile> {
        self.files.read().iter().map(|entry| entry.file.clone()).collect()
    }
}

impl Default for MemoryBucket {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GridFsBucket for MemoryBucket {
    async fn upload(
        &self,
        filename: Option<&str>,
        mut content: ByteStream,
        options: UploadOptions,
    ) -> GridFsResult<FileId> {
        let chunk_size = options.chunk_size_bytes.unwrap_or(self.default_chunk_size);
        if chunk_size == 0 {
            return Err(GridFsError::invalid("Chunk size must be greater than zero"));
        }

        let mut chunks = Vec::new();
        let mut pending = BytesMut::new();
        let mut length = 0u64;

        while let Some(piece) = content.next().await {
            let piece = piece?;
            length += piece.len() as u64;
            pending.extend_from_slice(&piece);
            while pending.len() >= chunk_size as usize {
                chunks.push(pending.split_to(chunk_size as usize).freeze());
            }
        }
        if !pending.is_empty() {
            chunks.push(pending.freeze());
        }

        let file = StoredFile {
            id: FileId::new(),
            filename: filename.map(str::to_string),
            length,
            chunk_size,
            upload_date: Utc::now(),
            metadata: options.metadata,
        };
        let id = file.id.clone();

        debug!(
            "Bucket `{}` stored {} bytes in {} chunks as {}",
            self.name,
            length,
            chunks.len(),
            id
        );
        self.files.write().push(FileEntry { file, chunks });

        Ok(id)
    }

    async fn find(&self, request: FindRequest) -> GridFsResult<FileStream> {
        let mut matched = Vec::new();
        for file in self.snapshot() {
            let doc = Value::Object(file.to_document()?);
            if filter::matches(&doc, &request.filter)? {
                matched.push((doc, file));
            }
        }

        if let Some(sort) = &request.sort {
            let keys = sort_keys(sort)?;
            matched.sort_by(|(a, _), (b, _)| {
                for (path, descending) in &keys {
                    let ordering = filter::compare(filter::lookup(a, path), filter::lookup(b, path));
                    let ordering = if *descending { ordering.reverse() } else { ordering };
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            });
        }

        let skip = request.skip.unwrap_or(0) as usize;
        let limit = match request.limit {
            Some(0) | None => usize::MAX,
            Some(limit) => limit as usize,
        };
        let records: Vec<GridFsResult<StoredFile>> = matched
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|(_, file)| Ok(file))
            .collect();

        Ok(Box::pin(futures_util::stream::iter(records)))
    }

    async fn open_download_stream(&self, target: DownloadTarget) -> GridFsResult<ByteStream> {
        let chunks = {
            let files = self.files.read();
            let entry = match &target {
                DownloadTarget::Id(id) => files.iter().find(|entry| &entry.file.id == id),
                // latest revision; ties resolve to the most recent insert
                DownloadTarget::Filename(name) => files
                    .iter()
                    .filter(|entry| entry.file.filename.as_deref() == Some(name.as_str()))
                    .max_by_key(|entry| entry.file.upload_date),
            };
            entry.map(|entry| entry.chunks.clone())
        };

        let chunks = chunks.ok_or_else(|| GridFsError::not_found(target.to_string()))?;

        let stream = async_stream::stream! {
            for chunk in chunks {
                yield Ok::<_, std::io::Error>(chunk);
            }
        };
        Ok(Box::pin(stream))
    }

    async fn delete(&self, id: &FileId) -> GridFsResult<()> {
        let mut files = self.files.write();
        let position = files
            .iter()
            .position(|entry| &entry.file.id == id)
            .ok_or_else(|| GridFsError::not_found(format!("id `{}`", id)))?;
        files.remove(position);
        Ok(())
    }

    fn bucket_name(&self) -> &str {
        &self.name
    }
}

fn sort_keys(sort: &Document) -> GridFsResult<Vec<(String, bool)>> {
    sort.iter()
        .map(|(path, direction)| match direction.as_i64() {
            Some(1) => Ok((path.clone(), false)),
            Some(-1) => Ok((path.clone(), true)),
            _ => Err(GridFsError::invalid(format!(
                "Invalid sort direction for `{}`: {}",
                path, direction
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn content(data: &'static [u8]) -> ByteStream {
        Box::pin(futures_util::stream::once(async move {
            Ok::<_, std::io::Error>(Bytes::from_static(data))
        }))
    }

    async fn collect(stream: ByteStream) -> Vec<u8> {
        stream
            .map(|chunk| chunk.unwrap().to_vec())
            .concat()
            .await
    }

    async fn names(bucket: &MemoryBucket, request: FindRequest) -> Vec<String> {
        bucket
            .find(request)
            .await
            .unwrap()
            .map(|file| file.unwrap().filename.unwrap_or_default())
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_upload_splits_into_chunks() {
        let bucket = MemoryBucket::with_config(&GridFsConfig::new().with_chunk_size(4));
        let id = bucket
            .upload(Some("hello.txt"), content(b"Hello World"), UploadOptions::new())
            .await
            .unwrap();

        assert_eq!(bucket.chunk_count(&id), Some(3));
        let stream = bucket
            .open_download_stream(DownloadTarget::Id(id))
            .await
            .unwrap();
        assert_eq!(collect(stream).await, b"Hello World");
    }

    #[tokio::test]
    async fn test_upload_options_override_chunk_size() {
        let bucket = MemoryBucket::new();
        let id = bucket
            .upload(None, content(b"abcdef"), UploadOptions::new().with_chunk_size(2))
            .await
            .unwrap();
        assert_eq!(bucket.chunk_count(&id), Some(3));
    }

    #[tokio::test]
    async fn test_find_sort_skip_limit() {
        let bucket = MemoryBucket::new();
        for name in ["foo.xml", "foobar.xml", "bar.xml"] {
            bucket
                .upload(Some(name), content(b"x"), UploadOptions::new())
                .await
                .unwrap();
        }

        let natural = names(&bucket, FindRequest::new(Document::new())).await;
        assert_eq!(natural, ["foo.xml", "foobar.xml", "bar.xml"]);

        let sorted = names(
            &bucket,
            FindRequest::new(Document::new()).sort(
                json!({ "filename": 1 }).as_object().cloned().unwrap(),
            ),
        )
        .await;
        assert_eq!(sorted, ["bar.xml", "foo.xml", "foobar.xml"]);

        let paged = names(
            &bucket,
            FindRequest::new(Document::new())
                .sort(json!({ "filename": -1 }).as_object().cloned().unwrap())
                .skip(1)
                .limit(1),
        )
        .await;
        assert_eq!(paged, ["foo.xml"]);
    }

    #[tokio::test]
    async fn test_invalid_sort_direction() {
        let bucket = MemoryBucket::new();
        let result = bucket
            .find(FindRequest::new(Document::new()).sort(
                json!({ "filename": "up" }).as_object().cloned().unwrap(),
            ))
            .await;
        assert!(matches!(result, Err(GridFsError::InvalidArgument { .. })));
    }

    #[tokio::test]
    async fn test_download_by_name_returns_latest_revision() {
        let bucket = MemoryBucket::new();
        bucket
            .upload(Some("a.txt"), content(b"first"), UploadOptions::new())
            .await
            .unwrap();
        bucket
            .upload(Some("a.txt"), content(b"second"), UploadOptions::new())
            .await
            .unwrap();

        let stream = bucket
            .open_download_stream(DownloadTarget::Filename("a.txt".to_string()))
            .await
            .unwrap();
        assert_eq!(collect(stream).await, b"second");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let bucket = MemoryBucket::new();
        let missing = FileId::from_string("missing".to_string());

        assert!(matches!(
            bucket.open_download_stream(DownloadTarget::Id(missing.clone())).await,
            Err(GridFsError::FileNotFound { .. })
        ));
        assert!(matches!(
            bucket.delete(&missing).await,
            Err(GridFsError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_file() {
        let bucket = MemoryBucket::new();
        let id = bucket
            .upload(Some("a.txt"), content(b"x"), UploadOptions::new())
            .await
            .unwrap();

        bucket.delete(&id).await.unwrap();
        assert_eq!(bucket.file_count(), 0);
        assert_eq!(bucket.bucket_name(), "fs");
    }
}
