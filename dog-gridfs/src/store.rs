use async_trait::async_trait;

use crate::{ByteStream, Document, DownloadTarget, FileId, FileStream, GridFsResult};

/// Chunked-storage engine primitives - implemented once per target engine
#[async_trait]
pub trait GridFsBucket: Send + Sync {
    /// Upload content as a new file, returning the engine-generated identifier
    async fn upload(
        &self,
        filename: Option<&str>,
        content: ByteStream,
        options: UploadOptions,
    ) -> GridFsResult<FileId>;

    /// Open a cursor over the file records matching a request
    async fn find(&self, request: FindRequest) -> GridFsResult<FileStream>;

    /// Open the content of a file for reading from offset zero
    async fn open_download_stream(&self, target: DownloadTarget) -> GridFsResult<ByteStream>;

    /// Delete a file and its chunks
    async fn delete(&self, id: &FileId) -> GridFsResult<()>;

    /// Name of the bucket this handle points at
    fn bucket_name(&self) -> &str;
}

/// Options for an upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadOptions {
    pub metadata: Document,
    /// `None` lets the engine pick its own chunk size
    pub chunk_size_bytes: Option<u32>,
}

impl UploadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(mut self, metadata: Document) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_chunk_size(mut self, bytes: u32) -> Self {
        self.chunk_size_bytes = Some(bytes);
        self
    }
}

/// Native find: filter with sort and paging composed before execution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindRequest {
    pub filter: Document,
    pub sort: Option<Document>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

impl FindRequest {
    pub fn new(filter: Document) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}
