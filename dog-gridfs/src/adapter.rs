use std::sync::Arc;

use futures_util::{stream, StreamExt, TryStreamExt};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    where_filename, ByteStream, DefaultConverter, DocumentConverter, DownloadTarget, FileId,
    FileStream, GridFsBucket, GridFsConfig, GridFsError, GridFsPut, GridFsResource, GridFsResult,
    MetadataBuilder, Query, QueryTranslator, ResourcePattern, ResourceStream, StoredFile,
    UploadOptions,
};

/// The main GridFS adapter - services embed this to store and read files
pub struct GridFsAdapter {
    bucket: Arc<dyn GridFsBucket>,
    translator: QueryTranslator,
    metadata: MetadataBuilder,
    config: GridFsConfig,
}

impl GridFsAdapter {
    /// Create a new adapter over a storage engine bucket
    pub fn new<B: GridFsBucket + 'static>(bucket: B, config: GridFsConfig) -> Self {
        Self::from_shared(Arc::new(bucket), config)
    }

    /// Create from an already shared bucket handle
    pub fn from_shared(bucket: Arc<dyn GridFsBucket>, config: GridFsConfig) -> Self {
        let converter: Arc<dyn DocumentConverter> = Arc::new(DefaultConverter::new());
        Self {
            bucket,
            translator: QueryTranslator::new(converter.clone()),
            metadata: MetadataBuilder::new(converter),
            config,
        }
    }

    /// Use custom field-mapping rules for both metadata and queries
    pub fn with_converter<C: DocumentConverter + 'static>(mut self, converter: C) -> Self {
        let converter: Arc<dyn DocumentConverter> = Arc::new(converter);
        self.translator = QueryTranslator::new(converter.clone());
        self.metadata = MetadataBuilder::new(converter);
        self
    }

    /// Store content, returning the identifier generated by the engine
    pub async fn store(&self, content: ByteStream, put: GridFsPut) -> GridFsResult<FileId> {
        self.store_inner::<()>(content, put, None).await
    }

    /// Store content with a metadata object marshalled through the converter
    pub async fn store_with<T>(
        &self,
        content: ByteStream,
        put: GridFsPut,
        metadata: &T,
    ) -> GridFsResult<FileId>
    where
        T: Serialize + ?Sized + Sync,
    {
        self.store_inner(content, put, Some(metadata)).await
    }

    async fn store_inner<T>(
        &self,
        content: ByteStream,
        put: GridFsPut,
        object: Option<&T>,
    ) -> GridFsResult<FileId>
    where
        T: Serialize + ?Sized + Sync,
    {
        let metadata = self.metadata.build(
            put.content_type.as_deref(),
            put.metadata.as_ref(),
            object,
        )?;

        let options = UploadOptions::new()
            .with_metadata(metadata)
            .with_chunk_size(self.config.chunk_size_bytes);

        let id = self
            .bucket
            .upload(put.filename.as_deref(), content, options)
            .await?;

        info!(
            "Saved file `{}` with id `{}`",
            put.filename.as_deref().unwrap_or_default(),
            id
        );
        Ok(id)
    }

    /// All files matching a query, lazily pulled from the engine cursor
    pub async fn find(&self, query: &Query) -> GridFsResult<FileStream> {
        let native = self.translator.translate(query)?;
        debug!(
            "Finding files in bucket `{}` with filter {:?} and sort {:?}",
            self.bucket.bucket_name(),
            native.filter,
            native.sort
        );
        self.bucket.find(native.into_request()).await
    }

    /// First file matching a query, if any. Multiple matches are not an error.
    pub async fn find_one(&self, query: &Query) -> GridFsResult<Option<StoredFile>> {
        let mut files = self.find(query).await?;
        files.next().await.transpose()
    }

    /// Delete every file matching a query; matching nothing is fine
    pub async fn delete(&self, query: &Query) -> GridFsResult<()> {
        let ids: Vec<FileId> = self
            .find(query)
            .await?
            .map_ok(|file| file.id)
            .try_collect()
            .await?;

        for id in &ids {
            debug!("Deleting file `{}` from bucket `{}`", id, self.bucket.bucket_name());
            self.bucket.delete(id).await?;
        }

        debug!("Deleted {} files", ids.len());
        Ok(())
    }

    /// Resource stored under an exact filename, if one exists
    pub async fn get_resource(&self, filename: &str) -> GridFsResult<Option<GridFsResource>> {
        let query = Query::query(where_filename().is(filename));
        let Some(file) = self.find_one(&query).await? else {
            debug!("No file named `{}`", filename);
            return Ok(None);
        };

        let content = self
            .bucket
            .open_download_stream(DownloadTarget::for_file(&file))
            .await?;
        Ok(Some(GridFsResource::new(file, content)))
    }

    /// Resources matching a filename or Ant-style pattern.
    ///
    /// Streams are opened one record at a time as the sequence is pulled, and
    /// each is opened by filename. Order follows the engine's natural order.
    pub async fn get_resources(&self, location_pattern: &str) -> GridFsResult<ResourceStream> {
        if location_pattern.trim().is_empty() {
            return Ok(Box::pin(stream::empty()));
        }

        let pattern = match ResourcePattern::classify(location_pattern)? {
            ResourcePattern::Literal(name) => {
                let resource: Vec<GridFsResult<GridFsResource>> =
                    self.get_resource(&name).await?.into_iter().map(Ok).collect();
                return Ok(Box::pin(stream::iter(resource)));
            }
            ResourcePattern::Pattern(pattern) => pattern,
        };

        debug!(
            "Resolving pattern `{}` as `{}`",
            pattern,
            pattern.expression()
        );
        let files = self
            .find(&Query::query(where_filename().regex(pattern.expression())))
            .await?;

        let bucket = self.bucket.clone();
        let resources = files.and_then(move |file| {
            let bucket = bucket.clone();
            async move {
                let content = bucket
                    .open_download_stream(DownloadTarget::for_file(&file))
                    .await?;
                Ok::<_, GridFsError>(GridFsResource::new(file, content))
            }
        });

        Ok(Box::pin(resources))
    }

    /// Get configuration
    pub fn config(&self) -> &GridFsConfig {
        &self.config
    }

    /// Name of the underlying bucket
    pub fn bucket_name(&self) -> &str {
        self.bucket.bucket_name()
    }
}
