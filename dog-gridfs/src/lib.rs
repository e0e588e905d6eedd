//! # dog-gridfs: GridFS-style file access for DogRS
//!
//! `dog-gridfs` stores, finds, resolves and deletes large binary files kept in a
//! chunked-storage engine (MongoDB GridFS or anything shaped like it). The engine
//! does the chunking and persistence; this crate owns the logic around it:
//!
//! - **Query translation**: logical filters and sorts become engine-native documents,
//!   with field names mapped the same way uploaded metadata is written
//! - **Resource resolution**: a filename resolves to at most one file, an Ant-style
//!   pattern (`*.xml`, `docs/**/*.md`) to every match, each paired with an open stream
//! - **Metadata assembly**: content type plus caller metadata, given either as a
//!   document or as any `Serialize` value
//! - **Lazy results**: finds and pattern resolution are pull-based streams; dropping
//!   one stops further engine calls
//!
//! ## Quick Start
//!
//! ```rust
//! use dog_gridfs::prelude::*;
//! use dog_gridfs::memory::MemoryBucket;
//! use futures_util::StreamExt;
//!
//! # #[tokio::main]
//! # async fn main() -> GridFsResult<()> {
//! let gridfs = GridFsAdapter::new(MemoryBucket::new(), GridFsConfig::default());
//!
//! let body = futures_util::stream::once(async {
//!     Ok::<_, std::io::Error>(bytes::Bytes::from_static(b"<xml/>"))
//! });
//! let put = GridFsPut::new()
//!     .with_filename("foo.xml")
//!     .with_content_type("application/xml");
//! let id = gridfs.store(Box::pin(body), put).await?;
//!
//! let mut resources = gridfs.get_resources("*.xml").await?;
//! while let Some(resource) = resources.next().await {
//!     let resource = resource?;
//!     assert_eq!(resource.id(), &id);
//!     assert_eq!(resource.content_type(), Some("application/xml"));
//! }
//!
//! gridfs.delete(&Query::query(where_filename().is("foo.xml"))).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │   Your Service   │  ← Business logic only
//! ├──────────────────┤
//! │   GridFsAdapter  │  ← Queries, patterns, metadata
//! ├──────────────────┤
//! │   GridFsBucket   │  ← Engine primitives (upload/find/download/delete)
//! └──────────────────┘
//! ```

pub mod adapter;
mod config;
pub mod convert;
mod error;
mod metadata;
#[cfg(feature = "memory")]
pub mod memory;
pub mod pattern;
pub mod query;
mod resource;
pub mod store;
mod translate;
mod types;

// Re-export main types for clean API
pub use adapter::GridFsAdapter;
pub use config::{GridFsConfig, DEFAULT_BUCKET_NAME, DEFAULT_CHUNK_SIZE_BYTES};
pub use convert::{DefaultConverter, DocumentConverter};
pub use error::{GridFsError, GridFsResult};
pub use metadata::{MetadataBuilder, CONTENT_TYPE_FIELD};
pub use pattern::{GlobPattern, ResourcePattern};
pub use query::{
    where_content_type, where_filename, where_metadata, where_metadata_root, Criteria,
    Direction, Query, SortOrder,
};
pub use resource::GridFsResource;
pub use store::{FindRequest, GridFsBucket, UploadOptions};
pub use translate::{NativeQuery, QueryTranslator};
pub use types::{
    ByteStream, Document, DownloadTarget, FileId, FileStream, GridFsPut, ResourceStream,
    StoredFile,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        where_content_type, where_filename, where_metadata, Criteria, GridFsAdapter,
        GridFsBucket, GridFsConfig, GridFsError, GridFsPut, GridFsResource, GridFsResult,
        Query, SortOrder, StoredFile, ByteStream, FileId,
    };
}
