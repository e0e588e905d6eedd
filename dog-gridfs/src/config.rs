use crate::{GridFsError, GridFsResult};

/// Default bucket name used by GridFS-style engines
pub const DEFAULT_BUCKET_NAME: &str = "fs";

/// Default chunk size: 255 KiB, so a chunk document stays under 256 KiB
pub const DEFAULT_CHUNK_SIZE_BYTES: u32 = 255 * 1024;

/// Prefix for environment overrides (`DOG_GRIDFS__BUCKET_NAME`, ...)
pub const ENV_PREFIX: &str = "DOG_GRIDFS__";

/// Configuration for GridFS operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridFsConfig {
    /// Bucket holding the file and chunk collections
    pub bucket_name: String,

    /// Chunk size requested for new uploads
    pub chunk_size_bytes: u32,
}

impl Default for GridFsConfig {
    fn default() -> Self {
        Self {
            bucket_name: DEFAULT_BUCKET_NAME.to_string(),
            chunk_size_bytes: DEFAULT_CHUNK_SIZE_BYTES,
        }
    }
}

impl GridFsConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bucket name
    pub fn with_bucket_name<S: Into<String>>(mut self, bucket_name: S) -> Self {
        self.bucket_name = bucket_name.into();
        self
    }

    /// Set chunk size for uploads
    pub fn with_chunk_size(mut self, bytes: u32) -> Self {
        self.chunk_size_bytes = bytes;
        self
    }

    /// Load overrides from `DOG_GRIDFS__*` environment variables
    pub fn from_env() -> GridFsResult<Self> {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Load overrides from environment variables under a custom prefix
    pub fn from_env_with_prefix(prefix: &str) -> GridFsResult<Self> {
        Self::from_vars(prefix, std::env::vars())
    }

    fn from_vars<I>(prefix: &str, vars: I) -> GridFsResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = Self::default();

        for (key, value) in vars {
            let Some(stripped) = key.strip_prefix(prefix) else {
                continue;
            };

            match stripped.to_lowercase().as_str() {
                "bucket_name" => {
                    if value.trim().is_empty() {
                        return Err(GridFsError::invalid("Bucket name must not be blank"));
                    }
                    config.bucket_name = value;
                }
                "chunk_size_bytes" => {
                    config.chunk_size_bytes = parse_chunk_size(&value)?;
                }
                _ => {}
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values no engine can honour
    pub fn validate(&self) -> GridFsResult<()> {
        if self.bucket_name.trim().is_empty() {
            return Err(GridFsError::invalid("Bucket name must not be blank"));
        }
        if self.chunk_size_bytes == 0 {
            return Err(GridFsError::invalid("Chunk size must be greater than zero"));
        }
        Ok(())
    }
}

fn parse_chunk_size(value: &str) -> GridFsResult<u32> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|e| GridFsError::invalid(format!("Invalid chunk size `{}`: {}", value, e)))
}
