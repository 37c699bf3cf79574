use crate::config::StorageConfig;
use crate::error::{AppError, Result};
use bytes::Bytes;
use object_store::{
    aws::AmazonS3Builder, path::Path, Attribute, Attributes, ObjectStore, PutOptions, PutPayload,
};
use std::sync::Arc;

pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Writes finished exports to the content store and reads them back.
#[derive(Clone)]
pub struct ArtifactPublisher {
    store: Arc<dyn ObjectStore>,
}

impl ArtifactPublisher {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// S3-compatible bucket (Cloudflare R2 uses region `auto`).
    pub fn connect(config: &StorageConfig) -> anyhow::Result<Self> {
        let store = AmazonS3Builder::new()
            .with_endpoint(&config.endpoint_url)
            .with_bucket_name(&config.bucket)
            .with_region("auto")
            .with_access_key_id(&config.access_key_id)
            .with_secret_access_key(&config.secret_access_key)
            .build()?;

        Ok(Self::new(Arc::new(store)))
    }

    pub async fn publish(&self, filename: &str, csv: Bytes) -> Result<()> {
        let path = object_path(filename)?;
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, CSV_CONTENT_TYPE.into());

        let size = csv.len();
        self.store
            .put_opts(
                &path,
                PutPayload::from(csv),
                PutOptions {
                    attributes,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| AppError::Publish(e.to_string()))?;

        tracing::info!("Published {} ({} bytes)", path, size);
        Ok(())
    }

    pub async fn fetch(&self, filename: &str) -> Result<Bytes> {
        let path = object_path(filename)?;

        let result = match self.store.get(&path).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => {
                return Err(AppError::NotFound(filename.to_string()))
            }
            Err(e) => return Err(AppError::Internal(e.into())),
        };

        result
            .bytes()
            .await
            .map_err(|e| AppError::Internal(e.into()))
    }
}

/// Object key for an export. `Path::parse` keeps the name verbatim, where
/// `Path::from` would percent-encode characters such as `%`, `#` and `[`.
fn object_path(filename: &str) -> Result<Path> {
    Path::parse(filename).map_err(|_| AppError::InvalidFilename(filename.to_string()))
}

/// Rejects keys that are empty, contain separators, or name a relative segment.
pub fn validate_filename(filename: &str) -> Result<()> {
    let invalid = filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains(['/', '\\'])
        || filename.chars().any(char::is_control);

    if invalid {
        return Err(AppError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}
