use crate::error::Result;
use crate::models::Provider;
use crate::services::normalizer::{encode_csv, Normalize};
use crate::services::{ArtifactPublisher, LibraryAggregator, TokenExchange};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;

/// One-shot export: aggregate, normalize, publish, hand back the same bytes.
pub struct LibraryExporter {
    aggregator: LibraryAggregator,
    publisher: ArtifactPublisher,
    tokens: Arc<TokenExchange>,
}

impl LibraryExporter {
    pub fn new(
        aggregator: LibraryAggregator,
        publisher: ArtifactPublisher,
        tokens: Arc<TokenExchange>,
    ) -> Self {
        Self {
            aggregator,
            publisher,
            tokens,
        }
    }

    pub async fn export_spotify(&self, filename: &str, access_token: &str) -> Result<Bytes> {
        let start = Instant::now();
        let library = self.aggregator.aggregate_spotify(access_token).await;
        self.finish(Provider::Spotify, filename, &library, start).await
    }

    pub async fn export_apple_music(&self, filename: &str, user_token: &str) -> Result<Bytes> {
        let start = Instant::now();
        let developer_token = self.tokens.apple_developer_token()?;
        let library = self
            .aggregator
            .aggregate_apple_music(user_token, &developer_token)
            .await;
        self.finish(Provider::AppleMusic, filename, &library, start).await
    }

    pub async fn fetch(&self, filename: &str) -> Result<Bytes> {
        self.publisher.fetch(filename).await
    }

    // The upload must succeed before the caller sees any bytes
    async fn finish<L: Normalize>(
        &self,
        provider: Provider,
        filename: &str,
        library: &L,
        start: Instant,
    ) -> Result<Bytes> {
        let csv = Bytes::from(encode_csv(library)?);
        self.publisher.publish(filename, csv.clone()).await?;

        tracing::info!(
            "Exported {} library to {} in {:.1}s",
            provider,
            filename,
            start.elapsed().as_secs_f64()
        );
        Ok(csv)
    }
}
