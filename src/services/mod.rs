pub mod auth;
pub mod exporter;
pub mod fetcher;
pub mod library;
pub mod normalizer;
pub mod publisher;

pub use auth::TokenExchange;
pub use exporter::LibraryExporter;
pub use fetcher::PaginatedFetcher;
pub use library::LibraryAggregator;
pub use publisher::ArtifactPublisher;
