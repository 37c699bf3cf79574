pub mod apple;
pub mod export;
pub mod spotify;

pub use apple::AppleMusicLibrary;
pub use export::{AccessCredential, ExportRow, Provider, RowKind};
pub use spotify::SpotifyLibrary;
