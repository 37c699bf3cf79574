use reqwest::RequestBuilder;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Spotify,
    AppleMusic,
}

impl Provider {
    /// Name of the JSON array holding a page's items.
    pub fn items_field(&self) -> &'static str {
        match self {
            Provider::Spotify => "items",
            Provider::AppleMusic => "data",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Spotify => write!(f, "spotify"),
            Provider::AppleMusic => write!(f, "apple"),
        }
    }
}

/// Request-scoped credential used for every upstream library call of one export.
#[derive(Clone)]
pub enum AccessCredential {
    Spotify {
        access_token: String,
    },
    AppleMusic {
        user_token: String,
        developer_token: String,
    },
}

impl AccessCredential {
    pub fn provider(&self) -> Provider {
        match self {
            AccessCredential::Spotify { .. } => Provider::Spotify,
            AccessCredential::AppleMusic { .. } => Provider::AppleMusic,
        }
    }

    pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            AccessCredential::Spotify { access_token } => request.bearer_auth(access_token),
            AccessCredential::AppleMusic {
                user_token,
                developer_token,
            } => request
                .bearer_auth(developer_token)
                .header("Music-User-Token", user_token),
        }
    }
}

// Tokens stay out of logs
impl fmt::Debug for AccessCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessCredential")
            .field("provider", &self.provider())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Playlist,
    SavedTrack,
    SavedAlbum,
    LibrarySong,
    LibraryAlbum,
}

impl RowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowKind::Playlist => "Playlist",
            RowKind::SavedTrack => "Saved Track",
            RowKind::SavedAlbum => "Saved Album",
            RowKind::LibrarySong => "Library Song",
            RowKind::LibraryAlbum => "Library Album",
        }
    }
}

/// One line of the export. Always serializes to exactly eight fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub kind: RowKind,
    pub container_name: String,
    pub owner: String,
    pub container_uri: String,
    pub track_name: String,
    pub artists: String,
    pub album: String,
    pub track_uri: String,
}

impl ExportRow {
    pub fn record(&self) -> [&str; 8] {
        [
            self.kind.as_str(),
            &self.container_name,
            &self.owner,
            &self.container_uri,
            &self.track_name,
            &self.artists,
            &self.album,
            &self.track_uri,
        ]
    }
}
