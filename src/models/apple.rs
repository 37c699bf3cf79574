//! Apple Music API library resources.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Resource<A> {
    pub id: Option<String>,
    pub attributes: Option<A>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistAttributes {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongAttributes {
    pub name: Option<String>,
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumAttributes {
    pub name: Option<String>,
    pub artist_name: Option<String>,
}

pub type LibraryPlaylist = Resource<PlaylistAttributes>;
pub type LibrarySong = Resource<SongAttributes>;
pub type LibraryAlbum = Resource<AlbumAttributes>;

#[derive(Debug, Default)]
pub struct AppleMusicLibrary {
    pub playlists: Vec<(LibraryPlaylist, Vec<LibrarySong>)>,
    pub songs: Vec<LibrarySong>,
    pub albums: Vec<LibraryAlbum>,
}
