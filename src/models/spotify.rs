//! Spotify Web API shapes. Every field is optional so a sparse object still decodes.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Playlist {
    pub id: Option<String>,
    pub name: Option<String>,
    pub owner: Option<Owner>,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Owner {
    pub display_name: Option<String>,
}

/// Entry of `/playlists/{id}/tracks` and `/me/tracks`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackItem {
    pub track: Option<Track>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Track {
    pub name: Option<String>,
    #[serde(default)]
    pub artists: Vec<Option<Artist>>,
    pub album: Option<AlbumRef>,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Artist {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlbumRef {
    pub name: Option<String>,
}

/// Entry of `/me/albums`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SavedAlbum {
    pub album: Option<Album>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Album {
    pub name: Option<String>,
    #[serde(default)]
    pub artists: Vec<Option<Artist>>,
    pub uri: Option<String>,
    pub tracks: Option<AlbumTracks>,
}

/// First page of an album's tracks, embedded in the album object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlbumTracks {
    #[serde(default)]
    pub items: Vec<Option<AlbumTrack>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlbumTrack {
    pub name: Option<String>,
    #[serde(default)]
    pub artists: Vec<Option<Artist>>,
    pub uri: Option<String>,
}

/// Joins artist names with the export's `"+ "` separator, dropping nameless entries.
pub fn join_artists(artists: &[Option<Artist>]) -> String {
    artists
        .iter()
        .flatten()
        .filter_map(|artist| artist.name.as_deref())
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join("+ ")
}

#[derive(Debug, Default)]
pub struct SpotifyLibrary {
    pub playlists: Vec<(Playlist, Vec<TrackItem>)>,
    pub saved_tracks: Vec<TrackItem>,
    pub saved_albums: Vec<SavedAlbum>,
}
