//! Flattens provider libraries into the fixed eight-column export.

use crate::error::Result;
use crate::models::apple::AppleMusicLibrary;
use crate::models::spotify::{join_artists, SpotifyLibrary, Track};
use crate::models::{ExportRow, RowKind};

const UNKNOWN: &str = "Unknown";

pub const SPOTIFY_HEADER: [&str; 8] = [
    "Type",
    "Playlist Name / Album Name",
    "Owner / Album Artist",
    "Playlist URI / Album URI",
    "Track Name",
    "Artists",
    "Album",
    "Track URI",
];

pub const APPLE_MUSIC_HEADER: [&str; 8] = [
    "Type",
    "Playlist Name / Album Name",
    "Curator / Artist",
    "Playlist ID / Album ID",
    "Track Name",
    "Artists",
    "Album",
    "Track ID",
];

pub trait Normalize {
    const HEADER: [&'static str; 8];

    fn rows(&self) -> Vec<ExportRow>;
}

fn or_unknown(value: Option<&String>) -> String {
    value.cloned().unwrap_or_else(|| UNKNOWN.to_string())
}

fn track_row(kind: RowKind, container: [String; 3], track: Option<&Track>) -> ExportRow {
    let fallback = Track::default();
    let track = track.unwrap_or(&fallback);
    let [container_name, owner, container_uri] = container;

    ExportRow {
        kind,
        container_name,
        owner,
        container_uri,
        track_name: or_unknown(track.name.as_ref()),
        artists: join_artists(&track.artists),
        album: or_unknown(track.album.as_ref().and_then(|a| a.name.as_ref())),
        track_uri: or_unknown(track.uri.as_ref()),
    }
}

impl Normalize for SpotifyLibrary {
    const HEADER: [&'static str; 8] = SPOTIFY_HEADER;

    fn rows(&self) -> Vec<ExportRow> {
        let mut rows = Vec::new();

        for (playlist, tracks) in &self.playlists {
            let name = or_unknown(playlist.name.as_ref());
            let owner = or_unknown(playlist.owner.as_ref().and_then(|o| o.display_name.as_ref()));
            let uri = or_unknown(playlist.uri.as_ref());

            for item in tracks {
                rows.push(track_row(
                    RowKind::Playlist,
                    [name.clone(), owner.clone(), uri.clone()],
                    item.track.as_ref(),
                ));
            }
        }

        for item in &self.saved_tracks {
            rows.push(track_row(
                RowKind::SavedTrack,
                Default::default(),
                item.track.as_ref(),
            ));
        }

        for saved in &self.saved_albums {
            let Some(album) = saved.album.as_ref() else {
                continue;
            };
            let album_name = or_unknown(album.name.as_ref());
            let album_artist = join_artists(&album.artists);
            let album_uri = or_unknown(album.uri.as_ref());

            let tracks = album.tracks.iter().flat_map(|t| t.items.iter().flatten());
            for track in tracks {
                rows.push(ExportRow {
                    kind: RowKind::SavedAlbum,
                    container_name: album_name.clone(),
                    owner: album_artist.clone(),
                    container_uri: album_uri.clone(),
                    track_name: or_unknown(track.name.as_ref()),
                    artists: join_artists(&track.artists),
                    album: album_name.clone(),
                    track_uri: or_unknown(track.uri.as_ref()),
                });
            }
        }

        rows
    }
}

impl Normalize for AppleMusicLibrary {
    const HEADER: [&'static str; 8] = APPLE_MUSIC_HEADER;

    fn rows(&self) -> Vec<ExportRow> {
        let mut rows = Vec::new();

        for (playlist, tracks) in &self.playlists {
            let name = or_unknown(playlist.attributes.as_ref().and_then(|a| a.name.as_ref()));
            let id = or_unknown(playlist.id.as_ref());

            for song in tracks {
                let attrs = song.attributes.clone().unwrap_or_default();
                rows.push(ExportRow {
                    kind: RowKind::Playlist,
                    container_name: name.clone(),
                    owner: String::new(),
                    container_uri: id.clone(),
                    track_name: or_unknown(attrs.name.as_ref()),
                    artists: or_unknown(attrs.artist_name.as_ref()),
                    album: or_unknown(attrs.album_name.as_ref()),
                    track_uri: or_unknown(song.id.as_ref()),
                });
            }
        }

        for song in &self.songs {
            let attrs = song.attributes.clone().unwrap_or_default();
            rows.push(ExportRow {
                kind: RowKind::LibrarySong,
                container_name: String::new(),
                owner: String::new(),
                container_uri: String::new(),
                track_name: or_unknown(attrs.name.as_ref()),
                artists: or_unknown(attrs.artist_name.as_ref()),
                album: or_unknown(attrs.album_name.as_ref()),
                track_uri: or_unknown(song.id.as_ref()),
            });
        }

        // Library albums carry no track list, so each album is a single row
        for album in &self.albums {
            let attrs = album.attributes.clone().unwrap_or_default();
            let album_name = or_unknown(attrs.name.as_ref());
            rows.push(ExportRow {
                kind: RowKind::LibraryAlbum,
                container_name: album_name.clone(),
                owner: or_unknown(attrs.artist_name.as_ref()),
                container_uri: or_unknown(album.id.as_ref()),
                track_name: String::new(),
                artists: String::new(),
                album: album_name,
                track_uri: String::new(),
            });
        }

        rows
    }
}

/// Header plus one record per row, as UTF-8 CSV.
pub fn encode_csv<L: Normalize>(library: &L) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(L::HEADER)?;

    for row in library.rows() {
        writer.write_record(row.record())?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush CSV buffer: {}", e).into())
}
