use crate::config::Config;
use crate::error::Result;
use crate::models::apple::{LibraryAlbum, LibraryPlaylist, LibrarySong};
use crate::models::spotify::{Playlist, SavedAlbum, TrackItem};
use crate::models::{AccessCredential, AppleMusicLibrary, SpotifyLibrary};
use crate::services::PaginatedFetcher;
use futures::{stream, Future, StreamExt};

/// Gathers everything one export needs from a provider.
pub struct LibraryAggregator {
    fetcher: PaginatedFetcher,
    spotify_api_base_url: String,
    apple_music_api_base_url: String,
    concurrency: Option<usize>,
}

impl LibraryAggregator {
    pub fn new(fetcher: PaginatedFetcher, config: &Config) -> Self {
        Self {
            fetcher,
            spotify_api_base_url: config.spotify.api_base_url.clone(),
            apple_music_api_base_url: config.apple.music_api_base_url.clone(),
            concurrency: config.export_concurrency,
        }
    }

    pub async fn aggregate_spotify(&self, access_token: &str) -> SpotifyLibrary {
        let credential = AccessCredential::Spotify {
            access_token: access_token.to_string(),
        };
        let base = &self.spotify_api_base_url;

        let playlists_with_tracks = async {
            let playlists: Vec<Playlist> = self
                .fetcher
                .fetch_all(&format!("{}/me/playlists?limit=50", base), &credential)
                .await;
            tracing::info!("Fetched {} Spotify playlists", playlists.len());

            let fetcher = &self.fetcher;
            let credential = &credential;
            settle_all(playlists, self.concurrency, move |playlist| async move {
                let id = playlist.id.clone().unwrap_or_default();
                let url = format!("{}/playlists/{}/tracks?limit=100", base, id);
                let tracks = fetcher.try_fetch_all::<TrackItem>(&url, credential).await;
                (id, playlist, tracks)
            })
            .await
        };

        let saved_tracks_url = format!("{}/me/tracks?limit=50", base);
        let saved_albums_url = format!("{}/me/albums?limit=50", base);
        let saved_tracks = self
            .fetcher
            .fetch_all::<TrackItem>(&saved_tracks_url, &credential);
        let saved_albums = self
            .fetcher
            .fetch_all::<SavedAlbum>(&saved_albums_url, &credential);

        let (playlists, saved_tracks, saved_albums) =
            tokio::join!(playlists_with_tracks, saved_tracks, saved_albums);

        tracing::info!(
            "Aggregated Spotify library: {} playlists, {} saved tracks, {} saved albums",
            playlists.len(),
            saved_tracks.len(),
            saved_albums.len()
        );

        SpotifyLibrary {
            playlists,
            saved_tracks,
            saved_albums,
        }
    }

    pub async fn aggregate_apple_music(
        &self,
        user_token: &str,
        developer_token: &str,
    ) -> AppleMusicLibrary {
        let credential = AccessCredential::AppleMusic {
            user_token: user_token.to_string(),
            developer_token: developer_token.to_string(),
        };
        let base = &self.apple_music_api_base_url;

        let playlists_with_tracks = async {
            let playlists: Vec<LibraryPlaylist> = self
                .fetcher
                .fetch_all(&format!("{}/me/library/playlists?limit=100", base), &credential)
                .await;
            tracing::info!("Fetched {} Apple Music playlists", playlists.len());

            let fetcher = &self.fetcher;
            let credential = &credential;
            settle_all(playlists, self.concurrency, move |playlist| async move {
                let id = playlist.id.clone().unwrap_or_default();
                let url = format!("{}/me/library/playlists/{}/tracks?limit=100", base, id);
                let tracks = fetcher.try_fetch_all::<LibrarySong>(&url, credential).await;
                (id, playlist, tracks)
            })
            .await
        };

        let songs_url = format!("{}/me/library/songs?limit=100", base);
        let albums_url = format!("{}/me/library/albums?limit=100", base);
        let songs = self.fetcher.fetch_all::<LibrarySong>(&songs_url, &credential);
        let albums = self.fetcher.fetch_all::<LibraryAlbum>(&albums_url, &credential);

        let (playlists, songs, albums) = tokio::join!(playlists_with_tracks, songs, albums);

        tracing::info!(
            "Aggregated Apple Music library: {} playlists, {} songs, {} albums",
            playlists.len(),
            songs.len(),
            albums.len()
        );

        AppleMusicLibrary {
            playlists,
            songs,
            albums,
        }
    }
}

/// Runs one fetch per playlist and waits for all of them. Every fetch starts at
/// once unless `concurrency` caps how many are in flight. Each result stays
/// paired with the playlist that produced it; a failed fetch is logged and its
/// playlist dropped without affecting the rest.
async fn settle_all<P, T, F, Fut>(
    playlists: Vec<P>,
    concurrency: Option<usize>,
    fetch: F,
) -> Vec<(P, Vec<T>)>
where
    F: Fn(P) -> Fut,
    Fut: Future<Output = (String, P, Result<Vec<T>>)>,
{
    let limit = concurrency.unwrap_or(playlists.len()).max(1);
    let settled: Vec<_> = stream::iter(playlists)
        .map(fetch)
        .buffered(limit)
        .collect()
        .await;

    settled
        .into_iter()
        .filter_map(|(id, playlist, result)| match result {
            Ok(tracks) => Some((playlist, tracks)),
            Err(e) => {
                tracing::error!("Error fetching tracks for playlist {}: {}", id, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use reqwest::Client;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn aggregator(server: &MockServer) -> LibraryAggregator {
        let config = Config::for_upstream(&server.uri());
        LibraryAggregator::new(PaginatedFetcher::new(Client::new()), &config)
    }

    async fn mount_json(server: &MockServer, at: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    fn spotify_tracks(names: &[&str]) -> serde_json::Value {
        let items: Vec<_> = names
            .iter()
            .map(|n| json!({ "track": { "name": n, "uri": format!("spotify:track:{}", n) } }))
            .collect();
        json!({ "items": items, "next": null })
    }

    #[tokio::test]
    async fn test_settle_all_keeps_pairing_and_drops_failures() {
        let settled = settle_all(vec![1, 2, 3], Some(2), |n| async move {
            if n == 2 {
                (n.to_string(), n, Err(AppError::UpstreamFetch("boom".to_string())))
            } else {
                (n.to_string(), n, Ok(vec![n * 10]))
            }
        })
        .await;

        assert_eq!(settled, vec![(1, vec![10]), (3, vec![30])]);
    }

    async fn max_in_flight(count: usize, concurrency: Option<usize>) -> usize {
        let current = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let (current, peak) = (&current, &peak);

        let settled = settle_all((0..count).collect(), concurrency, move |n| async move {
            let now = current.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            current.fetch_sub(1, Ordering::SeqCst);
            (n.to_string(), n, Ok(vec![n]))
        })
        .await;

        assert_eq!(settled.len(), count);
        peak.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_settle_all_starts_every_fetch_without_cap() {
        assert_eq!(max_in_flight(20, None).await, 20);
    }

    #[tokio::test]
    async fn test_settle_all_respects_cap() {
        assert_eq!(max_in_flight(20, Some(3)).await, 3);
    }

    #[tokio::test]
    async fn test_spotify_fetches_run_concurrently() {
        let delay = Duration::from_millis(400);
        let server = MockServer::start().await;
        mount_json(
            &server,
            "/v1/me/playlists",
            json!({
                "items": [
                    { "id": "p1", "name": "One" },
                    { "id": "p2", "name": "Two" },
                    { "id": "p3", "name": "Three" },
                    { "id": "p4", "name": "Four" }
                ],
                "next": null
            }),
        )
        .await;
        for id in ["p1", "p2", "p3", "p4"] {
            Mock::given(method("GET"))
                .and(path(format!("/v1/playlists/{}/tracks", id)))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(spotify_tracks(&[id]))
                        .set_delay(delay),
                )
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/v1/me/tracks"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(spotify_tracks(&["saved"]))
                    .set_delay(delay),
            )
            .mount(&server)
            .await;
        mount_json(&server, "/v1/me/albums", json!({ "items": [], "next": null })).await;

        let started = Instant::now();
        let library = aggregator(&server).aggregate_spotify("token").await;
        let elapsed = started.elapsed();

        assert_eq!(library.playlists.len(), 4);
        assert_eq!(library.saved_tracks.len(), 1);
        // Five delayed responses back to back would take 2s.
        assert!(elapsed < delay * 3, "took {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_spotify_isolates_failed_playlist() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            "/v1/me/playlists",
            json!({
                "items": [
                    { "id": "p1", "name": "One" },
                    { "id": "p2", "name": "Two" },
                    { "id": "p3", "name": "Three" }
                ],
                "next": null
            }),
        )
        .await;
        mount_json(&server, "/v1/playlists/p1/tracks", spotify_tracks(&["a", "b"])).await;
        Mock::given(method("GET"))
            .and(path("/v1/playlists/p2/tracks"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;
        mount_json(&server, "/v1/playlists/p3/tracks", spotify_tracks(&["c"])).await;
        mount_json(&server, "/v1/me/tracks", spotify_tracks(&["saved"])).await;
        mount_json(&server, "/v1/me/albums", json!({ "items": [], "next": null })).await;

        let library = aggregator(&server).aggregate_spotify("token").await;

        let names: Vec<_> = library
            .playlists
            .iter()
            .map(|(p, tracks)| (p.name.clone().unwrap(), tracks.len()))
            .collect();
        assert_eq!(names, vec![("One".to_string(), 2), ("Three".to_string(), 1)]);
        assert_eq!(library.saved_tracks.len(), 1);
        assert!(library.saved_albums.is_empty());
    }

    #[tokio::test]
    async fn test_apple_music_sends_both_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/me/library/playlists"))
            .and(header("authorization", "Bearer dev-token"))
            .and(header("music-user-token", "user-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "id": "p.1", "attributes": { "name": "Mix" } }]
            })))
            .mount(&server)
            .await;
        mount_json(
            &server,
            "/v1/me/library/playlists/p.1/tracks",
            json!({ "data": [{ "id": "i.1", "attributes": { "name": "Song" } }] }),
        )
        .await;
        mount_json(&server, "/v1/me/library/songs", json!({ "data": [] })).await;
        Mock::given(method("GET"))
            .and(path("/v1/me/library/albums"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let library = aggregator(&server)
            .aggregate_apple_music("user-token", "dev-token")
            .await;

        assert_eq!(library.playlists.len(), 1);
        assert_eq!(library.playlists[0].1.len(), 1);
        assert!(library.songs.is_empty());
        assert!(library.albums.is_empty());
    }

    #[tokio::test]
    async fn test_apple_music_isolates_failed_playlist() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            "/v1/me/library/playlists",
            json!({
                "data": [
                    { "id": "p.1", "attributes": { "name": "Kept" } },
                    { "id": "p.2", "attributes": { "name": "Broken" } },
                    { "id": "p.3", "attributes": { "name": "Also Kept" } }
                ]
            }),
        )
        .await;
        mount_json(
            &server,
            "/v1/me/library/playlists/p.1/tracks",
            json!({ "data": [{ "id": "i.1", "attributes": { "name": "First" } }] }),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/v1/me/library/playlists/p.2/tracks"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        mount_json(
            &server,
            "/v1/me/library/playlists/p.3/tracks",
            json!({
                "data": [
                    { "id": "i.2", "attributes": { "name": "Second" } },
                    { "id": "i.3", "attributes": { "name": "Third" } }
                ]
            }),
        )
        .await;
        mount_json(&server, "/v1/me/library/songs", json!({ "data": [] })).await;
        mount_json(&server, "/v1/me/library/albums", json!({ "data": [] })).await;

        let library = aggregator(&server)
            .aggregate_apple_music("user-token", "dev-token")
            .await;

        let names: Vec<_> = library
            .playlists
            .iter()
            .map(|(p, tracks)| {
                let name = p.attributes.as_ref().and_then(|a| a.name.clone());
                (name.unwrap(), tracks.len())
            })
            .collect();
        assert_eq!(
            names,
            vec![("Kept".to_string(), 1), ("Also Kept".to_string(), 2)]
        );
    }
}
