use crate::error::{AppError, Result};
use crate::models::AccessCredential;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// One decoded page plus the resolved link to the following page, if any.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

/// Authenticated GETs against a streaming-service API, following `next` links.
#[derive(Debug, Clone)]
pub struct PaginatedFetcher {
    client: Client,
}

impl PaginatedFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Collects every page reachable from `url`. A failed page ends the walk and
    /// whatever was accumulated so far is returned.
    pub async fn fetch_all<T: DeserializeOwned>(
        &self,
        url: &str,
        credential: &AccessCredential,
    ) -> Vec<T> {
        let mut items = Vec::new();
        let mut next = Some(url.to_string());

        while let Some(current) = next.take() {
            match self.fetch_page(&current, credential).await {
                Ok(page) => {
                    items.extend(page.items);
                    next = page.next;
                }
                Err(e) => {
                    tracing::error!(
                        "Error fetching {}: {} (keeping {} items)",
                        current,
                        e,
                        items.len()
                    );
                    break;
                }
            }
        }

        items
    }

    /// Like [`fetch_all`](Self::fetch_all), but any failed page fails the whole walk.
    pub async fn try_fetch_all<T: DeserializeOwned>(
        &self,
        url: &str,
        credential: &AccessCredential,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(url.to_string());

        while let Some(current) = next.take() {
            let page = self.fetch_page(&current, credential).await?;
            items.extend(page.items);
            next = page.next;
        }

        Ok(items)
    }

    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        url: &str,
        credential: &AccessCredential,
    ) -> Result<Page<T>> {
        tracing::debug!("Fetching {}", url);

        let response = credential
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| AppError::UpstreamFetch(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamFetch(format!(
                "{} returned status: {} - {}",
                url,
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::UpstreamFetch(format!("Failed to parse response: {}", e)))?;

        Ok(parse_page(url, &body, credential.provider().items_field()))
    }
}

fn parse_page<T: DeserializeOwned>(url: &str, body: &Value, items_field: &str) -> Page<T> {
    let items = body
        .get(items_field)
        .and_then(Value::as_array)
        .map(|raw| {
            raw.iter()
                .filter(|item| !item.is_null())
                .filter_map(|item| match T::deserialize(item) {
                    Ok(decoded) => Some(decoded),
                    Err(e) => {
                        tracing::warn!("Skipping undecodable item from {}: {}", url, e);
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let next = body
        .get("next")
        .and_then(Value::as_str)
        .filter(|link| !link.is_empty())
        .and_then(|link| resolve_link(url, link));

    Page { items, next }
}

/// Resolves a provider `next` link, which may be absolute (Spotify) or
/// origin-relative (Apple Music), against the page it came from.
fn resolve_link(current: &str, link: &str) -> Option<String> {
    match Url::parse(current).and_then(|base| base.join(link)) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            tracing::warn!("Ignoring unusable next link {}: {}", link, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::spotify::TrackItem;
    use serde::Deserialize;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize)]
    struct Named {
        name: String,
    }

    fn spotify() -> AccessCredential {
        AccessCredential::Spotify {
            access_token: "token".to_string(),
        }
    }

    #[test]
    fn test_resolve_relative_apple_link() {
        let next = resolve_link(
            "https://api.music.apple.com/v1/me/library/songs",
            "/v1/me/library/songs?offset=25",
        );
        assert_eq!(
            next.as_deref(),
            Some("https://api.music.apple.com/v1/me/library/songs?offset=25")
        );
    }

    #[test]
    fn test_resolve_absolute_link() {
        let next = resolve_link(
            "https://api.spotify.com/v1/me/tracks",
            "https://api.spotify.com/v1/me/tracks?offset=20&limit=20",
        );
        assert_eq!(
            next.as_deref(),
            Some("https://api.spotify.com/v1/me/tracks?offset=20&limit=20")
        );
    }

    #[test]
    fn test_parse_page_skips_null_and_bad_items() {
        let body = json!({
            "data": [{ "name": "a" }, null, { "name": 5 }, { "name": "b" }],
            "next": null
        });
        let page: Page<Named> = parse_page("http://x/", &body, "data");
        let names: Vec<_> = page.items.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(page.next.is_none());
    }

    #[test]
    fn test_parse_page_without_items_field() {
        let page: Page<Named> = parse_page("http://x/", &json!({ "error": "nope" }), "items");
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_follows_next_links() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/me/tracks"))
            .and(query_param("offset", "1"))
            .and(header("authorization", "Bearer token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{ "track": { "name": "second" } }],
                "next": null
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/me/tracks"))
            .and(header("authorization", "Bearer token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{ "track": { "name": "first" } }],
                "next": format!("{}/v1/me/tracks?offset=1", server.uri())
            })))
            .mount(&server)
            .await;

        let fetcher = PaginatedFetcher::new(Client::new());
        let items: Vec<TrackItem> = fetcher
            .fetch_all(&format!("{}/v1/me/tracks", server.uri()), &spotify())
            .await;

        let names: Vec<_> = items
            .iter()
            .map(|i| i.track.as_ref().and_then(|t| t.name.clone()).unwrap())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_fetch_all_keeps_partial_result_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/me/library/songs"))
            .and(query_param("offset", "1"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/me/library/songs"))
            .and(header("music-user-token", "user"))
            .and(header("authorization", "Bearer dev"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "name": "kept" }],
                "next": "/v1/me/library/songs?offset=1"
            })))
            .mount(&server)
            .await;

        let credential = AccessCredential::AppleMusic {
            user_token: "user".to_string(),
            developer_token: "dev".to_string(),
        };
        let fetcher = PaginatedFetcher::new(Client::new());
        let url = format!("{}/v1/me/library/songs", server.uri());

        let items: Vec<Named> = fetcher.fetch_all(&url, &credential).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "kept");

        let strict: Result<Vec<Named>> = fetcher.try_fetch_all(&url, &credential).await;
        assert!(matches!(strict, Err(AppError::UpstreamFetch(_))));
    }
}
