use std::env;

pub const SPOTIFY_API_BASE_URL: &str = "https://api.spotify.com/v1";
pub const SPOTIFY_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
pub const APPLE_MUSIC_API_BASE_URL: &str = "https://api.music.apple.com/v1";
pub const APPLE_AUTH_URL: &str = "https://appleid.apple.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub spotify: SpotifyConfig,
    pub apple: AppleConfig,
    pub storage: StorageConfig,
    pub server_host: String,
    pub server_port: u16,
    /// Allowed CORS origins (comma-separated). Use "*" for any origin (development only).
    pub cors_origins: Vec<String>,
    /// Directory holding the pre-built frontend bundle, if this process serves it.
    pub static_dir: Option<String>,
    /// Optional cap on in-flight per-playlist fetches within one export.
    /// Unset means every playlist is fetched at once.
    pub export_concurrency: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub api_base_url: String,
    pub accounts_url: String,
}

#[derive(Debug, Clone)]
pub struct AppleConfig {
    pub team_id: String,
    pub key_id: String,
    /// PKCS#8 PEM of the MusicKit / Sign in with Apple key.
    pub private_key: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub music_api_base_url: String,
    pub auth_url: String,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub endpoint_url: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "https://www.libx.stream,https://libx.stream".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let account_id = required("R2_ACCOUNT_ID")?;

        Ok(Config {
            spotify: SpotifyConfig {
                client_id: required("SPOTIFY_CLIENT_ID")?,
                client_secret: required("SPOTIFY_CLIENT_SECRET")?,
                redirect_uri: required("SPOTIFY_REDIRECT_URI")?,
                api_base_url: env::var("SPOTIFY_API_BASE_URL")
                    .unwrap_or_else(|_| SPOTIFY_API_BASE_URL.to_string()),
                accounts_url: env::var("SPOTIFY_ACCOUNTS_URL")
                    .unwrap_or_else(|_| SPOTIFY_ACCOUNTS_URL.to_string()),
            },
            apple: AppleConfig {
                team_id: env::var("APPLE_TEAM_ID").unwrap_or_default(),
                key_id: env::var("APPLE_KEY_ID").unwrap_or_default(),
                // Keys pasted into a single-line env var carry escaped newlines
                private_key: env::var("APPLE_PRIVATE_KEY")
                    .unwrap_or_default()
                    .replace("\\n", "\n"),
                client_id: env::var("APPLE_CLIENT_ID").unwrap_or_default(),
                redirect_uri: env::var("APPLE_REDIRECT_URI").unwrap_or_default(),
                music_api_base_url: env::var("APPLE_MUSIC_API_BASE_URL")
                    .unwrap_or_else(|_| APPLE_MUSIC_API_BASE_URL.to_string()),
                auth_url: env::var("APPLE_AUTH_URL")
                    .unwrap_or_else(|_| APPLE_AUTH_URL.to_string()),
            },
            storage: StorageConfig {
                bucket: required("R2_BUCKET_NAME")?,
                endpoint_url: env::var("R2_ENDPOINT_URL").unwrap_or_else(|_| {
                    format!("https://{}.r2.cloudflarestorage.com", account_id)
                }),
                access_key_id: required("R2_ACCESS_KEY_ID")?,
                secret_access_key: required("R2_SECRET_ACCESS_KEY")?,
            },
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .unwrap_or(8000),
            cors_origins,
            static_dir: env::var("STATIC_DIR").ok().filter(|s| !s.is_empty()),
            export_concurrency: env::var("EXPORT_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0),
        })
    }
}

fn required(name: &str) -> Result<String, anyhow::Error> {
    env::var(name).map_err(|_| anyhow::anyhow!("{} environment variable must be set", name))
}

#[cfg(test)]
impl Config {
    /// Config pointing every upstream at a single mock server.
    pub fn for_upstream(base: &str) -> Self {
        Config {
            spotify: SpotifyConfig {
                client_id: "client-id".to_string(),
                client_secret: "client-secret".to_string(),
                redirect_uri: "http://localhost:8000/api/spotify/callback".to_string(),
                api_base_url: format!("{}/v1", base),
                accounts_url: base.to_string(),
            },
            apple: AppleConfig {
                team_id: "TEAM123456".to_string(),
                key_id: "KEY1234567".to_string(),
                private_key: crate::services::auth::tests::TEST_PRIVATE_KEY.to_string(),
                client_id: "stream.libx.web".to_string(),
                redirect_uri: "http://localhost:8000/api/apple/callback".to_string(),
                music_api_base_url: format!("{}/v1", base),
                auth_url: base.to_string(),
            },
            storage: StorageConfig {
                bucket: "exports".to_string(),
                endpoint_url: "http://localhost:9000".to_string(),
                access_key_id: "test".to_string(),
                secret_access_key: "test".to_string(),
            },
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            cors_origins: vec!["*".to_string()],
            static_dir: None,
            export_concurrency: None,
        }
    }
}
