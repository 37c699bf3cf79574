use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};

/// Serves the pre-built frontend bundle, falling back to `index.html` for client-side routes.
pub fn serve_frontend(dir: &str) -> ServeDir<ServeFile> {
    ServeDir::new(dir).fallback(ServeFile::new(Path::new(dir).join("index.html")))
}
