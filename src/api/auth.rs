use crate::api::AppState;
use crate::error::AppError;
use crate::models::Provider;
use crate::services::auth::AccessGrant;
use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
}

pub fn callback_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/spotify/callback", get(spotify_callback))
        .route("/apple/callback", get(apple_callback).post(apple_callback))
}

async fn spotify_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        tracing::error!("No authorization code received from Spotify");
        return Redirect::to("/?error=no_code");
    };

    let grant = state.tokens.exchange_spotify_code(&code).await;
    redirect_with_token(Provider::Spotify, grant)
}

// Apple posts the code with response_mode=form_post; plain redirects carry it in the query
async fn apple_callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackParams>,
    form: Option<Form<CallbackParams>>,
) -> Redirect {
    let code = form
        .and_then(|Form(f)| f.code)
        .or(query.code)
        .filter(|c| !c.is_empty());

    let Some(code) = code else {
        tracing::error!("No authorization code received from Apple");
        return Redirect::to("/?error=no_code");
    };

    let grant = state.tokens.exchange_apple_code(&code).await;
    redirect_with_token(Provider::AppleMusic, grant)
}

fn redirect_with_token(provider: Provider, grant: crate::error::Result<AccessGrant>) -> Redirect {
    match grant {
        Ok(grant) => {
            tracing::info!(
                "{} token issued (expires in {:?}s)",
                provider,
                grant.expires_in
            );
            Redirect::to(&format!("/?{}_token={}", provider, grant.access_token))
        }
        Err(e @ AppError::UpstreamAuth(_)) => {
            tracing::error!("{} token exchange failed: {}", provider, e);
            Redirect::to("/?error=token_exchange_failed")
        }
        Err(e) => {
            tracing::error!("Error in {} callback: {}", provider, e);
            Redirect::to(&format!("/?error={}_auth_failed", provider))
        }
    }
}
