//! HTTP front end for Hiroba.
//!
//! Wraps the [`hiroba_api`] router with the concerns it leaves to its host:
//! Basic authentication against a [`UserStore`], resolution of the client
//! address into an [`OriginToken`](hiroba_core::origin::OriginToken), and
//! request tracing.

pub mod auth;
pub mod error;
pub mod origin;
pub mod settings;
pub mod sweep;

pub use error::Error;
pub use settings::ServerConfig;

use std::{net::SocketAddr, sync::Arc};

use axum::{
  Router,
  extract::{ConnectInfo, Request, State},
  http::{HeaderValue, StatusCode, header},
  middleware::{self, Next},
  response::{IntoResponse, Response},
};
use hiroba_core::store::{ForumStore, UserStore};
use tower_http::trace::TraceLayer;

// ─── Application state ────────────────────────────────────────────────────────

/// State seen by the identity middleware.
pub struct AppState<U> {
  pub users:  Arc<U>,
  pub config: Arc<ServerConfig>,
}

impl<U> Clone for AppState<U> {
  fn clone(&self) -> Self {
    Self { users: self.users.clone(), config: self.config.clone() }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the complete application router.
pub fn router<S, U>(forum: Arc<S>, state: AppState<U>) -> Router
where
  S: ForumStore + 'static,
  U: UserStore + 'static,
{
  hiroba_api::api_router(forum)
    .layer(middleware::from_fn_with_state(state, identify::<U>))
    .layer(TraceLayer::new_for_http())
}

/// Attach the caller (if credentials were offered) and the anonymised
/// origin to the request. Wrong credentials stop the request here.
async fn identify<U: UserStore + 'static>(
  State(state): State<AppState<U>>,
  mut req: Request,
  next: Next,
) -> Response {
  let peer = req
    .extensions()
    .get::<ConnectInfo<SocketAddr>>()
    .map(|ConnectInfo(addr)| *addr);
  let token = origin::resolve(req.headers(), peer, state.config.trust_forwarded_for);

  match auth::verify_auth(req.headers(), state.users.as_ref()).await {
    Ok(Some(caller)) => {
      req.extensions_mut().insert(caller);
    }
    Ok(None) => {}
    Err(e) => {
      tracing::debug!(error = %e, origin = %token, "authentication failed");
      return e.into_response();
    }
  }
  req.extensions_mut().insert(token);

  let mut res = next.run(req).await;
  if res.status() == StatusCode::UNAUTHORIZED {
    res
      .headers_mut()
      .entry(header::WWW_AUTHENTICATE)
      .or_insert(HeaderValue::from_static(error::CHALLENGE));
  }
  res
}
