//! Single-shot local listener that captures the OAuth2 redirect.
//!
//! # Design
//! The listener is a scoped resource: `bind` starts an axum server on the
//! redirect address, the first request on the redirect path resolves a
//! oneshot channel, and `wait` stops the server before returning. Dropping
//! the listener (e.g. when the caller's future is cancelled) aborts the
//! server task.
//!
//! The redirect path is matched literally in a fallback handler: axum would
//! read `/:cb` or `/{cb}` as route patterns.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{header, StatusCode, Uri};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::{Host, Url};

use crate::error::AuthError;

type Outcome = Result<String, AuthError>;

/// Host, port and path extracted from a redirect URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RedirectTarget {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl RedirectTarget {
    pub(crate) fn parse(redirect_url: &str) -> Result<Self, AuthError> {
        let invalid = |reason: &str| AuthError::InvalidRedirectUrl {
            url: redirect_url.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(redirect_url).map_err(|e| invalid(&e.to_string()))?;
        if url.scheme() != "http" {
            return Err(invalid("only plain http redirects can be served locally"));
        }
        let host = match url.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            None => return Err(invalid("missing host")),
        };
        let port = url
            .port_or_known_default()
            .ok_or_else(|| invalid("missing port"))?;
        let path = match url.path() {
            "" => "/".to_string(),
            path => path.to_string(),
        };
        Ok(Self { host, port, path })
    }
}

#[derive(Clone)]
struct CallbackState {
    path: Arc<str>,
    expected_state: Arc<str>,
    outcome: Arc<Mutex<Option<oneshot::Sender<Outcome>>>>,
}

pub(crate) struct CallbackListener {
    local_addr: SocketAddr,
    outcome: oneshot::Receiver<Outcome>,
    shutdown: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<()>>,
}

impl CallbackListener {
    /// Start serving `target.path`. Returns once the socket accepts connections.
    pub(crate) async fn bind(
        target: &RedirectTarget,
        expected_state: &str,
    ) -> Result<Self, AuthError> {
        let listener = TcpListener::bind((target.host.as_str(), target.port)).await?;
        let local_addr = listener.local_addr()?;

        let (outcome_tx, outcome_rx) = oneshot::channel();
        let state = CallbackState {
            path: Arc::from(target.path.as_str()),
            expected_state: Arc::from(expected_state),
            outcome: Arc::new(Mutex::new(Some(outcome_tx))),
        };
        let app = Router::new().fallback(handle_callback).with_state(state);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = serve.await {
                warn!(error = %e, "redirect listener failed");
            }
        });

        info!(%local_addr, path = %target.path, "redirect listener started");
        Ok(Self {
            local_addr,
            outcome: outcome_rx,
            shutdown: Some(shutdown_tx),
            server: Some(server),
        })
    }

    pub(crate) fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait for the single callback, then stop the server.
    pub(crate) async fn wait(mut self) -> Outcome {
        let outcome = (&mut self.outcome).await;
        self.stop().await;
        outcome.unwrap_or_else(|_| Err(AuthError::ListenerClosed))
    }

    async fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(server) = self.server.take() {
            let _ = server.await;
        }
        info!(local_addr = %self.local_addr, "redirect listener stopped");
    }
}

impl Drop for CallbackListener {
    fn drop(&mut self) {
        if let Some(server) = self.server.take() {
            server.abort();
        }
    }
}

async fn handle_callback(
    State(state): State<CallbackState>,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    let close = [(header::CONNECTION, "close")];

    if uri.path() != &*state.path {
        debug!(path = uri.path(), "ignoring request outside the redirect path");
        let status = StatusCode::NOT_FOUND;
        return (status, close, status.to_string());
    }

    let sender = state
        .outcome
        .lock()
        .ok()
        .and_then(|mut slot| slot.take());
    let Some(sender) = sender else {
        debug!("ignoring callback after the first one");
        let status = StatusCode::GONE;
        return (status, close, format!("{status}: Authorization already handled."));
    };

    let outcome = validate_callback(&params, &state.expected_state);
    let (status, message) = match &outcome {
        Ok(_) => (StatusCode::OK, "Authorization accepted.".to_string()),
        Err(e) => {
            warn!(error = %e, "authorization callback rejected");
            (StatusCode::BAD_REQUEST, e.to_string())
        }
    };
    let _ = sender.send(outcome);
    (status, close, format!("{status}: {message}"))
}

fn validate_callback(params: &HashMap<String, String>, expected_state: &str) -> Outcome {
    if let Some(error) = params.get("error") {
        return Err(AuthError::Denied {
            error: error.clone(),
            description: params.get("error_description").cloned(),
        });
    }
    let state = params
        .get("state")
        .ok_or(AuthError::MissingParameter("state"))?;
    if state != expected_state {
        return Err(AuthError::StateMismatch {
            expected: expected_state.to_string(),
            actual: state.clone(),
        });
    }
    params
        .get("code")
        .cloned()
        .ok_or(AuthError::MissingParameter("code"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parse_redirect_target() {
        let target = RedirectTarget::parse("http://localhost:8889/ticktick-callback").unwrap();
        assert_eq!(
            target,
            RedirectTarget {
                host: "localhost".to_string(),
                port: 8889,
                path: "/ticktick-callback".to_string(),
            }
        );
    }

    #[test]
    fn parse_redirect_target_defaults() {
        let target = RedirectTarget::parse("http://127.0.0.1").unwrap();
        assert_eq!(target.port, 80);
        assert_eq!(target.path, "/");

        let target = RedirectTarget::parse("http://[::1]:9000/cb").unwrap();
        assert_eq!(target.host, "::1");
    }

    #[test]
    fn parse_redirect_target_rejects_https_and_garbage() {
        assert!(matches!(
            RedirectTarget::parse("https://localhost:8889/cb"),
            Err(AuthError::InvalidRedirectUrl { .. })
        ));
        assert!(matches!(
            RedirectTarget::parse("not a url"),
            Err(AuthError::InvalidRedirectUrl { .. })
        ));
    }

    #[test]
    fn validate_accepts_matching_state() {
        let code = validate_callback(&params(&[("state", "s1"), ("code", "c0de")]), "s1").unwrap();
        assert_eq!(code, "c0de");
    }

    #[test]
    fn validate_error_parameter_wins() {
        let err = validate_callback(
            &params(&[("error", "access_denied"), ("state", "s1"), ("code", "c")]),
            "s1",
        )
        .unwrap_err();
        assert!(matches!(err, AuthError::Denied { ref error, .. } if error == "access_denied"));
    }

    #[test]
    fn validate_state_mismatch() {
        let err = validate_callback(&params(&[("state", "other"), ("code", "c")]), "s1").unwrap_err();
        assert!(matches!(err, AuthError::StateMismatch { ref actual, .. } if actual == "other"));
    }

    #[test]
    fn validate_forged_state_without_code_is_a_mismatch() {
        let err = validate_callback(&params(&[("state", "forged")]), "s1").unwrap_err();
        assert!(matches!(err, AuthError::StateMismatch { ref actual, .. } if actual == "forged"));
    }

    #[test]
    fn parse_redirect_target_keeps_pattern_like_paths() {
        let target = RedirectTarget::parse("http://127.0.0.1:9000/:cb").unwrap();
        assert_eq!(target.path, "/:cb");
        let target = RedirectTarget::parse("http://127.0.0.1:9000/*rest").unwrap();
        assert_eq!(target.path, "/*rest");
    }

    #[test]
    fn validate_missing_parameters() {
        let err = validate_callback(&params(&[("code", "c")]), "s1").unwrap_err();
        assert!(matches!(err, AuthError::MissingParameter("state")));
        let err = validate_callback(&params(&[("state", "s1")]), "s1").unwrap_err();
        assert!(matches!(err, AuthError::MissingParameter("code")));
    }

    fn callback_state(path: &str) -> (CallbackState, oneshot::Receiver<Outcome>) {
        let (tx, rx) = oneshot::channel();
        let state = CallbackState {
            path: Arc::from(path),
            expected_state: Arc::from("s1"),
            outcome: Arc::new(Mutex::new(Some(tx))),
        };
        (state, rx)
    }

    #[tokio::test]
    async fn only_first_callback_is_processed() {
        let (state, mut rx) = callback_state("/cb");
        let good = params(&[("state", "s1"), ("code", "c0de")]);
        let uri = Uri::from_static("/cb?state=s1&code=c0de");

        let (status, headers, body) =
            handle_callback(State(state.clone()), uri.clone(), Query(good.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[0].1, "close");
        assert_eq!(body, "200 OK: Authorization accepted.");

        let (status, _, _) = handle_callback(State(state), uri, Query(good)).await;
        assert_eq!(status, StatusCode::GONE);

        assert_eq!(rx.try_recv().unwrap().unwrap(), "c0de");
    }

    #[tokio::test]
    async fn other_paths_do_not_consume_the_callback() {
        let (state, mut rx) = callback_state("/:cb");
        let good = params(&[("state", "s1"), ("code", "c0de")]);

        let (status, _, _) = handle_callback(
            State(state.clone()),
            Uri::from_static("/favicon.ico"),
            Query(HashMap::new()),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(rx.try_recv().is_err());

        let (status, _, _) =
            handle_callback(State(state), Uri::from_static("/:cb?state=s1&code=c0de"), Query(good))
                .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rx.try_recv().unwrap().unwrap(), "c0de");
    }
}
