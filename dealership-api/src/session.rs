//! Sign-in sessions and the per-request identity context
//!
//! Sessions live in process memory and are keyed by a random UUID carried in
//! the `sessionid` cookie. Handlers never look up the current user on their
//! own: they take a [`RequestContext`] extracted from the request.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use chrono::{DateTime, Duration, Utc};
use dealership_common::db::users::Principal;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::AppState;

/// Cookie holding the session id
pub const SESSION_COOKIE: &str = "sessionid";

/// An established session
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub principal: Principal,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// In-memory session store
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Start a session for `principal`
    ///
    /// Expired sessions are swept out at the same time, so abandoned
    /// cookies do not accumulate.
    pub async fn establish(&self, principal: Principal) -> Session {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            principal,
            expires_at: now + self.ttl,
        };

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, existing| !existing.is_expired(now));
        sessions.insert(session.id.clone(), session.clone());
        tracing::debug!(username = %session.principal.username, "Session established");
        session
    }

    /// Principal behind a live session id
    ///
    /// An expired session is removed and treated as absent.
    pub async fn resolve(&self, session_id: &str) -> Option<Principal> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(session_id) {
                Some(session) if !session.is_expired(now) => {
                    return Some(session.principal.clone())
                }
                Some(_) => {}
                None => return None,
            }
        }

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, session| !session.is_expired(now));
        None
    }

    /// End a session; unknown ids are ignored
    pub async fn terminate(&self, session_id: &str) {
        let removed = self.sessions.write().await.remove(session_id);
        if let Some(session) = removed {
            tracing::debug!(username = %session.principal.username, "Session terminated");
        }
    }

    /// Number of stored sessions, expired ones included until pruned
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// `Set-Cookie` value for a new session
    pub fn set_cookie(&self, session: &Session) -> String {
        format!(
            "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE,
            session.id,
            self.ttl.num_seconds()
        )
    }

    /// `Set-Cookie` value that clears the session cookie
    pub fn clear_cookie(&self) -> String {
        format!("{}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
    }
}

/// Read one cookie from the request headers
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Identity of the caller for one request
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Session id presented by the client, live or not
    pub session_id: Option<String>,
    principal: Option<Principal>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// "First Last" of the signed-in user, if any
    pub fn display_name(&self) -> Option<String> {
        self.principal.as_ref().map(Principal::display_name)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(session_id) = cookie_value(&parts.headers, SESSION_COOKIE) else {
            return Ok(Self::anonymous());
        };

        let principal = state.sessions.resolve(&session_id).await;
        Ok(Self {
            session_id: Some(session_id),
            principal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn principal(username: &str) -> Principal {
        Principal {
            id: 1,
            username: username.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_establish_and_resolve() {
        let store = SessionStore::new(Duration::hours(1));
        let session = store.establish(principal("ada")).await;

        let resolved = store.resolve(&session.id).await.unwrap();
        assert_eq!(resolved.username, "ada");
        assert!(store.resolve("no-such-session").await.is_none());
    }

    #[tokio::test]
    async fn test_terminate() {
        let store = SessionStore::new(Duration::hours(1));
        let session = store.establish(principal("ada")).await;

        store.terminate(&session.id).await;
        store.terminate(&session.id).await;

        assert!(store.resolve(&session.id).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_expired_session_pruned_on_resolve() {
        let store = SessionStore::new(Duration::seconds(-1));
        let stale = store.establish(principal("ada")).await;
        assert_eq!(store.len().await, 1);

        assert!(store.resolve(&stale.id).await.is_none());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_establish_sweeps_abandoned_sessions() {
        let store = SessionStore::new(Duration::hours(1));

        // Sessions whose cookies never come back
        {
            let mut sessions = store.sessions.write().await;
            for i in 0..5 {
                let id = format!("abandoned-{}", i);
                sessions.insert(
                    id.clone(),
                    Session {
                        id,
                        principal: principal("ghost"),
                        expires_at: Utc::now() - Duration::minutes(1),
                    },
                );
            }
        }
        assert_eq!(store.len().await, 5);

        let live = store.establish(principal("ada")).await;
        assert_eq!(store.len().await, 1);
        assert!(store.resolve(&live.id).await.is_some());
    }

    #[tokio::test]
    async fn test_cookie_strings() {
        let store = SessionStore::new(Duration::hours(24));
        let session = store.establish(principal("ada")).await;

        let set = store.set_cookie(&session);
        assert!(set.starts_with(&format!("sessionid={};", session.id)));
        assert!(set.contains("HttpOnly"));
        assert!(set.contains("Max-Age=86400"));
        assert!(store.clear_cookie().contains("Max-Age=0"));
    }

    #[test]
    fn test_cookie_value_parsing() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark; csrftoken=abc"));
        headers.append(header::COOKIE, HeaderValue::from_static("sessionid= 1234 "));

        assert_eq!(cookie_value(&headers, "sessionid").as_deref(), Some("1234"));
        assert_eq!(cookie_value(&headers, "theme").as_deref(), Some("dark"));
        assert_eq!(cookie_value(&headers, "missing"), None);

        let mut empty = HeaderMap::new();
        empty.insert(header::COOKIE, HeaderValue::from_static("sessionid="));
        assert_eq!(cookie_value(&empty, "sessionid"), None);
    }

    #[test]
    fn test_context_display_name() {
        let ctx = RequestContext {
            session_id: Some("x".into()),
            principal: Some(principal("ada")),
        };
        assert!(ctx.is_authenticated());
        assert_eq!(ctx.display_name().as_deref(), Some("Ada Lovelace"));
        assert!(!RequestContext::anonymous().is_authenticated());
    }
}
