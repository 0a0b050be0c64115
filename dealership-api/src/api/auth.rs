//! Sign-in, sign-out and registration
//!
//! These endpoints answer 200 for well-formed requests whether or not the
//! credentials were accepted. A failed sign-in is an envelope without a
//! `status` field; a taken username carries `error: "Already Registered"`.
//! Clients rely on that shape, so it is kept.

use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use dealership_common::db::users::{self, NewPrincipal, Principal};
use serde::{Deserialize, Serialize};

use super::parse_json;
use crate::error::ApiResult;
use crate::session::RequestContext;
use crate::AppState;

const AUTHENTICATED: &str = "Authenticated";
const ALREADY_REGISTERED: &str = "Already Registered";

#[derive(Debug, Deserialize)]
struct SignInRequest {
    #[serde(rename = "userName")]
    user_name: String,
    password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    user_name: String,
    password: String,
    first_name: String,
    last_name: String,
    email: String,
}

/// Answer to a sign-in attempt
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SignInOutcome {
    Authenticated {
        #[serde(rename = "userName")]
        user_name: String,
        status: &'static str,
    },
    Rejected {
        #[serde(rename = "userName")]
        user_name: String,
    },
}

/// Answer to a registration attempt
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RegisterOutcome {
    Registered {
        #[serde(rename = "userName")]
        user_name: String,
        status: &'static str,
    },
    AlreadyRegistered {
        #[serde(rename = "userName")]
        user_name: String,
        error: &'static str,
    },
}

#[derive(Debug, Serialize)]
pub struct SignedOut {
    #[serde(rename = "userName")]
    pub user_name: String,
}

/// Replace any session the caller holds with a new one for `principal`
async fn start_session(state: &AppState, ctx: &RequestContext, principal: Principal) -> String {
    if let Some(old) = ctx.session_id.as_deref() {
        state.sessions.terminate(old).await;
    }
    let session = state.sessions.establish(principal).await;
    state.sessions.set_cookie(&session)
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    ctx: RequestContext,
    body: Bytes,
) -> ApiResult<Response> {
    let request: SignInRequest = parse_json(&body)?;

    match users::authenticate(&state.db, &request.user_name, &request.password).await? {
        Some(principal) => {
            tracing::info!(username = %request.user_name, "User signed in");
            let cookie = start_session(&state, &ctx, principal).await;
            let outcome = SignInOutcome::Authenticated {
                user_name: request.user_name,
                status: AUTHENTICATED,
            };
            Ok(([(header::SET_COOKIE, cookie)], Json(outcome)).into_response())
        }
        None => {
            tracing::info!(username = %request.user_name, "Sign-in refused");
            let outcome = SignInOutcome::Rejected {
                user_name: request.user_name,
            };
            Ok(Json(outcome).into_response())
        }
    }
}

/// GET|POST /api/logout
pub async fn logout(State(state): State<AppState>, ctx: RequestContext) -> Response {
    if let Some(session_id) = ctx.session_id.as_deref() {
        state.sessions.terminate(session_id).await;
    }
    if let Some(principal) = ctx.principal() {
        tracing::info!(username = %principal.username, "User signed out");
    }

    let body = SignedOut {
        user_name: String::new(),
    };
    ([(header::SET_COOKIE, state.sessions.clear_cookie())], Json(body)).into_response()
}

/// POST /api/register
pub async fn register(
    State(state): State<AppState>,
    ctx: RequestContext,
    body: Bytes,
) -> ApiResult<Response> {
    let request: RegisterRequest = parse_json(&body)?;
    let new = NewPrincipal {
        username: request.user_name.clone(),
        first_name: request.first_name,
        last_name: request.last_name,
        email: request.email,
    };

    match users::create_principal(&state.db, &new, &request.password).await {
        Ok(principal) => {
            tracing::info!(username = %request.user_name, "Registered new user");
            let cookie = start_session(&state, &ctx, principal).await;
            let outcome = RegisterOutcome::Registered {
                user_name: request.user_name,
                status: AUTHENTICATED,
            };
            Ok(([(header::SET_COOKIE, cookie)], Json(outcome)).into_response())
        }
        Err(err) if err.is_conflict() => {
            tracing::debug!(username = %request.user_name, "Username already registered");
            let outcome = RegisterOutcome::AlreadyRegistered {
                user_name: request.user_name,
                error: ALREADY_REGISTERED,
            };
            Ok(Json(outcome).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outcome_shapes() {
        let ok = SignInOutcome::Authenticated {
            user_name: "ada".into(),
            status: AUTHENTICATED,
        };
        let refused = SignInOutcome::Rejected {
            user_name: "ada".into(),
        };
        assert_eq!(
            serde_json::to_value(ok).unwrap(),
            json!({"userName": "ada", "status": "Authenticated"})
        );
        assert_eq!(serde_json::to_value(refused).unwrap(), json!({"userName": "ada"}));

        let taken = RegisterOutcome::AlreadyRegistered {
            user_name: "ada".into(),
            error: ALREADY_REGISTERED,
        };
        assert_eq!(
            serde_json::to_value(taken).unwrap(),
            json!({"userName": "ada", "error": "Already Registered"})
        );
    }

    #[test]
    fn test_register_request_keys() {
        let request: RegisterRequest = serde_json::from_value(json!({
            "userName": "ada",
            "password": "pw",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com"
        }))
        .unwrap();
        assert_eq!(request.user_name, "ada");
        assert_eq!(request.last_name, "Lovelace");
    }
}
