use crate::csrf::csrf_cookie;
use crate::state::AppState;
use axum::{extract::State, Json};
use axum_extra::extract::CookieJar;
use serde_json::{json, Value};

/// Issue a fresh token in the body and mirror it in a script-readable cookie
pub async fn csrf_token(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<Value>) {
    let token = state.csrf.generate().await;
    let jar = jar.add(csrf_cookie(token.clone(), state.config.cookie_secure()));
    (jar, Json(json!({ "token": token })))
}
