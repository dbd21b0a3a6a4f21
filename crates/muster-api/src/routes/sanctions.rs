//! Sanction routes — admin-only bans and strikes.

use axum::{
    extract::{Extension, Path, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use muster_common::{
    error::MusterResult,
    models::sanction::{Ban, IssueBanRequest, IssueStrikeRequest, Strike},
    validation::validate_request,
};
use muster_db::repository::{bans, strikes};
use muster_engine::sanctions;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    middleware::{require_admin, AuthContext},
    AppState,
};

/// Sanction routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bans", post(issue_ban))
        .route("/strikes", post(issue_strike))
        .route("/users/{user_id}/ban", get(get_ban))
        .route("/users/{user_id}/bans", get(list_bans))
        .route("/users/{user_id}/strikes", get(list_strikes))
        .route_layer(middleware::from_fn(crate::middleware::auth_middleware))
}

/// POST /api/v1/bans
async fn issue_ban(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<IssueBanRequest>,
) -> MusterResult<Json<sanctions::BanIssued>> {
    require_admin(&auth)?;
    validate_request(&body)?;

    let issued = sanctions::issue_ban(
        &state.db,
        state.platform.as_ref(),
        body.user_id,
        auth.user_id,
        &body.reason,
        body.kind,
        body.duration_days,
    )
    .await?;

    Ok(Json(issued))
}

/// POST /api/v1/strikes
async fn issue_strike(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<IssueStrikeRequest>,
) -> MusterResult<Json<sanctions::StrikeOutcome>> {
    require_admin(&auth)?;
    validate_request(&body)?;

    let outcome =
        sanctions::issue_strike(&state.db, body.user_id, auth.user_id, &body.reason).await?;

    Ok(Json(outcome))
}

/// GET /api/v1/users/:user_id/ban — the ban currently gating this user, if any.
async fn get_ban(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> MusterResult<Json<Option<Ban>>> {
    require_admin(&auth)?;
    let ban = sanctions::current_ban(&state.db, user_id).await?;
    Ok(Json(ban))
}

/// GET /api/v1/users/:user_id/bans — full ban history, newest first.
async fn list_bans(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> MusterResult<Json<Vec<Ban>>> {
    require_admin(&auth)?;
    let history = bans::list_for_user(&state.db.pool, user_id).await?;
    Ok(Json(history))
}

/// GET /api/v1/users/:user_id/strikes
async fn list_strikes(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> MusterResult<Json<Vec<Strike>>> {
    require_admin(&auth)?;
    let all = strikes::list_for_user(&state.db.pool, user_id).await?;
    Ok(Json(all))
}
