//! User routes — identity, credit position, and bonus credit grants.

use axum::{
    extract::{Extension, Path, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use muster_common::{
    error::{MusterError, MusterResult},
    models::user::{
        BonusCredit, CreateRankRequest, GrantBonusCreditRequest, Rank, UpsertUserRequest, User,
        UserIdentity,
    },
    snowflake,
    validation::validate_request,
};
use muster_db::repository::{credits, ranks, users};
use muster_engine::credit;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    middleware::{require_admin, AuthContext},
    AppState,
};

/// User routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/me", get(get_me))
        .route("/users", post(upsert_user))
        .route("/users/{user_id}/credit", get(get_credit))
        .route(
            "/users/{user_id}/ranks/{rank_id}",
            axum::routing::put(assign_rank).delete(revoke_rank),
        )
        .route("/ranks", get(list_ranks).post(create_rank))
        .route("/credits", post(grant_credit))
        .route_layer(middleware::from_fn(crate::middleware::auth_middleware))
}

/// GET /api/v1/users/me
async fn get_me(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
) -> MusterResult<Json<UserIdentity>> {
    let identity = users::load_identity(&state.db.pool, auth.user_id)
        .await?
        .ok_or(MusterError::NotFound {
            resource: "User".into(),
        })?;
    Ok(Json(identity))
}

/// GET /api/v1/users/:user_id/credit
///
/// Users may inspect their own position; admins anyone's.
async fn get_credit(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> MusterResult<Json<credit::CreditSummary>> {
    if auth.user_id != user_id && !auth.is_admin() {
        return Err(MusterError::Forbidden);
    }
    let summary = credit::summary(&state.db, user_id).await?;
    Ok(Json(summary))
}

/// POST /api/v1/users — admin identity sync from the chat platform.
/// Idempotent on platform_id.
async fn upsert_user(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<UpsertUserRequest>,
) -> MusterResult<Json<User>> {
    require_admin(&auth)?;
    validate_request(&body)?;

    let user = users::upsert_user(
        &state.db.pool,
        snowflake::generate_id(),
        &body.platform_id,
        &body.display_name,
        body.avatar.as_deref(),
    )
    .await?;
    Ok(Json(user))
}

/// GET /api/v1/ranks
async fn list_ranks(State(state): State<Arc<AppState>>) -> MusterResult<Json<Vec<Rank>>> {
    let all = ranks::list_ranks(&state.db.pool).await?;
    Ok(Json(all))
}

/// POST /api/v1/ranks — admin rank definition.
async fn create_rank(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateRankRequest>,
) -> MusterResult<Json<Rank>> {
    require_admin(&auth)?;
    validate_request(&body)?;

    let rank = ranks::create_rank(
        &state.db.pool,
        snowflake::generate_id(),
        &body.name,
        body.priority,
        body.max_games,
        body.patron,
    )
    .await?;

    tracing::info!(rank = %rank.name, by = %auth.user_id, "Rank created");
    Ok(Json(rank))
}

/// PUT /api/v1/users/:user_id/ranks/:rank_id — admin rank grant.
async fn assign_rank(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((user_id, rank_id)): Path<(Uuid, Uuid)>,
) -> MusterResult<axum::http::StatusCode> {
    require_admin(&auth)?;
    ranks::assign_rank(&state.db.pool, user_id, rank_id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/users/:user_id/ranks/:rank_id
async fn revoke_rank(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((user_id, rank_id)): Path<(Uuid, Uuid)>,
) -> MusterResult<axum::http::StatusCode> {
    require_admin(&auth)?;
    ranks::revoke_rank(&state.db.pool, user_id, rank_id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// POST /api/v1/credits — admin bonus credit grant.
async fn grant_credit(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<GrantBonusCreditRequest>,
) -> MusterResult<Json<BonusCredit>> {
    require_admin(&auth)?;
    validate_request(&body)?;

    let grant = credits::grant(
        &state.db.pool,
        snowflake::generate_id(),
        body.user_id,
        body.credits,
        body.reason.as_deref(),
        body.expires_at,
    )
    .await?;

    tracing::info!(
        user_id = %body.user_id,
        credits = body.credits,
        by = %auth.user_id,
        "Bonus credit granted"
    );

    Ok(Json(grant))
}
