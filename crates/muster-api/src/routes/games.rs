//! Game routes — listing, creation, rosters, and the signup/dropout flow.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use muster_common::{
    error::{MusterError, MusterResult},
    models::game::{CreateGameRequest, Game, GameResponse},
    models::player::{PlayerEntry, PlayerResponse},
    snowflake,
    validation::validate_request,
};
use muster_db::repository::{games, players, users};
use muster_engine::{lifecycle, roster};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    middleware::{require_dm_or_admin, AuthContext},
    AppState,
};

/// Game routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/games", get(list_games).post(create_game))
        .route("/games/{game_id}", get(get_game).delete(withdraw_game))
        .route("/games/{game_id}/roster", get(get_roster))
        .route("/games/{game_id}/signup", post(signup))
        .route("/games/{game_id}/dropout", post(drop_out))
        .route(
            "/games/{game_id}/players/{user_id}",
            post(force_add_player).delete(force_remove_player),
        )
        .route_layer(middleware::from_fn(crate::middleware::auth_middleware))
}

fn to_response(game: Game) -> GameResponse {
    let patron_exclusive = lifecycle::is_patron_exclusive(&game, Utc::now());
    GameResponse {
        id: game.id,
        dm_id: game.dm_id,
        name: game.name,
        module: game.module,
        description: game.description,
        max_players: game.max_players,
        start_at: game.start_at,
        status: game.status,
        patron_exclusive,
    }
}

/// GET /api/v1/games — upcoming games currently open for signup. Patrons
/// also see games still inside their priority window.
async fn list_games(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
) -> MusterResult<Json<Vec<GameResponse>>> {
    let is_patron = users::load_identity(&state.db.pool, auth.user_id)
        .await?
        .is_some_and(|identity| identity.is_patron());
    let upcoming = games::list_joinable(&state.db.pool, Utc::now(), is_patron).await?;
    Ok(Json(upcoming.into_iter().map(to_response).collect()))
}

/// POST /api/v1/games
async fn create_game(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateGameRequest>,
) -> MusterResult<Json<GameResponse>> {
    validate_request(&body)?;

    if body.start_at < Utc::now() {
        return Err(MusterError::Validation {
            message: "start_at must not be in the past".into(),
        });
    }
    if body.release_priority_at.is_none() && body.release_open_at.is_none() {
        return Err(MusterError::Validation {
            message: "at least one release timestamp is required".into(),
        });
    }
    if let (Some(prio), Some(open)) = (body.release_priority_at, body.release_open_at) {
        if open < prio {
            return Err(MusterError::Validation {
                message: "release_open_at must not precede release_priority_at".into(),
            });
        }
    }

    let game_id = snowflake::generate_id();
    let game = games::create_game(
        &state.db.pool,
        game_id,
        auth.user_id,
        &body.name,
        body.module.as_deref(),
        body.description.as_deref(),
        body.max_players,
        body.start_at,
        body.release_priority_at,
        body.release_open_at,
    )
    .await?;

    tracing::info!(
        game_id = %game_id,
        dm_id = %auth.user_id,
        name = %game.name,
        "Game created"
    );

    Ok(Json(to_response(game)))
}

/// GET /api/v1/games/:game_id
async fn get_game(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<Uuid>,
) -> MusterResult<Json<GameResponse>> {
    let game = games::find_game(&state.db.pool, game_id)
        .await?
        .ok_or(MusterError::NotFound {
            resource: "Game".into(),
        })?;
    Ok(Json(to_response(game)))
}

/// DELETE /api/v1/games/:game_id — soft delete.
///
/// Marks the game unready, which drops it from listings and every
/// reconciliation pass; the channel tick destroys its channel.
async fn withdraw_game(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<Uuid>,
) -> MusterResult<StatusCode> {
    let game = games::find_game(&state.db.pool, game_id)
        .await?
        .ok_or(MusterError::NotFound {
            resource: "Game".into(),
        })?;
    require_dm_or_admin(&auth, game.dm_id)?;

    games::set_ready(&state.db.pool, game_id, false).await?;
    tracing::info!(game_id = %game_id, by = %auth.user_id, "Game withdrawn");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
struct RosterResponse {
    game: GameResponse,
    confirmed: Vec<PlayerResponse>,
    waitlist: Vec<PlayerResponse>,
    free_seats: usize,
}

async fn resolve_players(
    state: &AppState,
    entries: &[PlayerEntry],
) -> MusterResult<Vec<PlayerResponse>> {
    let mut resolved = Vec::with_capacity(entries.len());
    for entry in entries {
        let display_name = users::find_user(&state.db.pool, entry.user_id)
            .await?
            .map(|u| u.display_name)
            .unwrap_or_else(|| "unknown".into());
        resolved.push(PlayerResponse {
            user_id: entry.user_id,
            display_name,
            membership: entry.membership,
            character: entry.character.clone(),
        });
    }
    Ok(resolved)
}

/// GET /api/v1/games/:game_id/roster
async fn get_roster(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<Uuid>,
) -> MusterResult<Json<RosterResponse>> {
    let snapshot = roster::load(&state.db, game_id).await?;
    let free_seats = snapshot.free_seats();
    let confirmed = resolve_players(&state, &snapshot.confirmed).await?;
    let waitlist = resolve_players(&state, &snapshot.waitlist).await?;

    Ok(Json(RosterResponse {
        game: to_response(snapshot.game),
        confirmed,
        waitlist,
        free_seats,
    }))
}

/// POST /api/v1/games/:game_id/signup
async fn signup(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<Uuid>,
) -> MusterResult<Json<roster::SignupOutcome>> {
    let outcome = roster::signup(&state.db, auth.user_id, game_id).await?;
    Ok(Json(outcome))
}

/// POST /api/v1/games/:game_id/dropout
async fn drop_out(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<Uuid>,
) -> MusterResult<StatusCode> {
    let removed = roster::drop_out(&state.db, auth.user_id, game_id).await?;
    if !removed {
        return Err(MusterError::NotFound {
            resource: "Signup".into(),
        });
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/games/:game_id/players/:user_id — DM/admin force add.
///
/// Bypasses every eligibility gate, including capacity.
async fn force_add_player(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((game_id, user_id)): Path<(Uuid, Uuid)>,
) -> MusterResult<Json<PlayerEntry>> {
    let game = games::find_game(&state.db.pool, game_id)
        .await?
        .ok_or(MusterError::NotFound {
            resource: "Game".into(),
        })?;
    require_dm_or_admin(&auth, game.dm_id)?;

    let entry = roster::force_add(&state.db, user_id, game_id).await?;

    tracing::info!(
        game_id = %game_id,
        user_id = %user_id,
        by = %auth.user_id,
        "Player force-added"
    );

    Ok(Json(entry))
}

/// DELETE /api/v1/games/:game_id/players/:user_id — DM/admin removal.
async fn force_remove_player(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path((game_id, user_id)): Path<(Uuid, Uuid)>,
) -> MusterResult<StatusCode> {
    let game = games::find_game(&state.db.pool, game_id)
        .await?
        .ok_or(MusterError::NotFound {
            resource: "Game".into(),
        })?;
    require_dm_or_admin(&auth, game.dm_id)?;

    let removed = players::delete_entry(&state.db.pool, game_id, user_id).await?;
    if !removed {
        return Err(MusterError::NotFound {
            resource: "Signup".into(),
        });
    }

    tracing::info!(
        game_id = %game_id,
        user_id = %user_id,
        by = %auth.user_id,
        "Player removed"
    );

    // Best-effort courtesy DM; the membership tick fixes up channel access.
    if let Some(user) = users::find_user(&state.db.pool, user_id).await? {
        let message = format!(
            "You have been removed from **{}** by {}.",
            game.name, auth.display_name
        );
        if let Err(e) = state.platform.send_dm(&user.platform_id, &message).await {
            tracing::warn!(user_id = %user_id, error = %e, "Removal DM failed");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}
