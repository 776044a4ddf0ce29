use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{CreateGameRequest, GameResponse, GamesResponse, MessageResponse, UpdateGameRequest},
    repo::Game,
};
use crate::auth::extractor::AuthUser;
use crate::error::ApiError;
use crate::response::ApiOk;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/game", post(create_game))
        .route("/games", get(list_games))
        .route(
            "/game/:id",
            get(get_game).put(update_game).delete(delete_game),
        )
}

/// Path ids arrive as strings so a malformed id maps to the enveloped 400.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        warn!(id = %raw, "malformed game id");
        ApiError::InvalidInput("ID format not valid.".into())
    })
}

#[instrument(skip(state, payload))]
pub async fn create_game(
    State(state): State<AppState>,
    AuthUser(owner_id): AuthUser,
    Json(payload): Json<CreateGameRequest>,
) -> Result<ApiOk<GameResponse>, ApiError> {
    let fields = payload.validate()?;
    let game = Game::create(&state.db, owner_id, fields).await?;
    info!(game_id = %game.id, %owner_id, "game created");
    Ok(ApiOk(StatusCode::CREATED, GameResponse { game }))
}

#[instrument(skip(state))]
pub async fn list_games(
    State(state): State<AppState>,
    AuthUser(owner_id): AuthUser,
) -> Result<ApiOk<GamesResponse>, ApiError> {
    let games = Game::list_by_owner(&state.db, owner_id).await?;
    Ok(ApiOk(StatusCode::OK, GamesResponse { games }))
}

#[instrument(skip(state))]
pub async fn get_game(
    State(state): State<AppState>,
    AuthUser(owner_id): AuthUser,
    Path(id): Path<String>,
) -> Result<ApiOk<GameResponse>, ApiError> {
    let id = parse_id(&id)?;
    let game = Game::find_owned(&state.db, id, owner_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Game not found or not owned by this user.".into()))?;
    Ok(ApiOk(StatusCode::OK, GameResponse { game }))
}

#[instrument(skip(state, payload))]
pub async fn update_game(
    State(state): State<AppState>,
    AuthUser(owner_id): AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateGameRequest>,
) -> Result<ApiOk<GameResponse>, ApiError> {
    let id = parse_id(&id)?;
    let game = Game::update_owned(&state.db, id, owner_id, payload.into())
        .await?
        .ok_or_else(|| ApiError::NotFound("Game not found or not owned by this user.".into()))?;
    info!(game_id = %game.id, %owner_id, "game updated");
    Ok(ApiOk(StatusCode::OK, GameResponse { game }))
}

#[instrument(skip(state))]
pub async fn delete_game(
    State(state): State<AppState>,
    AuthUser(owner_id): AuthUser,
    Path(id): Path<String>,
) -> Result<ApiOk<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    let deleted = Game::delete_owned(&state.db, id, owner_id).await?;
    if !deleted {
        return Err(ApiError::NotFound(
            "Game not found or not owned by this user.".into(),
        ));
    }
    info!(game_id = %id, %owner_id, "game deleted");
    Ok(ApiOk(
        StatusCode::OK,
        MessageResponse {
            message: "Game deleted successfully.".into(),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_uuid_and_rejects_garbage() {
        assert!(parse_id("11111111-1111-1111-1111-111111111111").is_ok());
        let err = parse_id("not-a-uuid").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
