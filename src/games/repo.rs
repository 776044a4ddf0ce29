use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Game record. `owner_id` is stamped at creation and never changes; every
/// query below filters on it, so a row is invisible to anyone else.
///
/// The JSON names keep the wire contract of the existing clients.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Game {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub owner_id: Uuid,
    pub title: String,
    #[serde(rename = "genre")]
    pub genres: Vec<String>,
    #[serde(rename = "plateforme")]
    pub platforms: Vec<String>,
    #[serde(rename = "editeur")]
    pub publisher: String,
    #[serde(rename = "developpeur")]
    pub developer: String,
    #[serde(rename = "annee_sortie")]
    pub release_year: i32,
    #[serde(rename = "metacritic_score")]
    pub score: i32,
    #[serde(rename = "temps_jeu_heures")]
    pub hours_played: f64,
    #[serde(rename = "termine")]
    pub completed: bool,
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(rename = "updatedAt", with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated fields for a new game.
#[derive(Debug, Clone)]
pub struct NewGame {
    pub title: String,
    pub genres: Vec<String>,
    pub platforms: Vec<String>,
    pub publisher: String,
    pub developer: String,
    pub release_year: i32,
    pub score: i32,
    pub hours_played: f64,
    pub completed: bool,
}

/// Partial update; `None` leaves the stored value untouched. There is no
/// owner field here, so ownership cannot change through this path.
#[derive(Debug, Clone, Default)]
pub struct GamePatch {
    pub title: Option<String>,
    pub genres: Option<Vec<String>>,
    pub platforms: Option<Vec<String>>,
    pub publisher: Option<String>,
    pub developer: Option<String>,
    pub release_year: Option<i32>,
    pub score: Option<i32>,
    pub hours_played: Option<f64>,
    pub completed: Option<bool>,
}

const GAME_COLUMNS: &str = "id, owner_id, title, genres, platforms, publisher, developer, \
                            release_year, score, hours_played, completed, created_at, updated_at";

impl Game {
    pub async fn create(db: &PgPool, owner_id: Uuid, fields: NewGame) -> sqlx::Result<Game> {
        sqlx::query_as::<_, Game>(&format!(
            r#"
            INSERT INTO games (owner_id, title, genres, platforms, publisher, developer,
                               release_year, score, hours_played, completed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {GAME_COLUMNS}
            "#,
        ))
        .bind(owner_id)
        .bind(fields.title)
        .bind(fields.genres)
        .bind(fields.platforms)
        .bind(fields.publisher)
        .bind(fields.developer)
        .bind(fields.release_year)
        .bind(fields.score)
        .bind(fields.hours_played)
        .bind(fields.completed)
        .fetch_one(db)
        .await
    }

    /// All games of one owner, oldest first. Creation order is the stable,
    /// documented ordering for this listing.
    pub async fn list_by_owner(db: &PgPool, owner_id: Uuid) -> sqlx::Result<Vec<Game>> {
        sqlx::query_as::<_, Game>(&format!(
            r#"
            SELECT {GAME_COLUMNS}
            FROM games
            WHERE owner_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        ))
        .bind(owner_id)
        .fetch_all(db)
        .await
    }

    /// A missing row and a row owned by someone else are indistinguishable
    /// here: both come back `None`.
    pub async fn find_owned(db: &PgPool, id: Uuid, owner_id: Uuid) -> sqlx::Result<Option<Game>> {
        sqlx::query_as::<_, Game>(&format!(
            r#"
            SELECT {GAME_COLUMNS}
            FROM games
            WHERE id = $1 AND owner_id = $2
            "#,
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(db)
        .await
    }

    /// Merge the supplied fields into the row and return the updated record.
    /// Last write wins; there is no concurrency token on games.
    pub async fn update_owned(
        db: &PgPool,
        id: Uuid,
        owner_id: Uuid,
        patch: GamePatch,
    ) -> sqlx::Result<Option<Game>> {
        sqlx::query_as::<_, Game>(&format!(
            r#"
            UPDATE games SET
                title = COALESCE($3, title),
                genres = COALESCE($4, genres),
                platforms = COALESCE($5, platforms),
                publisher = COALESCE($6, publisher),
                developer = COALESCE($7, developer),
                release_year = COALESCE($8, release_year),
                score = COALESCE($9, score),
                hours_played = COALESCE($10, hours_played),
                completed = COALESCE($11, completed),
                updated_at = now()
            WHERE id = $1 AND owner_id = $2
            RETURNING {GAME_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(owner_id)
        .bind(patch.title)
        .bind(patch.genres)
        .bind(patch.platforms)
        .bind(patch.publisher)
        .bind(patch.developer)
        .bind(patch.release_year)
        .bind(patch.score)
        .bind(patch.hours_played)
        .bind(patch.completed)
        .fetch_optional(db)
        .await
    }

    /// Hard delete. Returns `false` when no owned row matched, so a repeat
    /// delete of the same id reports not-found rather than success.
    pub async fn delete_owned(db: &PgPool, id: Uuid, owner_id: Uuid) -> sqlx::Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM games
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
