use serde::{Deserialize, Serialize};

use super::repo::{Game, GamePatch, NewGame};
use crate::error::ApiError;

/// Incoming body for POST /game. Everything is optional at the serde level
/// so a missing field yields the enveloped 400 instead of a transport-level
/// rejection; `validate` enforces presence.
#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    pub title: Option<String>,
    #[serde(rename = "genre")]
    pub genres: Option<Vec<String>>,
    #[serde(rename = "plateforme")]
    pub platforms: Option<Vec<String>>,
    #[serde(rename = "editeur")]
    pub publisher: Option<String>,
    #[serde(rename = "developpeur")]
    pub developer: Option<String>,
    #[serde(rename = "annee_sortie")]
    pub release_year: Option<i32>,
    #[serde(rename = "metacritic_score")]
    pub score: Option<i32>,
    #[serde(rename = "temps_jeu_heures")]
    pub hours_played: Option<f64>,
    #[serde(rename = "termine", default)]
    pub completed: bool,
}

impl CreateGameRequest {
    /// Presence only, plus non-empty strings. Numeric ranges are the
    /// caller's problem.
    pub fn validate(self) -> Result<NewGame, ApiError> {
        let mut missing = Vec::new();

        let title = require_string(self.title, "title", &mut missing);
        let publisher = require_string(self.publisher, "editeur", &mut missing);
        let developer = require_string(self.developer, "developpeur", &mut missing);
        if self.genres.is_none() {
            missing.push("genre");
        }
        if self.platforms.is_none() {
            missing.push("plateforme");
        }
        if self.release_year.is_none() {
            missing.push("annee_sortie");
        }
        if self.score.is_none() {
            missing.push("metacritic_score");
        }
        if self.hours_played.is_none() {
            missing.push("temps_jeu_heures");
        }

        if !missing.is_empty() {
            return Err(ApiError::InvalidInput(format!(
                "Missing data. Fields Required: {}.",
                missing.join(", ")
            )));
        }

        Ok(NewGame {
            title: title.unwrap(),
            genres: self.genres.unwrap(),
            platforms: self.platforms.unwrap(),
            publisher: publisher.unwrap(),
            developer: developer.unwrap(),
            release_year: self.release_year.unwrap(),
            score: self.score.unwrap(),
            hours_played: self.hours_played.unwrap(),
            completed: self.completed,
        })
    }
}

fn require_string(
    value: Option<String>,
    name: &'static str,
    missing: &mut Vec<&'static str>,
) -> Option<String> {
    match value {
        Some(s) if !s.trim().is_empty() => Some(s),
        _ => {
            missing.push(name);
            None
        }
    }
}

/// Incoming body for PUT /game/:id. Only supplied fields change. There is
/// deliberately no `user` field; an owner sent by the client is dropped.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateGameRequest {
    pub title: Option<String>,
    #[serde(rename = "genre")]
    pub genres: Option<Vec<String>>,
    #[serde(rename = "plateforme")]
    pub platforms: Option<Vec<String>>,
    #[serde(rename = "editeur")]
    pub publisher: Option<String>,
    #[serde(rename = "developpeur")]
    pub developer: Option<String>,
    #[serde(rename = "annee_sortie")]
    pub release_year: Option<i32>,
    #[serde(rename = "metacritic_score")]
    pub score: Option<i32>,
    #[serde(rename = "temps_jeu_heures")]
    pub hours_played: Option<f64>,
    #[serde(rename = "termine")]
    pub completed: Option<bool>,
}

impl From<UpdateGameRequest> for GamePatch {
    fn from(r: UpdateGameRequest) -> Self {
        GamePatch {
            title: r.title,
            genres: r.genres,
            platforms: r.platforms,
            publisher: r.publisher,
            developer: r.developer,
            release_year: r.release_year,
            score: r.score,
            hours_played: r.hours_played,
            completed: r.completed,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GameResponse {
    pub game: Game,
}

#[derive(Debug, Serialize)]
pub struct GamesResponse {
    pub games: Vec<Game>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_body() -> serde_json::Value {
        json!({
            "title": "Foo",
            "genre": ["RPG"],
            "plateforme": ["PC"],
            "editeur": "E",
            "developpeur": "D",
            "annee_sortie": 2020,
            "metacritic_score": 80,
            "temps_jeu_heures": 10
        })
    }

    #[test]
    fn create_accepts_full_body_and_defaults_completed() {
        let req: CreateGameRequest = serde_json::from_value(full_body()).unwrap();
        let fields = req.validate().expect("valid body");
        assert_eq!(fields.title, "Foo");
        assert_eq!(fields.genres, vec!["RPG"]);
        assert_eq!(fields.platforms, vec!["PC"]);
        assert_eq!(fields.publisher, "E");
        assert_eq!(fields.developer, "D");
        assert_eq!(fields.release_year, 2020);
        assert_eq!(fields.score, 80);
        assert_eq!(fields.hours_played, 10.0);
        assert!(!fields.completed);
    }

    #[test]
    fn create_rejects_missing_and_empty_fields() {
        let mut body = full_body();
        body["title"] = json!("");
        body.as_object_mut().unwrap().remove("annee_sortie");
        let req: CreateGameRequest = serde_json::from_value(body).unwrap();
        let err = req.validate().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("title"));
        assert!(msg.contains("annee_sortie"));
    }

    #[test]
    fn update_drops_client_supplied_owner() {
        let req: UpdateGameRequest = serde_json::from_value(json!({
            "title": "Bar",
            "user": "11111111-1111-1111-1111-111111111111"
        }))
        .unwrap();
        let patch = GamePatch::from(req);
        assert_eq!(patch.title.as_deref(), Some("Bar"));
        // GamePatch has no owner field at all; nothing to assert beyond
        // the deserialization not failing on the stray key.
        assert!(patch.genres.is_none());
    }

    #[test]
    fn update_with_no_fields_is_an_empty_patch() {
        let req: UpdateGameRequest = serde_json::from_value(json!({})).unwrap();
        let patch = GamePatch::from(req);
        assert!(patch.title.is_none());
        assert!(patch.completed.is_none());
    }
}
