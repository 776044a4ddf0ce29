use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use super::{
    dto::{LoginRequest, LoginResponse, MeResponse, PublicUser, RegisterRequest, RegisterResponse},
    extractor::AuthUser,
    password::{burn_verification, hash_password, verify_password},
    repo::User,
};
use crate::error::ApiError;
use crate::response::ApiOk;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<ApiOk<RegisterResponse>, ApiError> {
    // The email is stored exactly as supplied; identity is case-sensitive.
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::InvalidInput(
            "Missing data. Fields Required: email, password.".into(),
        ));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::InvalidInput("Invalid email.".into()));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::InvalidInput("Password too short.".into()));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict(format!(
            "User with email {} already exists.",
            payload.email
        )));
    }

    // Hashing is deliberately slow; keep it off the async workers.
    let password = payload.password;
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal(e.into()))??;

    let user = match User::create(&state.db, &payload.email, &hash).await {
        Ok(u) => u,
        // Lost the race with a concurrent register on the same email.
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            return Err(ApiError::Conflict(format!(
                "User with email {} already exists.",
                payload.email
            )));
        }
        Err(e) => {
            error!(error = %e, "create user failed");
            return Err(e.into());
        }
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(ApiOk(
        StatusCode::CREATED,
        RegisterResponse {
            user: PublicUser::from(&user),
        },
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<ApiOk<LoginResponse>, ApiError> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::InvalidInput(
            "Missing data. Fields Required: email, password.".into(),
        ));
    }

    let user = User::find_by_email(&state.db, &payload.email).await?;

    let password = payload.password;
    let ok = match &user {
        Some(u) => {
            let hash = u.password_hash.clone();
            tokio::task::spawn_blocking(move || verify_password(&password, &hash))
                .await
                .map_err(|e| ApiError::Internal(e.into()))??
        }
        // Do the same amount of work for an unknown email so the two
        // rejections are not distinguishable by timing.
        None => tokio::task::spawn_blocking(move || burn_verification(&password))
            .await
            .map_err(|e| ApiError::Internal(e.into()))?,
    };

    let user = match (user, ok) {
        (Some(u), true) => u,
        _ => {
            warn!(email = %payload.email, "login rejected");
            return Err(ApiError::Unauthenticated);
        }
    };

    User::touch_last_login(&state.db, user.id).await?;
    let token = state.jwt.sign(&user.email)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(ApiOk(
        StatusCode::OK,
        LoginResponse {
            message: "OK".into(),
            token,
        },
    ))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<ApiOk<MeResponse>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".into()))?;

    Ok(ApiOk(
        StatusCode::OK,
        MeResponse {
            user: PublicUser::from(&user),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape_check() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email("a@x"));
    }
}

// Tests below run against a real database and skip when DATABASE_URL is
// not set.
#[cfg(test)]
mod db_tests {
    use super::*;
    use uuid::Uuid;

    fn fresh_email(tag: &str) -> String {
        format!("{}-{}@test.local", tag, Uuid::new_v4().simple())
    }

    async fn do_register(
        state: &AppState,
        email: &str,
        password: &str,
    ) -> Result<ApiOk<RegisterResponse>, ApiError> {
        register(
            State(state.clone()),
            Json(RegisterRequest {
                email: email.into(),
                password: password.into(),
            }),
        )
        .await
    }

    async fn do_login(
        state: &AppState,
        email: &str,
        password: &str,
    ) -> Result<ApiOk<LoginResponse>, ApiError> {
        login(
            State(state.clone()),
            Json(LoginRequest {
                email: email.into(),
                password: password.into(),
            }),
        )
        .await
    }

    #[tokio::test]
    async fn register_then_login_roundtrip_issues_valid_token() {
        let Some(state) = AppState::test_state().await else {
            eprintln!("skipping: DATABASE_URL not set");
            return;
        };
        let email = fresh_email("roundtrip");

        let ApiOk(status, body) = do_register(&state, &email, "password-one")
            .await
            .expect("register should succeed");
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body.user.email, email);

        let ApiOk(status, body) = do_login(&state, &email, "password-one")
            .await
            .expect("login should succeed");
        assert_eq!(status, StatusCode::OK);
        let claims = state.jwt.verify(&body.token).expect("token must verify");
        assert_eq!(claims.sub, email);
    }

    #[tokio::test]
    async fn register_duplicate_email_conflicts() {
        let Some(state) = AppState::test_state().await else {
            eprintln!("skipping: DATABASE_URL not set");
            return;
        };
        let email = fresh_email("dup");

        do_register(&state, &email, "password-one")
            .await
            .expect("first register should succeed");
        let err = do_register(&state, &email, "another-password")
            .await
            .err()
            .expect("second register must fail");
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn identity_is_case_sensitive() {
        let Some(state) = AppState::test_state().await else {
            eprintln!("skipping: DATABASE_URL not set");
            return;
        };
        let id = Uuid::new_v4().simple().to_string();
        let lower = format!("case-{id}@x.com");
        let upper = format!("CASE-{id}@x.com");
        let mixed = format!("cAsE-{id}@x.com");

        // Two emails differing only in case are distinct identities.
        let ApiOk(status, _) = do_register(&state, &lower, "password-one")
            .await
            .expect("lower-case register should succeed");
        assert_eq!(status, StatusCode::CREATED);
        let ApiOk(status, _) = do_register(&state, &upper, "password-two")
            .await
            .expect("upper-case variant is a different identity");
        assert_eq!(status, StatusCode::CREATED);

        // Login matches the stored spelling exactly.
        do_login(&state, &lower, "password-one")
            .await
            .expect("exact-case login should succeed");
        let err = do_login(&state, &mixed, "password-one")
            .await
            .err()
            .expect("unregistered casing must not authenticate");
        assert!(matches!(err, ApiError::Unauthenticated));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_reject_identically() {
        let Some(state) = AppState::test_state().await else {
            eprintln!("skipping: DATABASE_URL not set");
            return;
        };
        let email = fresh_email("reject");
        do_register(&state, &email, "password-one")
            .await
            .expect("register should succeed");

        let wrong_password = do_login(&state, &email, "not-the-password")
            .await
            .err()
            .expect("wrong password must fail");
        let unknown_email = do_login(&state, &fresh_email("ghost"), "password-one")
            .await
            .err()
            .expect("unknown email must fail");
        assert!(matches!(wrong_password, ApiError::Unauthenticated));
        assert!(matches!(unknown_email, ApiError::Unauthenticated));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }
}
