use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    accounts::{
        dto::{
            AccountView, CreatedAccount, LoginRequest, LoginResponse, ResetPasswordRequest,
            ResetPasswordResponse, SeedCredentials, SeedResponse, SignupRequest, SignupResponse,
        },
        jwt::{AuthAccount, JwtKeys},
        password,
        repo::{normalize_email, Account, MaritalStatus},
    },
    error::ApiError,
    state::AppState,
};

pub const SEED_EMAIL: &str = "teste@teste.com";
pub const SEED_PASSWORD: &str = "123456";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/cadastrar", post(signup))
        .route("/api/login", post(login))
        .route("/api/resetar-senha", post(reset_password))
        .route("/api/criar-teste", post(seed_test_account))
        .route("/api/me", get(me))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Argon2 is CPU-bound; run it off the async worker threads so a signup burst
/// does not stall unrelated requests.
async fn hash_blocking(plain: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .map_err(ApiError::internal)?
}

async fn verify_blocking(plain: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || password::verify_password(&plain, &hash))
        .await
        .map_err(ApiError::internal)?
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let nome = payload.nome.as_deref().unwrap_or("").trim().to_string();
    let email = normalize_email(payload.email.as_deref().unwrap_or(""));
    let senha = payload.senha.unwrap_or_default();
    if nome.is_empty() || email.is_empty() || senha.trim().is_empty() {
        return Err(ApiError::Validation(
            "Nome, email e senha são obrigatórios".into(),
        ));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::Validation("Email inválido".into()));
    }

    // Fast path for a friendly message; the unique index on lower(email) is
    // what actually guarantees uniqueness under concurrent signups.
    if Account::find_by_email(&state.db, &email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::DuplicateEmail);
    }

    let hash = hash_blocking(senha).await?;
    let account = Account::create(
        &state.db,
        &nome,
        &email,
        &hash,
        payload.estado_civil.unwrap_or_default(),
        payload.mora_lua.unwrap_or(false),
    )
    .await?;

    info!(account_id = %account.id, email = %account.email, "account registered");
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            sucesso: true,
            mensagem: "Cadastro realizado com sucesso!".into(),
            usuario: CreatedAccount::from(&account),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = normalize_email(payload.email.as_deref().unwrap_or(""));
    let senha = payload.senha.unwrap_or_default();
    if email.is_empty() || senha.trim().is_empty() {
        return Err(ApiError::Validation("Email e senha são obrigatórios".into()));
    }

    // Unknown email and wrong password take the same exit so the response
    // never reveals whether the account exists.
    let account = match Account::find_by_email(&state.db, &email).await? {
        Some(a) => a,
        None => {
            warn!(email = %email, "login with unknown email");
            return Err(ApiError::InvalidCredentials);
        }
    };

    let ok = verify_blocking(senha, account.password_hash.clone()).await?;
    if !ok {
        warn!(account_id = %account.id, "login with wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(account.id, &account.email)?;

    info!(account_id = %account.id, email = %account.email, "login ok");
    Ok(Json(LoginResponse {
        sucesso: true,
        mensagem: "Login realizado com sucesso!".into(),
        usuario: AccountView::from(&account),
        token,
    }))
}

/// Replaces the stored hash for the caller's own account. Requires a valid
/// bearer token whose email matches the target; an unauthenticated reset
/// would let anyone take over any account.
#[instrument(skip(state, payload, auth))]
pub async fn reset_password(
    State(state): State<AppState>,
    auth: AuthAccount,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<ResetPasswordResponse>, ApiError> {
    let email = normalize_email(payload.email.as_deref().unwrap_or(""));
    let nova_senha = payload.nova_senha.unwrap_or_default();
    if email.is_empty() || nova_senha.trim().is_empty() {
        return Err(ApiError::Validation(
            "Email e nova senha são obrigatórios".into(),
        ));
    }
    if email != auth.0.email {
        warn!(account_id = %auth.0.sub, target = %email, "reset for another account denied");
        return Err(ApiError::Forbidden);
    }

    let account = Account::find_by_email(&state.db, &email)
        .await?
        .ok_or(ApiError::NotFound)?;

    let hash = hash_blocking(nova_senha).await?;
    Account::update_password_hash(&state.db, account.id, &hash).await?;

    info!(account_id = %account.id, "password reset");
    Ok(Json(ResetPasswordResponse {
        sucesso: true,
        mensagem: "Senha atualizada com sucesso!".into(),
    }))
}

/// Development fixture: find-or-create a well-known account. Idempotent,
/// including under concurrent calls (a racing duplicate insert is reported
/// as already-exists).
#[instrument(skip(state))]
pub async fn seed_test_account(
    State(state): State<AppState>,
) -> Result<Json<SeedResponse>, ApiError> {
    let credenciais = SeedCredentials {
        email: SEED_EMAIL.into(),
        senha: SEED_PASSWORD.into(),
    };

    if Account::find_by_email(&state.db, SEED_EMAIL).await?.is_some() {
        return Ok(Json(SeedResponse {
            sucesso: true,
            mensagem: "Usuário teste já existe!".into(),
            credenciais,
        }));
    }

    let hash = hash_blocking(SEED_PASSWORD.to_string()).await?;
    let created = Account::create(
        &state.db,
        "Usuário Teste",
        SEED_EMAIL,
        &hash,
        MaritalStatus::Solteiro,
        false,
    )
    .await;

    let mensagem = match created {
        Ok(account) => {
            info!(account_id = %account.id, "seed account created");
            "Usuário teste criado com sucesso!".to_string()
        }
        // Lost the race against another seed call; the account exists now.
        Err(ApiError::DuplicateEmail) => "Usuário teste já existe!".to_string(),
        Err(e) => return Err(e),
    };

    Ok(Json(SeedResponse {
        sucesso: true,
        mensagem,
        credenciais,
    }))
}

#[instrument(skip(state, auth))]
pub async fn me(
    State(state): State<AppState>,
    auth: AuthAccount,
) -> Result<Json<AccountView>, ApiError> {
    let account = Account::find_by_id(&state.db, auth.0.sub)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;
    Ok(Json(AccountView::from(&account)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape_validation() {
        assert!(is_valid_email("ana@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
        assert!(!is_valid_email("sem-arroba"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("espaco em@e.com"));
        assert!(!is_valid_email(""));
    }

    #[tokio::test]
    async fn hash_blocking_roundtrips() {
        let hash = hash_blocking("abcdef".into()).await.expect("hash");
        assert!(verify_blocking("abcdef".into(), hash.clone())
            .await
            .expect("verify"));
        assert!(!verify_blocking("wrong".into(), hash).await.expect("verify"));
    }

    // Validation runs before any query, so these exercise the handlers
    // against the lazy test pool without a live database.

    #[tokio::test]
    async fn signup_without_password_is_a_validation_error() {
        let payload = SignupRequest {
            nome: Some("Ana".into()),
            email: Some("ana@example.com".into()),
            senha: None,
            estado_civil: None,
            mora_lua: None,
        };
        let err = signup(State(AppState::fake()), Json(payload))
            .await
            .expect_err("missing senha must be rejected");
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn signup_with_whitespace_password_is_a_validation_error() {
        let payload = SignupRequest {
            nome: Some("Ana".into()),
            email: Some("ana@example.com".into()),
            senha: Some("   ".into()),
            estado_civil: None,
            mora_lua: None,
        };
        let err = signup(State(AppState::fake()), Json(payload))
            .await
            .expect_err("blank senha must be rejected");
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn login_with_missing_fields_is_a_validation_error() {
        let payload = LoginRequest {
            email: None,
            senha: None,
        };
        let err = login(State(AppState::fake()), Json(payload))
            .await
            .expect_err("empty body must be rejected");
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn login_with_whitespace_password_is_a_validation_error() {
        // Same trimmed-presence rule as signup: a blank senha is a 400, not
        // a credential mismatch.
        let payload = LoginRequest {
            email: Some("ana@example.com".into()),
            senha: Some("   ".into()),
        };
        let err = login(State(AppState::fake()), Json(payload))
            .await
            .expect_err("blank senha must be rejected");
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
