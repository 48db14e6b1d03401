use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::instrument;

use crate::{accounts::repo::Account, error::ApiError, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/teste", get(diagnostics))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub uptime: f64,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct DiagnosticsResponse {
    pub mensagem: String,
    pub banco: String,
    pub colecoes: Vec<String>,
    #[serde(rename = "totalUsuarios")]
    pub total_usuarios: i64,
}

/// Liveness probe. Always answers 200; the database field reflects whether a
/// round trip to the store currently succeeds.
#[instrument(skip(state))]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();
    Json(HealthResponse {
        status: "healthy",
        database,
        uptime: state.started_at.elapsed().as_secs_f64(),
        timestamp,
    })
}

/// Store diagnostics: database name, visible tables and the account total.
#[instrument(skip(state))]
pub async fn diagnostics(
    State(state): State<AppState>,
) -> Result<Json<DiagnosticsResponse>, ApiError> {
    let banco = sqlx::query_scalar::<_, String>("SELECT current_database()")
        .fetch_one(&state.db)
        .await?;
    let colecoes = sqlx::query_scalar::<_, String>(
        r#"
        SELECT table_name
        FROM information_schema.tables
        WHERE table_schema = 'public'
        ORDER BY table_name
        "#,
    )
    .fetch_all(&state.db)
    .await?;
    let total_usuarios = Account::count(&state.db).await?;

    Ok(Json(DiagnosticsResponse {
        mensagem: "Backend funcionando!".into(),
        banco,
        colecoes,
        total_usuarios,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_response_wire_names() {
        let resp = DiagnosticsResponse {
            mensagem: "Backend funcionando!".into(),
            banco: "acesso".into(),
            colecoes: vec!["accounts".into()],
            total_usuarios: 2,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"totalUsuarios\":2"));
        assert!(json.contains("\"colecoes\":[\"accounts\"]"));
    }

    #[test]
    fn health_response_shape() {
        let resp = HealthResponse {
            status: "healthy",
            database: "connected",
            uptime: 1.5,
            timestamp: "2026-01-01T00:00:00Z".into(),
        };
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&resp).unwrap()).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["database"], "connected");
    }
}
