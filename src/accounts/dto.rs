use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accounts::repo::{Account, MaritalStatus};

/// Request body for signup (`/api/cadastrar`). Required fields are modeled
/// as Option so that an absent field reaches the handler and comes back as a
/// 400 validation error, not a body-deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub senha: Option<String>,
    #[serde(rename = "estadoCivil", default)]
    pub estado_civil: Option<MaritalStatus>,
    #[serde(rename = "moraLua", default)]
    pub mora_lua: Option<bool>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub senha: Option<String>,
}

/// Request body for password reset.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "novaSenha", default)]
    pub nova_senha: Option<String>,
}

/// Minimal account view returned by signup.
#[derive(Debug, Serialize)]
pub struct CreatedAccount {
    pub id: Uuid,
    pub nome: String,
    pub email: String,
}

/// Full public view of an account. Never carries the password hash.
#[derive(Debug, Serialize)]
pub struct AccountView {
    pub id: Uuid,
    pub nome: String,
    pub email: String,
    #[serde(rename = "estadoCivil")]
    pub estado_civil: MaritalStatus,
    #[serde(rename = "moraLua")]
    pub mora_lua: bool,
}

impl From<&Account> for CreatedAccount {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            nome: account.name.clone(),
            email: account.email.clone(),
        }
    }
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            nome: account.name.clone(),
            email: account.email.clone(),
            estado_civil: account.marital_status,
            mora_lua: account.lives_on_moon,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub sucesso: bool,
    pub mensagem: String,
    pub usuario: CreatedAccount,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub sucesso: bool,
    pub mensagem: String,
    pub usuario: AccountView,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ResetPasswordResponse {
    pub sucesso: bool,
    pub mensagem: String,
}

#[derive(Debug, Serialize)]
pub struct SeedCredentials {
    pub email: String,
    pub senha: String,
}

#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub sucesso: bool,
    pub mensagem: String,
    pub credenciais: SeedCredentials,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn sample_account() -> Account {
        Account {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".into(),
            marital_status: MaritalStatus::Casado,
            lives_on_moon: true,
            registered_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn signup_request_optional_fields_default_to_none() {
        let req: SignupRequest = serde_json::from_str(
            r#"{"nome":"Ana","email":"ana@example.com","senha":"abcdef"}"#,
        )
        .unwrap();
        assert!(req.estado_civil.is_none());
        assert!(req.mora_lua.is_none());
    }

    #[test]
    fn signup_request_tolerates_missing_required_fields() {
        // Presence is enforced by the handler (400), not by deserialization.
        let req: SignupRequest =
            serde_json::from_str(r#"{"nome":"Ana","email":"ana@example.com"}"#).unwrap();
        assert!(req.senha.is_none());
        let req: LoginRequest = serde_json::from_str("{}").unwrap();
        assert!(req.email.is_none() && req.senha.is_none());
    }

    #[test]
    fn signup_request_accepts_profile_fields() {
        let req: SignupRequest = serde_json::from_str(
            r#"{"nome":"Ana","email":"a@b.com","senha":"x","estadoCivil":"Casado","moraLua":true}"#,
        )
        .unwrap();
        assert_eq!(req.estado_civil, Some(MaritalStatus::Casado));
        assert_eq!(req.mora_lua, Some(true));
    }

    #[test]
    fn account_view_uses_wire_names_and_no_hash() {
        let view = AccountView::from(&sample_account());
        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains("\"estadoCivil\":\"Casado\""));
        assert!(json.contains("\"moraLua\":true"));
        assert!(json.contains("\"nome\":\"Ana\""));
        assert!(!json.contains("senha"));
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn created_account_exposes_only_id_nome_email() {
        let view = CreatedAccount::from(&sample_account());
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&view).unwrap()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert!(obj.contains_key("id"));
        assert!(obj.contains_key("nome"));
        assert!(obj.contains_key("email"));
    }
}
