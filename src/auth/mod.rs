use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::types::{Role, UserScope};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub church: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fellowship: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(sub: String, role: Role, scope: UserScope, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub,
            role: role.as_str().to_string(),
            church: scope.church,
            fellowship: scope.fellowship,
            cell: scope.cell,
            exp,
            iat: now.timestamp(),
        }
    }

    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or(Role::Other)
    }

    pub fn scope(&self) -> UserScope {
        UserScope {
            church: self.church.clone(),
            fellowship: self.fellowship.clone(),
            cell: self.cell.clone(),
        }
    }
}

#[derive(Debug)]
pub enum JwtError {
    TokenGeneration(String),
    InvalidToken(String),
    InvalidSecret,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::TokenGeneration(msg) => write!(f, "JWT generation error: {}", msg),
            JwtError::InvalidToken(msg) => write!(f, "Invalid JWT token: {}", msg),
            JwtError::InvalidSecret => write!(f, "JWT secret not configured"),
        }
    }
}

impl std::error::Error for JwtError {}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_role_and_scope() {
        let scope = UserScope {
            church: Some("1".into()),
            fellowship: Some("12".into()),
            cell: None,
        };
        let claims = Claims::new("ama".into(), Role::FellowshipLeader, scope.clone(), 1);
        let token = generate_jwt(&claims, "s3cret").unwrap();

        let decoded = validate_jwt(&token, "s3cret").unwrap();
        assert_eq!(decoded.role(), Role::FellowshipLeader);
        assert_eq!(decoded.scope(), scope);
        assert!(validate_jwt(&token, "other").is_err());
    }

    #[test]
    fn empty_secret_is_rejected() {
        let claims = Claims::new("x".into(), Role::Admin, UserScope::default(), 1);
        assert!(matches!(generate_jwt(&claims, ""), Err(JwtError::InvalidSecret)));
    }
}
