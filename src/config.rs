use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Secret material for the credential codec. Rotating `secret` or `salt`
/// makes previously stored passwords undecodable.
#[derive(Clone, Deserialize)]
pub struct CredentialConfig {
    pub secret: String,
    pub salt: String,
    pub scrypt_log_n: u8,
}

// Hand-written so the secret never lands in logs.
impl std::fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("secret", &"<redacted>")
            .field("salt", &"<redacted>")
            .field("scrypt_log_n", &self.scrypt_log_n)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub credentials: CredentialConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "xo-backend".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "xo-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
        };
        let credentials = CredentialConfig {
            secret: std::env::var("CREDENTIAL_SECRET")?,
            salt: std::env::var("CREDENTIAL_SALT").unwrap_or_else(|_| "salt".into()),
            scrypt_log_n: std::env::var("CREDENTIAL_SCRYPT_LOG_N")
                .ok()
                .and_then(|v| v.parse::<u8>().ok())
                .unwrap_or(14),
        };
        Ok(Self {
            database_url,
            jwt,
            credentials,
        })
    }
}
