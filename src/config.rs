use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_days: i64,
    pub refresh_ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub username: String,
    pub password: String,
    pub from_name: String,
    pub from_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub smtp: SmtpConfig,
    pub otp_ttl_minutes: i64,
}

fn env_i64(name: &str, default: i64) -> i64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        // Signing secrets have no fallback: refusing to start beats running
        // with a well-known default secret.
        let jwt = JwtConfig {
            access_secret: std::env::var("JWT_ACCESS_SECRET")
                .context("JWT_ACCESS_SECRET must be set")?,
            refresh_secret: std::env::var("JWT_REFRESH_SECRET")
                .context("JWT_REFRESH_SECRET must be set")?,
            access_ttl_days: env_i64("JWT_ACCESS_TTL_DAYS", 7),
            refresh_ttl_days: env_i64("JWT_REFRESH_TTL_DAYS", 30),
        };

        let smtp_user = std::env::var("EMAIL_USER").unwrap_or_default();
        let smtp = SmtpConfig {
            host: std::env::var("EMAIL_HOST").unwrap_or_else(|_| "smtp.gmail.com".into()),
            port: std::env::var("EMAIL_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(587),
            secure: std::env::var("EMAIL_SECURE")
                .map(|v| v == "true")
                .unwrap_or(false),
            from_name: std::env::var("EMAIL_FROM_NAME").unwrap_or_else(|_| "Walletcore".into()),
            from_address: std::env::var("EMAIL_FROM").unwrap_or_else(|_| smtp_user.clone()),
            username: smtp_user,
            password: std::env::var("EMAIL_PASSWORD").unwrap_or_default(),
        };

        Ok(Self {
            database_url,
            jwt,
            smtp,
            otp_ttl_minutes: env_i64("OTP_TTL_MINUTES", 10),
        })
    }
}
