use std::env;

/// SMTP settings for the system account that sends verification mail.
/// Mass mail never goes through here; it uses the user's own Gmail grant.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Server-side key material for the keyed hash over refresh secrets
    /// and for access-token signatures.
    pub token_pepper: String,
    pub frontend_url: String,
    pub cors_origins: Vec<String>,
    pub gmail_api_base: String,
    pub smtp: Option<SmtpConfig>,
}

impl Config {
    pub fn from_env() -> Self {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://mailora_dispatch.db".into());
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3030);
        let token_pepper =
            env::var("REFRESH_TOKEN_PEPPER").expect("REFRESH_TOKEN_PEPPER must be set");
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".into());
        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173,http://localhost:5174".into())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
        let gmail_api_base = env::var("GMAIL_API_BASE")
            .unwrap_or_else(|_| crate::gmail::GMAIL_API_BASE.to_string());

        // Verification mail is optional: without EMAIL_USER the hub still
        // runs, it just skips the verification sends.
        let smtp = env::var("EMAIL_USER").ok().map(|username| SmtpConfig {
            host: env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".into()),
            port: env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            password: env::var("EMAIL_PASS").unwrap_or_default(),
            from: env::var("EMAIL_FROM").unwrap_or_else(|_| username.clone()),
            username,
        });

        Config {
            database_url,
            port,
            token_pepper,
            frontend_url,
            cors_origins,
            gmail_api_base,
            smtp,
        }
    }
}
