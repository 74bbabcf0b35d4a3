use std::net::SocketAddr;
use std::time::Duration;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use url::Url;

pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub cors_origin: HeaderValue,
    pub database_url: String,
    /// Apply `migrations/` on startup.
    pub run_migrations: bool,
    /// Short platform name (e.g., "platform"). Prefixes challenge tokens and
    /// names the `_<platform>-challenge.` record.
    pub platform_name: String,
    /// Parent zone of tenant subdomains (e.g., "platform.app").
    pub platform_domain: String,
    /// Base URL of the edge-hosting provider API.
    pub hosting_provider_url: Url,
    pub hosting_provider_token: SecretString,
    /// Upper bound for a single provider call, applied on top of the HTTP client timeouts.
    pub hosting_provider_timeout: Duration,
    /// Advisory cap for the "N of cap" progress hint. Never enforced.
    pub verification_attempt_hint: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", "127.0.0.1:3001".parse().unwrap());
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .expect("CORS_ORIGIN must be a valid header value");
        let database_url: String = get_env("DATABASE_URL");
        let run_migrations: bool = get_env_default("RUN_MIGRATIONS", true);

        let platform_name: String = get_env_default("PLATFORM_NAME", "platform".to_string());
        let platform_domain: String =
            get_env_default("PLATFORM_DOMAIN", "platform.app".to_string());

        let hosting_provider_url: Url = get_env("HOSTING_PROVIDER_URL");
        let hosting_provider_token: SecretString =
            SecretString::new(get_env::<String>("HOSTING_PROVIDER_TOKEN").into());
        let hosting_provider_timeout_secs: u64 = get_env_default("HOSTING_PROVIDER_TIMEOUT_SECS", 10);
        let verification_attempt_hint: u32 = get_env_default("VERIFICATION_ATTEMPT_HINT", 10);

        Self {
            bind_addr,
            cors_origin,
            database_url,
            run_migrations,
            platform_name: platform_name.trim().to_lowercase(),
            platform_domain: platform_domain.trim().trim_end_matches('.').to_lowercase(),
            hosting_provider_url,
            hosting_provider_token,
            hosting_provider_timeout: Duration::from_secs(hosting_provider_timeout_secs),
            verification_attempt_hint,
        }
    }
}
