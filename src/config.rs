use chrono::Duration;

/// Engine configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    /// The issuer identifier stamped into every token (`iss`).
    pub issuer: String,

    /// The authorization endpoint URI; request objects must carry it in
    /// their audience.
    pub authorization_endpoint: String,

    /// Lifetime of pushed authorization request entries.
    pub par_expires_in_secs: i64,

    /// Lifetime of issued authorization codes.
    pub authorization_code_expires_in_secs: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let issuer = std::env::var("OIDC_ISSUER")
            .unwrap_or_else(|_| "https://localhost:3000".to_string());

        Ok(Self {
            authorization_endpoint: std::env::var("OIDC_AUTHORIZATION_ENDPOINT")
                .unwrap_or_else(|_| format!("{issuer}/connect/authorize")),
            issuer,
            par_expires_in_secs: std::env::var("OIDC_PAR_EXPIRES_IN_SECS")
                .unwrap_or_else(|_| "600".to_string()) // 10 minutes
                .parse()?,
            authorization_code_expires_in_secs: std::env::var(
                "OIDC_AUTHORIZATION_CODE_EXPIRES_IN_SECS",
            )
            .unwrap_or_else(|_| "300".to_string()) // 5 minutes
            .parse()?,
        })
    }

    pub fn par_expires_in(&self) -> Duration {
        Duration::seconds(self.par_expires_in_secs)
    }

    pub fn authorization_code_expires_in(&self) -> Duration {
        Duration::seconds(self.authorization_code_expires_in_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            issuer: "https://localhost:3000".to_string(),
            authorization_endpoint: "https://localhost:3000/connect/authorize".to_string(),
            par_expires_in_secs: 600,
            authorization_code_expires_in_secs: 300,
        }
    }
}
