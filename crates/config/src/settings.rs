use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    /// Must point at a replica set; invitation transitions use multi-document transactions.
    pub url: String,
    pub name: String,
    pub max_pool_size: Option<u32>,
    pub min_pool_size: Option<u32>,
}

/// Verification parameters for identity-provider tokens.
#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_token_ttl_secs: u64,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("FINSHARE"),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 3000)?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default(
                "database.url",
                "mongodb://localhost:27019/?replicaSet=rs0&directConnection=true",
            )?
            .set_default("database.name", "finshare")?
            .set_default("jwt.secret", "change-me-in-production")?
            .set_default("jwt.issuer", "finshare-idp")?
            .set_default("jwt.audience", "finshare")?
            .set_default("jwt.access_token_ttl_secs", 3600)?
            .build()?;

        config.try_deserialize()
    }
}
