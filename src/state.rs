use crate::config::AppConfig;
use crate::users::repo::{InMemoryUserRepo, UserRepo};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        // Volatile store; the admin is re-seeded on every start
        let users = Arc::new(InMemoryUserRepo::seeded(&config.admin_password)?) as Arc<dyn UserRepo>;
        tracing::info!("user store seeded with bootstrap admin");

        Ok(Self::from_parts(config, users))
    }

    pub fn from_parts(config: Arc<AppConfig>, users: Arc<dyn UserRepo>) -> Self {
        Self { config, users }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::{JwtConfig, DEFAULT_ADMIN_PASSWORD};

        let config = Arc::new(AppConfig {
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
            },
            admin_password: DEFAULT_ADMIN_PASSWORD.into(),
        });
        let users = Arc::new(
            InMemoryUserRepo::seeded(&config.admin_password).expect("seeding should succeed"),
        ) as Arc<dyn UserRepo>;
        Self::from_parts(config, users)
    }
}
