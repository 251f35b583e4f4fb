use crate::shared::AppError;
use crate::shared::config::DatabaseConfig;
use sqlx::any::{AnyPoolOptions, install_default_drivers};
use sqlx::AnyPool;
use std::sync::Once;
use std::time::Duration;

static INSTALL_DRIVERS: Once = Once::new();

/// URL のスキームでドライバー（Postgres / SQLite）を選ぶ接続プール
#[derive(Clone)]
pub struct ConnectionPool {
    pool: AnyPool,
}

impl ConnectionPool {
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self, AppError> {
        let url = config.require_url()?;
        let pool = Self::connect(
            url,
            config.max_connections,
            Duration::from_secs(config.connection_timeout),
        )
        .await?;
        Ok(pool)
    }

    async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, sqlx::Error> {
        INSTALL_DRIVERS.call_once(install_default_drivers);

        let pool = AnyPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub fn get_pool(&self) -> &AnyPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
