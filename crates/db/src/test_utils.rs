//! Helpers for tests that run against a real `PostgreSQL` instance.
//!
//! Every [`TestDatabase`] lives in its own freshly created database with the
//! full schema migrated, so tests can run in parallel.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Set,
    Statement,
};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::entities::{notification_preference, user};
use crate::migrations::Migrator;

/// Connection settings, read from `TEST_DB_*` environment variables.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        let var = |name: &str, default: &str| {
            std::env::var(name).unwrap_or_else(|_| default.to_string())
        };
        Self {
            host: var("TEST_DB_HOST", "localhost"),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: var("TEST_DB_USER", "clubdesk_test"),
            password: var("TEST_DB_PASSWORD", "clubdesk_test"),
        }
    }
}

impl TestDbConfig {
    /// URL of a database on the configured server.
    #[must_use]
    pub fn url_for(&self, database: &str) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, database
        )
    }
}

/// A throwaway, migrated database.
pub struct TestDatabase {
    conn: Arc<DatabaseConnection>,
    config: TestDbConfig,
    name: String,
}

impl TestDatabase {
    /// Create and migrate a uniquely named database.
    pub async fn create() -> Result<Self, DbErr> {
        Self::create_with_config(TestDbConfig::default()).await
    }

    /// Create and migrate a uniquely named database on a custom server.
    pub async fn create_with_config(config: TestDbConfig) -> Result<Self, DbErr> {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let name = format!("clubdesk_test_{}", &suffix[..12]);

        let admin = Database::connect(&config.url_for("postgres")).await?;
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("CREATE DATABASE \"{name}\""),
            ))
            .await?;
        admin.close().await?;

        let conn = Database::connect(&config.url_for(&name)).await?;
        Migrator::up(&conn, None).await?;

        info!(database = %name, "Created test database");
        Ok(Self {
            conn: Arc::new(conn),
            config,
            name,
        })
    }

    /// A shared handle to the database connection, ready for the repositories.
    #[must_use]
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// Insert a user with default notification preferences.
    pub async fn seed_user(
        &self,
        id: &str,
        club: &str,
        role: user::Role,
    ) -> Result<user::Model, DbErr> {
        let user = user::ActiveModel {
            id: Set(id.to_string()),
            name: Set(format!("User {id}")),
            email: Set(format!("{id}@example.com")),
            club: Set(club.to_string()),
            role: Set(role),
            microsite: Set(None),
            photo: Set(None),
            token: Set(format!("token_{id}")),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        }
        .insert(self.conn.as_ref())
        .await?;

        let prefs: notification_preference::ActiveModel =
            notification_preference::Model::defaults_for(id).into();
        prefs.reset_all().insert(self.conn.as_ref()).await?;

        Ok(user)
    }

    /// Drop the database. Consumes self to close the connection first.
    ///
    /// If repositories still hold the connection it is left to them; the
    /// forced drop disconnects them.
    pub async fn drop_database(self) -> Result<(), DbErr> {
        if let Ok(conn) = Arc::try_unwrap(self.conn) {
            conn.close().await?;
        }

        let admin = Database::connect(&self.config.url_for("postgres")).await?;
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)", self.name),
            ))
            .await?;
        admin.close().await?;

        info!(database = %self.name, "Dropped test database");
        Ok(())
    }
}
