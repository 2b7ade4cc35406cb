use crate::Result;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use typed_builder::TypedBuilder;

const MYSQL_PORT: u16 = 3306;

/// Credentials and schema name for a [`MySqlServer`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct MysqlConfig {
    #[builder(default = "tether".to_string(), setter(into))]
    database: String,
    #[builder(default = "tether".to_string(), setter(into))]
    username: String,
    #[builder(default = "tether".to_string(), setter(into))]
    password: String,
}

/// A throwaway MySQL 8.4 server. The container stops when this is dropped.
///
/// The server logs "ready for connections" once during initialisation as
/// well, so callers should retry their first connection.
pub struct MySqlServer {
    container: ContainerAsync<GenericImage>,
    config: MysqlConfig,
}

impl MySqlServer {
    pub async fn new(config: MysqlConfig) -> Result<Self> {
        let container = GenericImage::new("mysql", "8.4")
            .with_exposed_port(MYSQL_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stderr("ready for connections"))
            .with_env_var("MYSQL_ROOT_PASSWORD", "root")
            .with_env_var("MYSQL_DATABASE", config.database.clone())
            .with_env_var("MYSQL_USER", config.username.clone())
            .with_env_var("MYSQL_PASSWORD", config.password.clone())
            .start()
            .await?;

        Ok(Self { container, config })
    }

    /// A `mysql://` DSN for the configured user and database.
    pub async fn database_url(&self) -> Result<String> {
        let host = self.container.get_host().await?;
        let port = self.container.get_host_port_ipv4(MYSQL_PORT).await?;
        let MysqlConfig {
            database,
            username,
            password,
        } = &self.config;
        Ok(format!("mysql://{username}:{password}@{host}:{port}/{database}"))
    }
}
