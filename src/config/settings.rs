use serde::Deserialize;

/// Top-level configuration settings for the application.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    pub server: ServerSettings,
    pub hub: HubSettings,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
}

/// Where the WebSocket listener binds and how many sessions it admits.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Upgrades beyond this many live sessions are refused with 503.
    pub max_connections: usize,
}

/// Queue sizes for the control loop and for each session.
#[derive(Debug, Deserialize, Clone)]
pub struct HubSettings {
    pub outbound_queue_capacity: usize,
    pub inbound_queue_capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    pub path: String,
    pub history_page_size: usize,
    pub group_backlog_page_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Every key is optional; missing values are filled from the defaults.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub hub: Option<PartialHubSettings>,
    pub storage: Option<PartialStorageSettings>,
    pub logging: Option<PartialLoggingSettings>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub max_connections: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialHubSettings {
    pub outbound_queue_capacity: Option<usize>,
    pub inbound_queue_capacity: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialStorageSettings {
    pub path: Option<String>,
    pub history_page_size: Option<usize>,
    pub group_backlog_page_size: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_connections: 1000,
        }
    }
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            outbound_queue_capacity: 256,
            inbound_queue_capacity: 1024,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: "socialhub_db".to_string(),
            history_page_size: 10,
            group_backlog_page_size: 30,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl PartialSettings {
    /// Fills every missing key from `Settings::default()`.
    pub fn merge_with_defaults(self) -> Settings {
        let default = Settings::default();
        let server = self.server.unwrap_or_default();
        let hub = self.hub.unwrap_or_default();
        let storage = self.storage.unwrap_or_default();
        let logging = self.logging.unwrap_or_default();

        Settings {
            server: ServerSettings {
                host: server.host.unwrap_or(default.server.host),
                port: server.port.unwrap_or(default.server.port),
                max_connections: server
                    .max_connections
                    .unwrap_or(default.server.max_connections),
            },
            hub: HubSettings {
                outbound_queue_capacity: hub
                    .outbound_queue_capacity
                    .unwrap_or(default.hub.outbound_queue_capacity),
                inbound_queue_capacity: hub
                    .inbound_queue_capacity
                    .unwrap_or(default.hub.inbound_queue_capacity),
            },
            storage: StorageSettings {
                path: storage.path.unwrap_or(default.storage.path),
                history_page_size: storage
                    .history_page_size
                    .unwrap_or(default.storage.history_page_size),
                group_backlog_page_size: storage
                    .group_backlog_page_size
                    .unwrap_or(default.storage.group_backlog_page_size),
            },
            logging: LoggingSettings {
                level: logging.level.unwrap_or(default.logging.level),
            },
        }
    }
}
