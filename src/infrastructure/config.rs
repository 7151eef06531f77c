use crate::domain::{config::TcpLinkConfig, error::{TcpLinkError, TcpLinkResult}};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = ".tcplink";
const CONFIG_FILE: &str = "config.toml";

/// Configuration manager
pub struct ConfigManager {
    global_config_path: Option<PathBuf>,
    project_config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create new configuration manager
    pub fn new() -> Self {
        Self {
            global_config_path: Self::get_global_config_path(),
            project_config_path: Self::find_project_config_path(),
        }
    }

    /// Load defaults, then the global file, then the project file.
    ///
    /// Sections present in a later file replace the earlier ones.
    pub fn load_config(&self) -> TcpLinkResult<TcpLinkConfig> {
        let mut config = TcpLinkConfig::default();

        for path in [&self.global_config_path, &self.project_config_path]
            .into_iter()
            .flatten()
        {
            if path.exists() {
                let raw = Self::read_table(path)?;
                let layer = Self::parse(path, &raw)?;
                if raw.contains_key("global") {
                    config.global = layer.global;
                }
                if raw.contains_key("client") {
                    config.client = layer.client;
                }
                if raw.contains_key("server") {
                    config.server = layer.server;
                }
            }
        }

        Ok(config)
    }

    /// Load configuration from specific path
    pub fn load_config_from_path(&self, path: &Path) -> TcpLinkResult<TcpLinkConfig> {
        let raw = Self::read_table(path)?;
        Self::parse(path, &raw)
    }

    /// Save configuration to specific path
    pub fn save_config_to_path(&self, path: &Path, config: &TcpLinkConfig) -> TcpLinkResult<()> {
        let content = toml::to_string_pretty(config).map_err(|e| TcpLinkError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, content).map_err(|e| TcpLinkError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })
    }

    /// Create default project configuration under `path/.tcplink/`
    pub fn init_project_config(&self, path: &Path) -> TcpLinkResult<PathBuf> {
        let config_dir = path.join(CONFIG_DIR);
        let config_file = config_dir.join(CONFIG_FILE);

        if config_file.exists() {
            return Err(TcpLinkError::Config {
                message: "Project configuration already exists".to_string(),
            });
        }

        fs::create_dir_all(&config_dir).map_err(|e| TcpLinkError::Config {
            message: format!("Failed to create {} directory: {}", CONFIG_DIR, e),
        })?;

        self.save_config_to_path(&config_file, &TcpLinkConfig::default())?;
        Ok(config_file)
    }

    pub fn get_project_config_path(&self) -> Option<&PathBuf> {
        self.project_config_path.as_ref()
    }

    pub fn get_global_config_path_ref(&self) -> Option<&PathBuf> {
        self.global_config_path.as_ref()
    }

    fn get_global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("tcplink").join(CONFIG_FILE))
    }

    /// Find project configuration path by walking up directory tree
    fn find_project_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut path = current_dir.as_path();

        loop {
            let config_path = path.join(CONFIG_DIR).join(CONFIG_FILE);
            if config_path.exists() {
                return Some(config_path);
            }

            path = path.parent()?;
        }
    }

    fn read_table(path: &Path) -> TcpLinkResult<toml::Table> {
        let content = fs::read_to_string(path).map_err(|e| TcpLinkError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        content.parse::<toml::Table>().map_err(|e| TcpLinkError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })
    }

    fn parse(path: &Path, raw: &toml::Table) -> TcpLinkResult<TcpLinkConfig> {
        toml::Value::Table(raw.clone()).try_into::<TcpLinkConfig>().map_err(|e| {
            TcpLinkError::Config {
                message: format!("Failed to parse config file {}: {}", path.display(), e),
            }
        })
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager_with(global: Option<PathBuf>, project: Option<PathBuf>) -> ConfigManager {
        ConfigManager {
            global_config_path: global,
            project_config_path: project,
        }
    }

    #[test]
    fn test_load_default_config() {
        let manager = manager_with(None, None);
        let config = manager.load_config().unwrap();

        assert_eq!(config.global.log_level, "info");
        assert_eq!(config.client.port, 12345);
        assert_eq!(config.server.echo_prefix, "Server Echo: ");
    }

    #[test]
    fn test_project_sections_override_global() {
        let temp_dir = TempDir::new().unwrap();
        let global = temp_dir.path().join("global.toml");
        let project = temp_dir.path().join("project.toml");

        fs::write(&global, "[global]\nlog_level = \"debug\"\n[client]\nport = 1000\n").unwrap();
        fs::write(&project, "[client]\nport = 2000\n").unwrap();

        let config = manager_with(Some(global), Some(project)).load_config().unwrap();
        assert_eq!(config.global.log_level, "debug");
        assert_eq!(config.client.port, 2000);
        assert_eq!(config.server.port, 12345);
    }

    #[test]
    fn test_init_project_config() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_with(None, None);

        let config_file = manager.init_project_config(temp_dir.path()).unwrap();
        assert_eq!(config_file, temp_dir.path().join(".tcplink").join("config.toml"));

        let config = manager.load_config_from_path(&config_file).unwrap();
        assert_eq!(config.client.messages.len(), 4);

        // A second init must not clobber the file.
        assert!(matches!(
            manager.init_project_config(temp_dir.path()),
            Err(TcpLinkError::Config { .. })
        ));
    }

    #[test]
    fn test_invalid_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.toml");
        fs::write(&path, "[client\nport = ").unwrap();

        let err = manager_with(None, None).load_config_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
