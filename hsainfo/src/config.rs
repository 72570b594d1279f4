use nanoserde::DeJson;
use std::path::PathBuf;
use tracing::debug;

/// Location of the config file relative to each config directory
pub const CONFIG_FILE: &str = "hsainfo/config.json";

/// Contents of `hsainfo/config.json`
#[derive(Debug, Default, Clone, PartialEq, Eq, DeJson)]
pub struct Config {
    /// Tried before the default locations of libhsa-runtime64.so
    pub library_paths: Option<Vec<String>>,
}

impl Config {
    /// Searches through config directories and finds hsainfo/config.json.
    /// If not found or failed to parse, uses defaults.
    pub fn load() -> Config {
        let dirs = xdg::BaseDirectories::new()
            .map_err(|e| debug!("Failed to find config directories for config.json, {e}"))
            .ok()
            .map(|bd| {
                let mut dirs = bd.get_config_dirs();
                dirs.push(bd.get_config_home());
                dirs
            })
            .unwrap_or_default();
        Config::search(dirs)
    }

    /// First config file in `dirs` that can be read, parsed.
    pub fn search(dirs: impl IntoIterator<Item = PathBuf>) -> Config {
        dirs.into_iter()
            .find_map(|mut path| {
                path.push(CONFIG_FILE);
                std::fs::read_to_string(&path)
                    .map_err(|e| debug!("Failed to read config.json at {path:?}, {e}"))
                    .ok()
            })
            .and_then(|file| {
                Config::deserialize_json(&file).map_err(|e| debug!("Failed to parse config.json, {e}")).ok()
            })
            .map(|config| {
                debug!("Config successfully read and parsed.");
                config
            })
            .unwrap_or_else(|| {
                debug!("Failed to get config, using defaults.");
                Config::default()
            })
    }

    /// Configured runtime locations, empty when none are set
    #[must_use]
    pub fn library_paths(&self) -> Vec<PathBuf> {
        self.library_paths.iter().flatten().map(PathBuf::from).collect()
    }
}
