//! INI file configuration adapter.
//!
//! Values come from an INI file, optionally overlaid by environment
//! variables named `<PREFIX>_<SECTION>_<KEY>` (upper case), so
//! `TRENDSCAN_SQLITE_PATH` overrides `[sqlite] path`.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::collections::HashMap;
use std::path::Path;

pub const ENV_PREFIX: &str = "TRENDSCAN";

pub struct FileConfigAdapter {
    config: Ini,
    overrides: HashMap<(String, String), String>,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self::with_ini(config))
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self::with_ini(config))
    }

    /// No file: every lookup falls through to overrides or defaults.
    pub fn empty() -> Self {
        Self::with_ini(Ini::new())
    }

    fn with_ini(config: Ini) -> Self {
        Self {
            config,
            overrides: HashMap::new(),
        }
    }

    /// Overlays `<prefix>_<SECTION>_<KEY>` variables from `vars`.
    ///
    /// Only keys already known to `sections` are matched, since both section
    /// and key names may contain underscores.
    pub fn with_env_overrides<I>(mut self, prefix: &str, sections: &[(&str, &str)], vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();
        for (section, key) in sections {
            let name = format!("{}_{}_{}", prefix, section, key).to_uppercase();
            if let Some(value) = vars.get(&name) {
                self.overrides
                    .insert((section.to_string(), key.to_string()), value.clone());
            }
        }
        self
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.overrides
            .get(&(section.to_string(), key.to_string()))
            .cloned()
            .or_else(|| self.config.get(section, key))
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.get_string(section, key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.get_string(section, key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.get_string(section, key)
            .as_deref()
            .and_then(Self::parse_bool)
            .unwrap_or(default)
    }
}
