use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const DEFAULT_CALENDAR: &str = "Lab Protocols";

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub calendar: CalendarConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct CalendarConfig {
    /// Calendar events are created in when `--calendar` is not given.
    pub default_calendar: Option<String>,
    /// Directory the iCalendar file sink writes to.
    pub export_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            calendar: CalendarConfig {
                default_calendar: Some(DEFAULT_CALENDAR.to_string()),
                export_dir: None,
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;

        // If config doesn't exist, create default
        if !config_path.exists() {
            let default_config = Config::default();
            default_config.save()?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&config_path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    pub fn save(&self) -> Result<()> {
        let config_path = get_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    pub fn calendar_name(&self) -> String {
        self.calendar
            .default_calendar
            .clone()
            .unwrap_or_else(|| DEFAULT_CALENDAR.to_string())
    }

    /// Where the iCalendar file sink keeps its master files.
    pub fn export_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.calendar.export_dir {
            return Ok(dir.clone());
        }
        let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
        Ok(home.join(".labcal").join("calendars"))
    }
}

fn get_config_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "labcal", "labcal")
        .context("Failed to determine config directory")?;

    Ok(proj_dirs.config_dir().join("config.toml"))
}
