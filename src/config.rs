use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::events::BROWSER_WINDOW_TYPE;
use crate::services::prefs::default_preferences;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub window: WindowConfig,
    pub preferences: PreferencesConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowConfig {
    /// Классификатор главного окна браузера
    pub browser_window_type: String,
    /// Просить у хоста только окна нужного типа при переборе
    pub filter_enumeration_by_type: bool,
    pub shutdown_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PreferencesConfig {
    #[serde(default)]
    pub defaults: BTreeMap<String, bool>,
    #[serde(default)]
    pub locked: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub startup_windows: Vec<SimulatedWindow>,
    #[serde(default)]
    pub late_windows: Vec<SimulatedWindow>,
    pub open_interval_ms: u64,
    pub load_delay_ms: u64,
    /// 0 означает, что окна не закрываются
    pub window_lifetime_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SimulatedWindow {
    pub window_type: String,
    pub title: String,
}

impl SimulatedWindow {
    fn new(window_type: &str, title: &str) -> Self {
        Self {
            window_type: window_type.to_string(),
            title: title.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "compact".to_string(),
            },
            window: WindowConfig {
                browser_window_type: BROWSER_WINDOW_TYPE.to_string(),
                filter_enumeration_by_type: true,
                shutdown_timeout_ms: 5000,
            },
            preferences: PreferencesConfig {
                defaults: default_preferences().into_iter().collect(),
                locked: Vec::new(),
            },
            simulation: SimulationConfig {
                startup_windows: vec![
                    SimulatedWindow::new(BROWSER_WINDOW_TYPE, "Mozilla Firefox"),
                    SimulatedWindow::new("Browser:Preferences", "Настройки"),
                ],
                late_windows: vec![SimulatedWindow::new(BROWSER_WINDOW_TYPE, "Новое окно")],
                open_interval_ms: 10_000,
                load_delay_ms: 500,
                window_lifetime_ms: 30_000,
            },
        }
    }
}

impl Config {
    /// Значения по умолчанию, затем TOML-файл (если есть), затем переменные SECURELOGIN_*
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("SECURELOGIN_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "full" | "compact" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация настроек окон
        if self.window.browser_window_type.trim().is_empty() {
            anyhow::bail!("browser_window_type не может быть пустым");
        }

        if self.window.shutdown_timeout_ms < 100 {
            anyhow::bail!("shutdown_timeout_ms должно быть минимум 100");
        }

        // Валидация симуляции
        if !self.simulation.late_windows.is_empty() && self.simulation.open_interval_ms < 100 {
            anyhow::bail!("open_interval_ms должно быть минимум 100");
        }

        let all_windows = self
            .simulation
            .startup_windows
            .iter()
            .chain(self.simulation.late_windows.iter());
        for (i, window) in all_windows.enumerate() {
            if window.window_type.is_empty() {
                anyhow::bail!("Пустой тип окна в симуляции #{}", i + 1);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::prefs::PREF_AUTOFILL_FORMS;
    use std::io::Write;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.preferences.defaults.get(PREF_AUTOFILL_FORMS), Some(&true));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.window.browser_window_type = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.simulation.open_interval_ms = 10;
        assert!(config.validate().is_err());

        config.simulation.late_windows.clear();
        assert!(config.validate().is_ok());

        let mut config = Config::default();
        config.simulation.startup_windows.push(SimulatedWindow::new("", "Безымянное"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::load("/nonexistent/securelogin.toml").unwrap();
        assert_eq!(config.window.browser_window_type, BROWSER_WINDOW_TYPE);
        assert_eq!(config.simulation.startup_windows.len(), 2);
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let path = std::env::temp_dir().join(format!(
            "securelogin-config-{}.toml",
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[window]
filter_enumeration_by_type = false

[preferences]
locked = ["signon.autofillForms"]

[simulation]
late_windows = []
"#
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(!config.window.filter_enumeration_by_type);
        assert_eq!(config.window.shutdown_timeout_ms, 5000);
        assert_eq!(config.preferences.locked, vec![PREF_AUTOFILL_FORMS.to_string()]);
        assert!(config.simulation.late_windows.is_empty());
        assert_eq!(config.simulation.startup_windows.len(), 2);
    }
}
