use serde::{Deserialize, Serialize};
use std::fmt;

/// Причина вызова точки входа расширения.
///
/// Числовые значения совпадают с константами bootstrap-расширений браузера.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum Reason {
    AppStartup = 1,
    AppShutdown = 2,
    AddonEnable = 3,
    AddonDisable = 4,
    AddonInstall = 5,
    AddonUninstall = 6,
    AddonUpgrade = 7,
    AddonDowngrade = 8,
}

impl Reason {
    #[allow(dead_code)]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Приложение завершается целиком: хост сам уничтожает все окна
    pub fn is_app_shutdown(self) -> bool {
        self == Reason::AppShutdown
    }
}

impl TryFrom<u8> for Reason {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Reason::AppStartup),
            2 => Ok(Reason::AppShutdown),
            3 => Ok(Reason::AddonEnable),
            4 => Ok(Reason::AddonDisable),
            5 => Ok(Reason::AddonInstall),
            6 => Ok(Reason::AddonUninstall),
            7 => Ok(Reason::AddonUpgrade),
            8 => Ok(Reason::AddonDowngrade),
            other => Err(other),
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reason::AppStartup => "app-startup",
            Reason::AppShutdown => "app-shutdown",
            Reason::AddonEnable => "addon-enable",
            Reason::AddonDisable => "addon-disable",
            Reason::AddonInstall => "addon-install",
            Reason::AddonUninstall => "addon-uninstall",
            Reason::AddonUpgrade => "addon-upgrade",
            Reason::AddonDowngrade => "addon-downgrade",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_u8() {
        for code in 1..=8u8 {
            let reason = Reason::try_from(code).unwrap();
            assert_eq!(reason.code(), code);
        }
        assert_eq!(Reason::try_from(0), Err(0));
        assert_eq!(Reason::try_from(9), Err(9));
    }

    #[test]
    fn only_app_shutdown_is_shutdown() {
        assert!(Reason::AppShutdown.is_app_shutdown());
        assert!(!Reason::AddonDisable.is_app_shutdown());
        assert!(!Reason::AddonUninstall.is_app_shutdown());
        assert_eq!(Reason::AddonDisable.to_string(), "addon-disable");
    }
}
