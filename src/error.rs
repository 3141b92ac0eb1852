use crate::events::WindowId;
use std::fmt;
use thiserror::Error;

/// Сбой одной настройки при применении или сбросе переопределений
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefFailure {
    pub key: String,
    pub reason: String,
}

impl fmt::Display for PrefFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.reason)
    }
}

#[derive(Error, Debug)]
pub enum SecureLoginError {
    #[error("Ошибка хранилища настроек ({key}): {reason}")]
    Pref { key: String, reason: String },

    #[error("Не удалось обработать {} настроек: {}", .0.len(), join_failures(.0))]
    OverridesFailed(Vec<PrefFailure>),

    #[error("Ошибка поведения окна {window}: {reason}")]
    Behavior { window: WindowId, reason: String },

    #[error("Подписка на события окон уже активна")]
    AlreadySubscribed,

    #[error("Расширение уже активировано")]
    AlreadyActive,

    #[error("Хост недоступен: {0}")]
    HostUnavailable(String),
}

impl SecureLoginError {
    pub fn pref(key: impl Into<String>, reason: impl Into<String>) -> Self {
        SecureLoginError::Pref {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn behavior(window: WindowId, reason: impl Into<String>) -> Self {
        SecureLoginError::Behavior {
            window,
            reason: reason.into(),
        }
    }
}

fn join_failures(failures: &[PrefFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, SecureLoginError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! securelogin_error {
    (pref, $key:expr, $($arg:tt)*) => {
        $crate::error::SecureLoginError::pref($key, format!($($arg)*))
    };
    (behavior, $window:expr, $($arg:tt)*) => {
        $crate::error::SecureLoginError::behavior($window, format!($($arg)*))
    };
    (host_unavailable, $($arg:tt)*) => {
        $crate::error::SecureLoginError::HostUnavailable(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_failed_lists_every_key() {
        let err = SecureLoginError::OverridesFailed(vec![
            PrefFailure {
                key: "a".to_string(),
                reason: "locked".to_string(),
            },
            PrefFailure {
                key: "b".to_string(),
                reason: "locked".to_string(),
            },
        ]);

        let text = err.to_string();
        assert!(text.contains("2"));
        assert!(text.contains("a: locked"));
        assert!(text.contains("b: locked"));
    }

    #[test]
    fn macro_formats_reason() {
        let err = crate::securelogin_error!(behavior, WindowId(3), "сбой {}", "finalize");
        match err {
            SecureLoginError::Behavior { window, reason } => {
                assert_eq!(window, WindowId(3));
                assert_eq!(reason, "сбой finalize");
            }
            other => panic!("неожиданная ошибка: {other}"),
        }

        let err = crate::securelogin_error!(pref, "signon.autofillForms", "заблокирована");
        assert_eq!(
            err.to_string(),
            "Ошибка хранилища настроек (signon.autofillForms): заблокирована"
        );
    }
}
