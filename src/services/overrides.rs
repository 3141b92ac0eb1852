use crate::error::{PrefFailure, Result, SecureLoginError};
use crate::services::prefs::{
    PrefStore, PREF_AUTOFILL_FORMS, PREF_LOGIN_WITH_PROTECTION, PREF_OVERRIDE_FORM_ACTION,
};
use std::sync::Arc;
use tracing::{error, info};

/// Переопределение одной логической настройки на время активации
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefOverride {
    pub key: &'static str,
    pub value: bool,
}

/// Набор переопределений. Сбрасывается ровно тот же набор ключей, что применялся.
pub const PREF_OVERRIDES: [PrefOverride; 3] = [
    PrefOverride {
        key: PREF_LOGIN_WITH_PROTECTION,
        value: true,
    },
    PrefOverride {
        key: PREF_OVERRIDE_FORM_ACTION,
        value: true,
    },
    // Автозаполнение подставляет пароль в форму до нас, а на странице с XSS его можно украсть
    PrefOverride {
        key: PREF_AUTOFILL_FORMS,
        value: false,
    },
];

pub struct ConfigOverrideManager {
    store: Arc<dyn PrefStore>,
}

impl ConfigOverrideManager {
    pub fn new(store: Arc<dyn PrefStore>) -> Self {
        Self { store }
    }

    /// Применить все переопределения. Ошибка одного ключа не мешает остальным.
    pub fn apply(&self) -> Result<()> {
        info!("Применение {} переопределений настроек", PREF_OVERRIDES.len());
        self.for_each_override(|store, pref| store.set_bool(pref.key, pref.value))
    }

    /// Сбросить все переопределённые ключи к значениям по умолчанию
    pub fn restore(&self) -> Result<()> {
        info!("Сброс {} переопределений настроек", PREF_OVERRIDES.len());
        self.for_each_override(|store, pref| store.clear(pref.key))
    }

    fn for_each_override<F>(&self, mut op: F) -> Result<()>
    where
        F: FnMut(&dyn PrefStore, &PrefOverride) -> Result<()>,
    {
        let mut failures = Vec::new();

        for pref in &PREF_OVERRIDES {
            if let Err(e) = op(self.store.as_ref(), pref) {
                error!("Не удалось обработать настройку {}: {}", pref.key, e);
                failures.push(PrefFailure {
                    key: pref.key.to_string(),
                    reason: e.to_string(),
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(SecureLoginError::OverridesFailed(failures))
        }
    }
}
