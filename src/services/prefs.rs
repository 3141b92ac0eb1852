use crate::error::Result;
use crate::securelogin_error;
use dashmap::{DashMap, DashSet};
use tracing::debug;

/// Защищённый вход
pub const PREF_LOGIN_WITH_PROTECTION: &str = "extensions.securelogin.loginWithProtection";
/// Восстанавливать action/method формы входа, если их подменили
pub const PREF_OVERRIDE_FORM_ACTION: &str = "extensions.securelogin.overrideFormAction";
/// Штатное автозаполнение форм браузера
pub const PREF_AUTOFILL_FORMS: &str = "signon.autofillForms";

/// Значения по умолчанию: ветка расширения из его defaults и штатная настройка браузера
pub fn default_preferences() -> Vec<(String, bool)> {
    vec![
        (PREF_LOGIN_WITH_PROTECTION.to_string(), true),
        (PREF_OVERRIDE_FORM_ACTION.to_string(), true),
        (PREF_AUTOFILL_FORMS.to_string(), true),
    ]
}

/// Глобальное хранилище настроек хоста
pub trait PrefStore: Send + Sync {
    /// Пользовательское значение, иначе значение по умолчанию
    fn get_bool(&self, key: &str) -> Option<bool>;

    fn has_user_value(&self, key: &str) -> bool;

    fn set_bool(&self, key: &str, value: bool) -> Result<()>;

    /// Сбросить к значению по умолчанию. Сброс неустановленной настройки не ошибка.
    fn clear(&self, key: &str) -> Result<()>;
}

/// Хранилище настроек в памяти с поддержкой заблокированных ключей
#[derive(Default)]
pub struct InMemoryPrefStore {
    defaults: DashMap<String, bool>,
    user_values: DashMap<String, bool>,
    locked: DashSet<String>,
}

impl InMemoryPrefStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults<I, K>(defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, bool)>,
        K: Into<String>,
    {
        let store = Self::new();
        for (key, value) in defaults {
            store.defaults.insert(key.into(), value);
        }
        store
    }

    /// Заблокированную настройку нельзя ни изменить, ни сбросить
    pub fn lock(&self, key: &str) {
        self.locked.insert(key.to_string());
    }

    #[allow(dead_code)]
    pub fn unlock(&self, key: &str) {
        self.locked.remove(key);
    }

    fn ensure_unlocked(&self, key: &str) -> Result<()> {
        if self.locked.contains(key) {
            return Err(securelogin_error!(pref, key, "настройка заблокирована"));
        }
        Ok(())
    }
}

impl PrefStore for InMemoryPrefStore {
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.user_values
            .get(key)
            .map(|v| *v)
            .or_else(|| self.defaults.get(key).map(|v| *v))
    }

    fn has_user_value(&self, key: &str) -> bool {
        self.user_values.contains_key(key)
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.ensure_unlocked(key)?;
        debug!("Настройка {} = {}", key, value);
        self.user_values.insert(key.to_string(), value);
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        self.ensure_unlocked(key)?;
        if self.user_values.remove(key).is_some() {
            debug!("Настройка {} сброшена к значению по умолчанию", key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SecureLoginError;

    #[test]
    fn user_value_shadows_default_until_cleared() {
        let store = InMemoryPrefStore::with_defaults(default_preferences());
        assert_eq!(store.get_bool(PREF_AUTOFILL_FORMS), Some(true));
        assert!(!store.has_user_value(PREF_AUTOFILL_FORMS));

        store.set_bool(PREF_AUTOFILL_FORMS, false).unwrap();
        assert_eq!(store.get_bool(PREF_AUTOFILL_FORMS), Some(false));
        assert!(store.has_user_value(PREF_AUTOFILL_FORMS));

        store.clear(PREF_AUTOFILL_FORMS).unwrap();
        assert_eq!(store.get_bool(PREF_AUTOFILL_FORMS), Some(true));
        assert!(!store.has_user_value(PREF_AUTOFILL_FORMS));
    }

    #[test]
    fn clearing_unset_key_is_noop() {
        let store = InMemoryPrefStore::new();
        assert!(store.clear("missing.key").is_ok());
        assert_eq!(store.get_bool("missing.key"), None);
    }

    #[test]
    fn locked_key_rejects_writes() {
        let store = InMemoryPrefStore::new();
        store.lock(PREF_OVERRIDE_FORM_ACTION);

        let err = store.set_bool(PREF_OVERRIDE_FORM_ACTION, true).unwrap_err();
        assert!(matches!(
            err,
            SecureLoginError::Pref { ref key, .. } if key == PREF_OVERRIDE_FORM_ACTION
        ));
        assert!(store.clear(PREF_OVERRIDE_FORM_ACTION).is_err());

        store.unlock(PREF_OVERRIDE_FORM_ACTION);
        assert!(store.set_bool(PREF_OVERRIDE_FORM_ACTION, true).is_ok());
    }
}
