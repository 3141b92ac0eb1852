use crate::error::Result;
use crate::events::WindowInfo;
use crate::services::host::{HostWindow, WindowHandle};
use crate::services::prefs::{PrefStore, PREF_LOGIN_WITH_PROTECTION, PREF_OVERRIDE_FORM_ACTION};
use std::sync::Arc;
use tracing::info;

/// Поведение защищённого входа, привязанное к одному окну
pub trait WindowBehavior: Send + Sync {
    /// Отвязаться от окна. Должно выдерживать ситуацию, когда окно уже уничтожено.
    fn finalize(&mut self) -> Result<()>;
}

/// Создаёт поведение для окна, прошедшего проверку типа
pub trait BehaviorFactory: Send + Sync {
    fn create(&self, window: &WindowHandle) -> Result<Box<dyn WindowBehavior>>;
}

/// Поведение по умолчанию: фиксирует режим работы по настройкам на момент привязки
pub struct SecureLoginBehavior {
    window: WindowInfo,
    login_with_protection: bool,
    override_form_action: bool,
    finalized: bool,
}

impl SecureLoginBehavior {
    pub fn new(window: WindowInfo, prefs: &dyn PrefStore) -> Self {
        let login_with_protection = prefs.get_bool(PREF_LOGIN_WITH_PROTECTION).unwrap_or(false);
        let override_form_action = prefs.get_bool(PREF_OVERRIDE_FORM_ACTION).unwrap_or(false);

        info!(
            "Secure Login подключён к окну {} (защищённый вход: {}, восстановление action: {})",
            window, login_with_protection, override_form_action
        );

        Self {
            window,
            login_with_protection,
            override_form_action,
            finalized: false,
        }
    }

    #[allow(dead_code)]
    pub fn login_with_protection(&self) -> bool {
        self.login_with_protection
    }

    #[allow(dead_code)]
    pub fn override_form_action(&self) -> bool {
        self.override_form_action
    }
}

impl WindowBehavior for SecureLoginBehavior {
    fn finalize(&mut self) -> Result<()> {
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;
        info!("Secure Login отключён от окна {}", self.window);
        Ok(())
    }
}

pub struct SecureLoginBehaviorFactory {
    prefs: Arc<dyn PrefStore>,
}

impl SecureLoginBehaviorFactory {
    pub fn new(prefs: Arc<dyn PrefStore>) -> Self {
        Self { prefs }
    }
}

impl BehaviorFactory for SecureLoginBehaviorFactory {
    fn create(&self, window: &WindowHandle) -> Result<Box<dyn WindowBehavior>> {
        Ok(Box::new(SecureLoginBehavior::new(window.info(), self.prefs.as_ref())))
    }
}
