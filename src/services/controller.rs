use crate::error::{Result, SecureLoginError};
use crate::events::Reason;
use crate::services::bootstrapper::{EnumerationReport, WindowEnumerationBootstrapper};
use crate::services::listener::WindowLifecycleListener;
use crate::services::overrides::ConfigOverrideManager;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

/// Что было сделано за один переход активации или деактивации
#[derive(Debug, Default)]
pub struct LifecycleReport {
    pub windows: Option<EnumerationReport>,
    pub overrides_error: Option<SecureLoginError>,
    /// Подписка не удалась; уже сделанное снимет деактивация
    pub listener_error: Option<SecureLoginError>,
    #[allow(dead_code)]
    pub listener_changed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActivationState {
    Inactive,
    Active,
}

/// Точки входа расширения: активация, деактивация, установка и удаление
pub struct ActivationController {
    overrides: ConfigOverrideManager,
    bootstrapper: WindowEnumerationBootstrapper,
    listener: WindowLifecycleListener,
    state: Mutex<ActivationState>,
}

impl ActivationController {
    pub fn new(
        overrides: ConfigOverrideManager,
        bootstrapper: WindowEnumerationBootstrapper,
        listener: WindowLifecycleListener,
    ) -> Self {
        Self {
            overrides,
            bootstrapper,
            listener,
            state: Mutex::new(ActivationState::Inactive),
        }
    }

    #[allow(dead_code)]
    pub fn is_active(&self) -> bool {
        *self.state.lock() == ActivationState::Active
    }

    #[allow(dead_code)]
    pub fn listener(&self) -> &WindowLifecycleListener {
        &self.listener
    }

    /// Настройки применяются до привязки: поведение читает их при создании.
    pub async fn activate(&self, reason: Reason) -> Result<LifecycleReport> {
        {
            let mut state = self.state.lock();
            if *state == ActivationState::Active {
                warn!("Повторная активация ({}) без деактивации отклонена", reason);
                return Err(SecureLoginError::AlreadyActive);
            }
            *state = ActivationState::Active;
        }

        info!("Активация расширения (причина: {})", reason);
        let mut report = LifecycleReport::default();

        if let Err(e) = self.overrides.apply() {
            error!("Переопределения настроек применены не полностью: {}", e);
            report.overrides_error = Some(e);
        }

        report.windows = Some(self.bootstrapper.attach_all());

        if self.listener.is_active() {
            // Подписка остаётся после деактивации при завершении приложения
            debug!("Подписка на события окон уже активна, используем её");
        } else if let Err(e) = self.listener.start() {
            // Состояние остаётся активным, чтобы деактивация убрала уже сделанное
            error!("Не удалось подписаться на события окон: {}", e);
            report.listener_error = Some(e);
        } else {
            report.listener_changed = true;
        }

        info!("Расширение активировано");
        Ok(report)
    }

    /// При завершении приложения окна не трогаем, но настройки всё равно сбрасываем.
    /// Подписка при этом остаётся, и следующая активация её переиспользует.
    pub async fn deactivate(&self, reason: Reason) -> Result<LifecycleReport> {
        {
            let mut state = self.state.lock();
            if *state == ActivationState::Inactive {
                debug!("Деактивация ({}) без активации, ничего не делаем", reason);
                return Ok(LifecycleReport::default());
            }
            *state = ActivationState::Inactive;
        }

        info!("Деактивация расширения (причина: {})", reason);
        let mut report = LifecycleReport::default();

        if reason.is_app_shutdown() {
            info!("Приложение завершается: окна и подписка остаются хосту");
        } else {
            self.listener.stop().await;
            report.listener_changed = true;
            report.windows = Some(self.bootstrapper.detach_all());
        }

        if let Err(e) = self.overrides.restore() {
            error!("Переопределения настроек сброшены не полностью: {}", e);
            report.overrides_error = Some(e);
        }

        info!("Расширение деактивировано");
        Ok(report)
    }

    pub fn on_install(&self, reason: Reason) {
        debug!("Установка расширения (причина: {})", reason);
    }

    pub fn on_uninstall(&self, reason: Reason) {
        debug!("Удаление расширения (причина: {})", reason);
    }
}
