use crate::services::binder::{AttachOutcome, DetachOutcome, WindowBehaviorBinder};
use crate::services::host::{HostWindow, WindowHost, WindowList};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Итог одного прохода по окнам
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EnumerationReport {
    pub visited: usize,
    /// Сколько окон сменили состояние (привязаны или отвязаны)
    pub changed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Проход по уже открытым окнам при активации и деактивации
pub struct WindowEnumerationBootstrapper {
    host: Arc<dyn WindowHost>,
    binder: Arc<WindowBehaviorBinder>,
    filter_by_type: bool,
}

impl WindowEnumerationBootstrapper {
    pub fn new(
        host: Arc<dyn WindowHost>,
        binder: Arc<WindowBehaviorBinder>,
        filter_by_type: bool,
    ) -> Self {
        Self {
            host,
            binder,
            filter_by_type,
        }
    }

    fn windows(&self) -> WindowList {
        let filter = self.filter_by_type.then(|| self.binder.window_type());
        self.host.list_windows(filter)
    }

    pub fn attach_all(&self) -> EnumerationReport {
        let mut report = EnumerationReport::default();

        for window in self.windows() {
            report.visited += 1;
            match self.binder.attach(&window) {
                Ok(AttachOutcome::Bound) => report.changed += 1,
                Ok(AttachOutcome::AlreadyBound | AttachOutcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    error!("Не удалось привязать поведение к окну {}: {}", window.id(), e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Привязка к открытым окнам: просмотрено {}, привязано {}, пропущено {}, ошибок {}",
            report.visited, report.changed, report.skipped, report.failed
        );
        report
    }

    pub fn detach_all(&self) -> EnumerationReport {
        let mut report = EnumerationReport::default();

        for window in self.windows() {
            report.visited += 1;
            match self.binder.detach(&window) {
                Ok(DetachOutcome::Finalized) => report.changed += 1,
                Ok(DetachOutcome::NotBound) => report.skipped += 1,
                Err(e) => {
                    error!("Ошибка при отвязке поведения от окна {}: {}", window.id(), e);
                    report.failed += 1;
                }
            }
        }

        // Окна, закрытые без уведомления, в списке хоста уже отсутствуют
        for id in self.binder.bound_windows() {
            report.visited += 1;
            match self.binder.detach_id(id) {
                Ok(DetachOutcome::Finalized) => {
                    warn!("Поведение окна {} пережило само окно и отвязано", id);
                    report.changed += 1;
                }
                Ok(DetachOutcome::NotBound) => report.skipped += 1,
                Err(e) => {
                    error!("Ошибка при отвязке поведения от окна {}: {}", id, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Отвязка от открытых окон: просмотрено {}, отвязано {}, пропущено {}, ошибок {}",
            report.visited, report.changed, report.skipped, report.failed
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::BROWSER_WINDOW_TYPE;
    use crate::services::host::{InMemoryHost, WindowHandle};
    use crate::services::testing::CountingFactory;

    type Setup = (
        Arc<InMemoryHost>,
        Arc<CountingFactory>,
        Arc<WindowBehaviorBinder>,
        WindowEnumerationBootstrapper,
    );

    fn setup(filter_by_type: bool) -> Setup {
        let host = Arc::new(InMemoryHost::new());
        let factory = Arc::new(CountingFactory::default());
        let binder = Arc::new(WindowBehaviorBinder::new(factory.clone(), BROWSER_WINDOW_TYPE));
        let bootstrapper =
            WindowEnumerationBootstrapper::new(host.clone(), binder.clone(), filter_by_type);
        (host, factory, binder, bootstrapper)
    }

    #[test]
    fn attach_all_binds_only_browser_windows() {
        let (host, factory, binder, bootstrapper) = setup(false);
        let browser = host.open_loaded_window(BROWSER_WINDOW_TYPE, "Firefox");
        let dialog = host.open_loaded_window("Browser:Preferences", "Настройки");

        let report = bootstrapper.attach_all();
        assert_eq!(report.visited, 2);
        assert_eq!(report.changed, 1);
        assert_eq!(report.skipped, 1);
        assert!(binder.is_bound(browser.id()));
        assert!(!binder.is_bound(dialog.id()));
        assert_eq!(factory.total_created(), 1);
    }

    #[test]
    fn type_filter_is_pushed_to_host() {
        let (host, _factory, _binder, bootstrapper) = setup(true);
        host.open_loaded_window(BROWSER_WINDOW_TYPE, "Firefox");
        host.open_loaded_window("Browser:Preferences", "Настройки");

        let report = bootstrapper.attach_all();
        assert_eq!(report.visited, 1);
        assert_eq!(report.changed, 1);
    }

    #[test]
    fn failures_do_not_stop_enumeration() {
        let (host, factory, binder, bootstrapper) = setup(true);
        let first = host.open_loaded_window(BROWSER_WINDOW_TYPE, "Первое");
        let second = host.open_loaded_window(BROWSER_WINDOW_TYPE, "Второе");
        let third = host.open_loaded_window(BROWSER_WINDOW_TYPE, "Третье");
        factory.failing_create.insert(first.id());

        let report = bootstrapper.attach_all();
        assert_eq!(report.failed, 1);
        assert_eq!(report.changed, 2);
        assert!(binder.is_bound(second.id()));
        assert!(binder.is_bound(third.id()));

        factory.failing_finalize.insert(second.id());
        let report = bootstrapper.detach_all();
        assert_eq!(report.visited, 3);
        assert_eq!(report.failed, 1);
        assert_eq!(report.changed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(binder.bound_count(), 0);
        assert_eq!(factory.finalized(third.id()), 1);
    }

    #[test]
    fn detach_all_releases_windows_gone_from_host() {
        let (host, factory, binder, bootstrapper) = setup(true);
        let open = host.open_loaded_window(BROWSER_WINDOW_TYPE, "Открытое");
        let closed = host.open_loaded_window(BROWSER_WINDOW_TYPE, "Закрытое");
        bootstrapper.attach_all();

        // Закрытие без подписчика: таблица о нём не узнаёт
        host.close_window(closed.id());
        assert!(binder.is_bound(closed.id()));

        let report = bootstrapper.detach_all();
        assert_eq!(report.changed, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(binder.bound_count(), 0);
        assert_eq!(factory.finalized(open.id()), 1);
        assert_eq!(factory.finalized(closed.id()), 1);

        let window: WindowHandle = open;
        assert_eq!(binder.detach(&window).unwrap(), DetachOutcome::NotBound);
        assert_eq!(factory.total_finalized(), 2);
    }

    #[test]
    fn repeated_passes_are_noops() {
        let (host, factory, _binder, bootstrapper) = setup(true);
        host.open_loaded_window(BROWSER_WINDOW_TYPE, "Firefox");

        bootstrapper.attach_all();
        let again = bootstrapper.attach_all();
        assert_eq!(again.changed, 0);
        assert_eq!(factory.total_created(), 1);

        bootstrapper.detach_all();
        let again = bootstrapper.detach_all();
        assert_eq!(again.changed, 0);
        assert_eq!(factory.total_finalized(), 1);
    }
}
