use crate::debug_if_enabled;
use crate::error::{Result, SecureLoginError};
use crate::events::{WindowEvent, WindowEventType};
use crate::services::binder::WindowBehaviorBinder;
use crate::services::host::{
    HostWindow, SubscriptionToken, WindowHandle, WindowHost, WindowSubscription,
};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

struct ActiveSubscription {
    token: SubscriptionToken,
    pump: JoinHandle<()>,
}

/// Ожидания загрузки новых окон, по одному на каждое уведомление об открытии
#[derive(Default)]
struct PendingLoads {
    next_id: AtomicU64,
    tasks: DashMap<u64, JoinHandle<()>>,
}

/// Следит за открытием окон, пока расширение активно
pub struct WindowLifecycleListener {
    host: Arc<dyn WindowHost>,
    binder: Arc<WindowBehaviorBinder>,
    subscription: Mutex<Option<ActiveSubscription>>,
    pending: Arc<PendingLoads>,
}

impl WindowLifecycleListener {
    pub fn new(host: Arc<dyn WindowHost>, binder: Arc<WindowBehaviorBinder>) -> Self {
        Self {
            host,
            binder,
            subscription: Mutex::new(None),
            pending: Arc::new(PendingLoads::default()),
        }
    }

    /// Подписаться на уведомления хоста. Вторая подписка не создаётся.
    pub fn start(&self) -> Result<()> {
        let mut slot = self.subscription.lock();
        if slot.is_some() {
            warn!("Повторный запуск WindowLifecycleListener проигнорирован");
            return Err(SecureLoginError::AlreadySubscribed);
        }

        let WindowSubscription { token, mut events } = self.host.subscribe()?;
        let binder = Arc::clone(&self.binder);
        let pending = Arc::clone(&self.pending);

        let pump = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                Self::handle_event(event, &binder, &pending);
            }
            debug!("Поток уведомлений об окнах закрыт хостом");
        });

        *slot = Some(ActiveSubscription { token, pump });
        info!("WindowLifecycleListener подписан на события окон ({:?})", token);
        Ok(())
    }

    /// Отписаться и отменить незавершённые ожидания загрузки. Без `start` ничего не делает.
    pub async fn stop(&self) {
        let active = self.subscription.lock().take();
        let Some(active) = active else {
            debug!("WindowLifecycleListener не запущен, остановка не требуется");
            return;
        };

        self.host.unsubscribe(active.token);
        active.pump.abort();
        let _ = active.pump.await;

        let waits: Vec<JoinHandle<()>> = {
            let ids: Vec<u64> = self.pending.tasks.iter().map(|entry| *entry.key()).collect();
            ids.into_iter()
                .filter_map(|id| self.pending.tasks.remove(&id).map(|(_, task)| task))
                .collect()
        };
        let cancelled = waits.len();
        for task in waits {
            task.abort();
            let _ = task.await;
        }

        info!(
            "WindowLifecycleListener остановлен, отменено ожиданий загрузки: {}",
            cancelled
        );
    }

    pub fn is_active(&self) -> bool {
        self.subscription.lock().is_some()
    }

    #[allow(dead_code)]
    pub fn pending_loads(&self) -> usize {
        self.pending.tasks.len()
    }

    fn handle_event(
        event: WindowEvent,
        binder: &Arc<WindowBehaviorBinder>,
        pending: &Arc<PendingLoads>,
    ) {
        debug_if_enabled!("Событие окна: {}", event);

        match event.event_type {
            WindowEventType::Opened => Self::wait_for_load(event.window, binder, pending),
            // Ожидания загрузки хост сбрасывает сам, запись в таблице убираем мы
            WindowEventType::Closed => {
                if let Err(e) = binder.detach_id(event.window.id()) {
                    error!("Ошибка при отвязке закрытого окна {}: {}", event.window.id(), e);
                }
            }
            WindowEventType::TitleChanged => {}
        }
    }

    /// Привязка откладывается до загрузки: до неё тип окна прочитать нельзя
    fn wait_for_load(
        window: WindowHandle,
        binder: &Arc<WindowBehaviorBinder>,
        pending: &Arc<PendingLoads>,
    ) {
        let wait_id = pending.next_id.fetch_add(1, Ordering::Relaxed);
        let loaded = window.on_load();
        let binder = Arc::clone(binder);
        let pending_for_task = Arc::clone(pending);

        let task = tokio::spawn(async move {
            match loaded.await {
                Ok(()) if !window.is_closed() => {
                    if let Err(e) = binder.attach(&window) {
                        error!(
                            "Не удалось привязать поведение к новому окну {}: {}",
                            window.id(),
                            e
                        );
                    }
                }
                Ok(()) => debug!("Окно {} закрыто до обработки загрузки", window.id()),
                Err(_) => debug!("Окно {} закрыто до окончания загрузки", window.id()),
            }
            pending_for_task.tasks.remove(&wait_id);
        });

        pending.tasks.insert(wait_id, task);
        // Задача могла завершиться раньше вставки на многопоточном рантайме
        pending.tasks.remove_if(&wait_id, |_, task| task.is_finished());
    }
}

impl Drop for WindowLifecycleListener {
    fn drop(&mut self) {
        if let Some(active) = self.subscription.lock().take() {
            active.pump.abort();
        }
        for entry in self.pending.tasks.iter() {
            entry.value().abort();
        }
    }
}
