use crate::error::Result;
use crate::events::{WindowEvent, WindowId};
use crate::securelogin_error;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use super::r#trait::{
    HostWindow, SubscriptionToken, WindowHandle, WindowHost, WindowList, WindowSubscription,
};

#[derive(Default)]
struct WindowState {
    loaded: bool,
    closed: bool,
    load_waiters: Vec<oneshot::Sender<()>>,
}

/// Окно хоста, живущее в памяти процесса
pub struct InMemoryWindow {
    id: WindowId,
    declared_type: String,
    title: RwLock<String>,
    state: Mutex<WindowState>,
}

impl InMemoryWindow {
    fn new(id: WindowId, declared_type: &str, title: &str) -> Self {
        Self {
            id,
            declared_type: declared_type.to_string(),
            title: RwLock::new(title.to_string()),
            state: Mutex::new(WindowState::default()),
        }
    }

    /// Завершить загрузку и разбудить всех ожидающих. Повторный вызов ничего не делает.
    fn finish_loading(&self) -> bool {
        let mut state = self.state.lock();
        if state.loaded || state.closed {
            return false;
        }
        state.loaded = true;
        for waiter in state.load_waiters.drain(..) {
            let _ = waiter.send(());
        }
        true
    }

    fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        // Сброс отправителей завершает ожидания загрузки
        state.load_waiters.clear();
    }

    #[allow(dead_code)]
    pub fn is_loaded(&self) -> bool {
        self.state.lock().loaded
    }

    #[allow(dead_code)]
    pub fn load_waiter_count(&self) -> usize {
        self.state.lock().load_waiters.len()
    }
}

impl HostWindow for InMemoryWindow {
    fn id(&self) -> WindowId {
        self.id
    }

    fn title(&self) -> String {
        self.title.read().clone()
    }

    fn window_type(&self) -> Option<String> {
        let state = self.state.lock();
        if state.loaded && !state.closed {
            Some(self.declared_type.clone())
        } else {
            None
        }
    }

    fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn on_load(&self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        let mut state = self.state.lock();
        if state.closed {
            drop(tx);
        } else if state.loaded {
            let _ = tx.send(());
        } else {
            state.load_waiters.push(tx);
        }
        rx
    }
}

/// Хост окон в памяти: используется симуляцией и тестами
pub struct InMemoryHost {
    windows: RwLock<Vec<Arc<InMemoryWindow>>>,
    subscribers: DashMap<SubscriptionToken, mpsc::UnboundedSender<WindowEvent>>,
    next_window_id: AtomicU64,
    next_token: AtomicU64,
    unsubscribe_calls: AtomicUsize,
    reject_subscriptions: AtomicBool,
}

impl Default for InMemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self {
            windows: RwLock::new(Vec::new()),
            subscribers: DashMap::new(),
            next_window_id: AtomicU64::new(1),
            next_token: AtomicU64::new(1),
            unsubscribe_calls: AtomicUsize::new(0),
            reject_subscriptions: AtomicBool::new(false),
        }
    }

    /// Открыть окно, которое ещё не загрузилось, и разослать уведомление
    pub fn open_window(&self, window_type: &str, title: &str) -> Arc<InMemoryWindow> {
        let id = WindowId(self.next_window_id.fetch_add(1, Ordering::Relaxed));
        let window = Arc::new(InMemoryWindow::new(id, window_type, title));
        self.windows.write().push(window.clone());

        debug!("Хост: открыто окно {} ({})", id, window_type);
        self.broadcast(WindowEvent::opened(window.clone() as WindowHandle));
        window
    }

    /// Открыть окно и сразу завершить его загрузку
    pub fn open_loaded_window(&self, window_type: &str, title: &str) -> Arc<InMemoryWindow> {
        let window = self.open_window(window_type, title);
        window.finish_loading();
        window
    }

    pub fn finish_loading(&self, id: WindowId) -> bool {
        match self.window(id) {
            Some(window) => window.finish_loading(),
            None => false,
        }
    }

    pub fn close_window(&self, id: WindowId) -> bool {
        let removed = {
            let mut windows = self.windows.write();
            let position = windows.iter().position(|w| w.id == id);
            position.map(|index| windows.remove(index))
        };

        match removed {
            Some(window) => {
                window.close();
                debug!("Хост: закрыто окно {}", id);
                self.broadcast(WindowEvent::closed(window as WindowHandle));
                true
            }
            None => false,
        }
    }

    #[allow(dead_code)]
    pub fn set_title(&self, id: WindowId, title: &str) -> bool {
        match self.window(id) {
            Some(window) => {
                *window.title.write() = title.to_string();
                self.broadcast(WindowEvent::title_changed(window as WindowHandle));
                true
            }
            None => false,
        }
    }

    pub fn window(&self, id: WindowId) -> Option<Arc<InMemoryWindow>> {
        self.windows.read().iter().find(|w| w.id == id).cloned()
    }

    #[allow(dead_code)]
    pub fn open_window_count(&self) -> usize {
        self.windows.read().len()
    }

    #[allow(dead_code)]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    #[allow(dead_code)]
    pub fn unsubscribe_calls(&self) -> usize {
        self.unsubscribe_calls.load(Ordering::Relaxed)
    }

    /// Хост перестаёт принимать новые подписки, как при завершении приложения
    #[allow(dead_code)]
    pub fn reject_subscriptions(&self, reject: bool) {
        self.reject_subscriptions.store(reject, Ordering::Relaxed);
    }

    fn broadcast(&self, event: WindowEvent) {
        let mut stale = Vec::new();
        for entry in self.subscribers.iter() {
            if entry.value().send(event.clone()).is_err() {
                stale.push(*entry.key());
            }
        }
        // Удаляем после обхода, чтобы не держать блокировку шарда
        for token in stale {
            self.subscribers.remove(&token);
        }
    }
}

impl WindowHost for InMemoryHost {
    fn list_windows(&self, type_filter: Option<&str>) -> WindowList {
        self.windows
            .read()
            .iter()
            .filter(|w| match type_filter {
                Some(expected) => w.window_type().as_deref() == Some(expected),
                None => true,
            })
            .map(|w| w.clone() as WindowHandle)
            .collect()
    }

    fn subscribe(&self) -> Result<WindowSubscription> {
        if self.reject_subscriptions.load(Ordering::Relaxed) {
            return Err(securelogin_error!(host_unavailable, "подписки на окна не принимаются"));
        }
        let token = SubscriptionToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.insert(token, tx);
        info!("Хост: зарегистрирована подписка {:?}", token);
        Ok(WindowSubscription { token, events: rx })
    }

    fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        self.unsubscribe_calls.fetch_add(1, Ordering::Relaxed);
        let removed = self.subscribers.remove(&token).is_some();
        info!("Хост: подписка {:?} снята (найдена: {})", token, removed);
        removed
    }
}
