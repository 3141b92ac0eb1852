use crate::debug_if_enabled;
use crate::error::{Result, SecureLoginError};
use crate::events::WindowId;
use crate::securelogin_error;
use crate::services::behavior::{BehaviorFactory, WindowBehavior};
use crate::services::host::{HostWindow, WindowHandle};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Результат попытки привязки
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    Bound,
    AlreadyBound,
    /// Окно не является главным окном браузера
    Skipped,
}

/// Результат попытки отвязки
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetachOutcome {
    Finalized,
    NotBound,
}

/// Привязывает поведение к окнам. Владеет таблицей окно → поведение.
///
/// Для каждого окна допустимы только переходы `unbound → bound → unbound`:
/// повторная привязка и повторная отвязка ничего не делают.
pub struct WindowBehaviorBinder {
    factory: Arc<dyn BehaviorFactory>,
    window_type: String,
    bound: DashMap<WindowId, Box<dyn WindowBehavior>>,
}

impl WindowBehaviorBinder {
    pub fn new(factory: Arc<dyn BehaviorFactory>, window_type: impl Into<String>) -> Self {
        Self {
            factory,
            window_type: window_type.into(),
            bound: DashMap::new(),
        }
    }

    pub fn window_type(&self) -> &str {
        &self.window_type
    }

    pub fn attach(&self, window: &WindowHandle) -> Result<AttachOutcome> {
        let info = window.info();
        if !info.matches_type(&self.window_type) {
            debug_if_enabled!("Окно {} не подходит по типу, пропускаем", info);
            return Ok(AttachOutcome::Skipped);
        }

        match self.bound.entry(info.id) {
            Entry::Occupied(_) => {
                debug_if_enabled!("Окно {} уже привязано", info);
                Ok(AttachOutcome::AlreadyBound)
            }
            Entry::Vacant(slot) => {
                let behavior = self.factory.create(window)?;
                slot.insert(behavior);
                info!("Поведение привязано к окну {}", info);
                Ok(AttachOutcome::Bound)
            }
        }
    }

    pub fn detach(&self, window: &WindowHandle) -> Result<DetachOutcome> {
        self.detach_id(window.id())
    }

    /// Запись удаляется до вызова finalize, поэтому окно остаётся отвязанным
    /// даже при ошибке finalize.
    pub fn detach_id(&self, id: WindowId) -> Result<DetachOutcome> {
        let Some((_, mut behavior)) = self.bound.remove(&id) else {
            debug_if_enabled!("Окно {} не привязано, отвязка не нужна", id);
            return Ok(DetachOutcome::NotBound);
        };

        match behavior.finalize() {
            Ok(()) => {
                info!("Поведение отвязано от окна {}", id);
                Ok(DetachOutcome::Finalized)
            }
            Err(e) => {
                warn!("finalize для окна {} завершился ошибкой: {}", id, e);
                Err(match e {
                    SecureLoginError::Behavior { .. } => e,
                    other => securelogin_error!(behavior, id, "{}", other),
                })
            }
        }
    }

    #[allow(dead_code)]
    pub fn is_bound(&self, id: WindowId) -> bool {
        self.bound.contains_key(&id)
    }

    pub fn bound_count(&self) -> usize {
        self.bound.len()
    }

    pub fn bound_windows(&self) -> Vec<WindowId> {
        let mut ids: Vec<WindowId> = self.bound.iter().map(|entry| *entry.key()).collect();
        ids.sort();
        ids
    }
}
