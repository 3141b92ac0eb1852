use crate::services::host::WindowHandle;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Тип главного окна браузера
pub const BROWSER_WINDOW_TYPE: &str = "navigator:browser";

/// Идентификатор окна, выданный хостом
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Снимок атрибутов окна для логов и проверок
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowInfo {
    pub id: WindowId,
    pub title: String,
    pub window_type: Option<String>,
}

impl WindowInfo {
    pub fn new(id: WindowId, title: String) -> Self {
        Self {
            id,
            title,
            window_type: None,
        }
    }

    pub fn with_type(mut self, window_type: impl Into<String>) -> Self {
        self.window_type = Some(window_type.into());
        self
    }

    /// Совпадает ли классификатор окна с ожидаемым (строгое сравнение)
    pub fn matches_type(&self, expected: &str) -> bool {
        self.window_type.as_deref() == Some(expected)
    }
}

impl fmt::Display for WindowInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.window_type {
            Some(window_type) => write!(f, "{} \"{}\" ({})", self.id, self.title, window_type),
            None => write!(f, "{} \"{}\"", self.id, self.title),
        }
    }
}

/// Уведомление хоста об окне
#[derive(Debug, Clone)]
pub struct WindowEvent {
    pub window: WindowHandle,
    pub timestamp: std::time::Instant,
    pub event_type: WindowEventType,
}

impl WindowEvent {
    pub fn new(window: WindowHandle, event_type: WindowEventType) -> Self {
        Self {
            window,
            timestamp: std::time::Instant::now(),
            event_type,
        }
    }

    pub fn opened(window: WindowHandle) -> Self {
        Self::new(window, WindowEventType::Opened)
    }

    pub fn closed(window: WindowHandle) -> Self {
        Self::new(window, WindowEventType::Closed)
    }

    #[allow(dead_code)]
    pub fn title_changed(window: WindowHandle) -> Self {
        Self::new(window, WindowEventType::TitleChanged)
    }
}

impl fmt::Display for WindowEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}: {} ({}ms ago)",
            self.event_type,
            self.window.info(),
            self.timestamp.elapsed().as_millis()
        )
    }
}

/// Тип события окна
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowEventType {
    Opened,
    Closed,
    TitleChanged,
}
