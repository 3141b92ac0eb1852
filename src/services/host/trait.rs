use crate::error::Result;
use crate::events::{WindowEvent, WindowId, WindowInfo};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Окно верхнего уровня, принадлежащее хосту.
///
/// Этот сервис окна не создаёт и не уничтожает: он только читает атрибуты
/// и ждёт сигнала окончания загрузки.
pub trait HostWindow: Send + Sync {
    fn id(&self) -> WindowId;

    fn title(&self) -> String;

    /// Классификатор типа окна. До окончания загрузки может быть недоступен.
    fn window_type(&self) -> Option<String>;

    fn is_closed(&self) -> bool;

    /// Одноразовый сигнал окончания загрузки.
    ///
    /// Если окно уже загружено, приёмник готов сразу. Если окно уничтожено
    /// раньше, отправитель сбрасывается и ожидание завершается ошибкой.
    fn on_load(&self) -> oneshot::Receiver<()>;

    fn info(&self) -> WindowInfo {
        let info = WindowInfo::new(self.id(), self.title());
        match self.window_type() {
            Some(window_type) => info.with_type(window_type),
            None => info,
        }
    }
}

impl fmt::Debug for dyn HostWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostWindow({})", self.info())
    }
}

pub type WindowHandle = Arc<dyn HostWindow>;

/// Обычно окон немного, поэтому список живёт на стеке
pub type WindowList = SmallVec<[WindowHandle; 8]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(pub u64);

/// Активная подписка на уведомления об окнах
#[derive(Debug)]
pub struct WindowSubscription {
    pub token: SubscriptionToken,
    pub events: mpsc::UnboundedReceiver<WindowEvent>,
}

/// Сервис окон хоста: перечисление и поток уведомлений
pub trait WindowHost: Send + Sync {
    /// Текущие открытые окна в порядке, который выбрал хост
    fn list_windows(&self, type_filter: Option<&str>) -> WindowList;

    fn subscribe(&self) -> Result<WindowSubscription>;

    /// Возвращает `false`, если такой подписки нет
    fn unsubscribe(&self, token: SubscriptionToken) -> bool;
}

/// Источник событий хоста, работающий до завершения процесса
#[async_trait::async_trait]
pub trait HostDriverTrait {
    async fn run(self: Box<Self>) -> Result<()>;
}
