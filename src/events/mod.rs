pub mod lifecycle;
pub mod window;

pub use lifecycle::Reason;
pub use window::{WindowEvent, WindowEventType, WindowId, WindowInfo, BROWSER_WINDOW_TYPE};
