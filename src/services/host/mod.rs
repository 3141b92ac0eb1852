//! Host boundary: responsibility and boundaries
//!
//! This module describes ONLY what the browser host provides to the add-on:
//! window enumeration, the window notification stream and per-window load
//! signals. It MUST NOT decide which windows get a behavior; that belongs to
//! WindowBehaviorBinder.

mod in_memory;
mod simulation;
mod r#trait;

pub use self::in_memory::InMemoryHost;
pub use self::r#trait::{
    HostDriverTrait, HostWindow, SubscriptionToken, WindowHandle, WindowHost, WindowList,
    WindowSubscription,
};
pub use self::simulation::SimulationDriver;
