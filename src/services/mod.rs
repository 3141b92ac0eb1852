pub mod behavior;
pub mod binder;
pub mod bootstrapper;
pub mod controller;
pub mod host;
pub mod listener;
pub mod overrides;
pub mod prefs;

#[cfg(test)]
pub(crate) mod testing;

pub use behavior::SecureLoginBehaviorFactory;
pub use binder::WindowBehaviorBinder;
pub use bootstrapper::WindowEnumerationBootstrapper;
pub use controller::ActivationController;
pub use listener::WindowLifecycleListener;
pub use overrides::ConfigOverrideManager;
pub use prefs::InMemoryPrefStore;
