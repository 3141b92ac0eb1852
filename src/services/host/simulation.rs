use crate::config::{Config, SimulatedWindow};
use crate::error::Result;
use crate::events::WindowId;
use std::sync::Arc;
use tokio::time::{interval, sleep, Duration};
use tracing::info;

use super::in_memory::InMemoryHost;
use super::r#trait::{HostDriverTrait, HostWindow};

/// Эмулирует действия пользователя с окнами в хосте в памяти
pub struct SimulationDriver {
    config: Arc<Config>,
    host: Arc<InMemoryHost>,
}

impl SimulationDriver {
    pub fn new(config: Arc<Config>, host: Arc<InMemoryHost>) -> Self {
        Self { config, host }
    }

    /// Окна, открытые до активации расширения
    pub fn seed_startup_windows(&self) -> Vec<WindowId> {
        self.config
            .simulation
            .startup_windows
            .iter()
            .map(|w| {
                let window = self.host.open_loaded_window(&w.window_type, &w.title);
                info!("Симуляция: окно {} уже открыто при старте", window.info());
                window.id()
            })
            .collect()
    }

    async fn run_impl(self) -> Result<()> {
        let simulation = &self.config.simulation;
        if simulation.late_windows.is_empty() {
            info!("Симуляция: новых окон не запланировано");
            std::future::pending::<()>().await;
            return Ok(());
        }

        let load_delay = Duration::from_millis(simulation.load_delay_ms);
        let lifetime = (simulation.window_lifetime_ms > 0)
            .then(|| Duration::from_millis(simulation.window_lifetime_ms));

        let mut window_index = 0;
        let mut interval = interval(Duration::from_millis(simulation.open_interval_ms));
        // Первый тик срабатывает сразу, пропускаем его
        interval.tick().await;

        loop {
            interval.tick().await;

            let planned = &simulation.late_windows[window_index];
            self.open_one(planned, load_delay, lifetime);

            window_index = (window_index + 1) % simulation.late_windows.len();
        }
    }

    fn open_one(
        &self,
        planned: &SimulatedWindow,
        load_delay: Duration,
        lifetime: Option<Duration>,
    ) {
        let window = self.host.open_window(&planned.window_type, &planned.title);
        let id = window.id();
        info!("Симуляция: открыто окно {} \"{}\"", id, planned.title);

        let host = Arc::clone(&self.host);
        tokio::spawn(async move {
            sleep(load_delay).await;
            if host.finish_loading(id) {
                info!("Симуляция: окно {} загрузилось", id);
            }

            if let Some(lifetime) = lifetime {
                sleep(lifetime).await;
                if host.close_window(id) {
                    info!("Симуляция: окно {} закрыто", id);
                }
            }
        });
    }
}

#[async_trait::async_trait]
impl HostDriverTrait for SimulationDriver {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}
