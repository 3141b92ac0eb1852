use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
mod services;
mod utils;

use config::Config;
use events::Reason;
use services::host::{HostDriverTrait, InMemoryHost, SimulationDriver};
use services::{
    ActivationController, ConfigOverrideManager, InMemoryPrefStore, SecureLoginBehaviorFactory,
    WindowBehaviorBinder, WindowEnumerationBootstrapper, WindowLifecycleListener,
};

#[derive(Parser, Debug)]
#[command(name = "securelogin-lifecycle")]
#[command(about = "Привязка Secure Login к окнам браузера и временные переопределения настроек")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "securelogin.toml")]
    config: String,

    /// Уровень логирования (по умолчанию из конфигурации)
    #[arg(long)]
    log_level: Option<String>,

    /// Причина деактивации при завершении по Ctrl+C
    #[arg(long, value_enum, default_value_t = Reason::AddonDisable)]
    exit_reason: Reason,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации
    let config = Arc::new(Config::load(&args.config)?);

    // Инициализация системы логирования
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level, &config.logging.format)?;

    info!("Запуск securelogin-lifecycle v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    // Сервисы хоста
    let host = Arc::new(InMemoryHost::new());
    let prefs = Arc::new(InMemoryPrefStore::with_defaults(config.preferences.defaults.clone()));
    for key in &config.preferences.locked {
        warn!("Настройка {} заблокирована", key);
        prefs.lock(key);
    }

    let driver = SimulationDriver::new(config.clone(), host.clone());
    let seeded = driver.seed_startup_windows();
    info!("Открыто окон до активации: {}", seeded.len());

    // Инициализация компонентов расширения
    let factory = Arc::new(SecureLoginBehaviorFactory::new(prefs.clone()));
    let binder = Arc::new(WindowBehaviorBinder::new(
        factory,
        config.window.browser_window_type.clone(),
    ));
    let controller = ActivationController::new(
        ConfigOverrideManager::new(prefs.clone()),
        WindowEnumerationBootstrapper::new(
            host.clone(),
            binder.clone(),
            config.window.filter_enumeration_by_type,
        ),
        WindowLifecycleListener::new(host.clone(), binder.clone()),
    );

    // Хост вызывает install перед первым запуском расширения
    controller.on_install(Reason::AddonInstall);
    let report = controller.activate(Reason::AppStartup).await?;
    if let Some(e) = report.listener_error {
        warn!("Новые окна отслеживаться не будут: {}", e);
    }
    info!("Окон с поведением Secure Login: {}", binder.bound_count());

    let driver: Box<dyn HostDriverTrait + Send> = Box::new(driver);
    let driver_handle = tokio::spawn(async move {
        if let Err(e) = driver.run().await {
            error!("Ошибка в симуляции окон: {}", e);
        }
    });

    // Ожидание сигнала завершения
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Получен сигнал завершения (Ctrl+C)");
        }
        Err(err) => {
            error!("Ошибка при ожидании сигнала завершения: {}", err);
        }
    }

    info!("Завершение работы (причина: {})...", args.exit_reason);
    driver_handle.abort();
    let _ = driver_handle.await;

    let shutdown_timeout = tokio::time::Duration::from_millis(config.window.shutdown_timeout_ms);
    match tokio::time::timeout(shutdown_timeout, controller.deactivate(args.exit_reason)).await {
        Ok(Ok(report)) => {
            if let Some(windows) = report.windows {
                info!("Отвязано окон: {}, ошибок: {}", windows.changed, windows.failed);
            }
            if let Some(e) = report.overrides_error {
                warn!("Настройки сброшены не полностью: {}", e);
            }
        }
        Ok(Err(e)) => error!("Ошибка деактивации: {}", e),
        Err(_) => warn!("Таймаут при деактивации расширения"),
    }

    if args.exit_reason == Reason::AddonUninstall {
        controller.on_uninstall(args.exit_reason);
    }

    info!(
        "securelogin-lifecycle завершил работу (окон с поведением: {})",
        binder.bound_count()
    );
    Ok(())
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        "compact" => registry.with(tracing_subscriber::fmt::layer().compact()).init(),
        _ => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    Ok(())
}
