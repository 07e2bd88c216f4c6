//! Точка входа приложения: загрузка конфигурации, CLI команды

use std::collections::BTreeMap;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub mod cli;
pub mod logging;

use cli::{Cli, Command};

use crate::catalog::Catalog;
use crate::collector::DeviceIdentity;
use crate::config::{AppConfig, DeviceProfile, LogFormat, SnmpVersion};
use crate::coordinator::{Coordinator, SnmpPollSource};
use crate::executor::BlockingExecutor;
use crate::formatter::JsonFormatter;
use crate::handlers::{AppState, DeviceHandle};
use crate::projection::entities;
use crate::routes::create_router;
use crate::setup;
use crate::snmp::SnmpClient;

pub async fn run(cli: Cli) -> Result<ExitCode> {
    let config = AppConfig::load(&cli.config)?;

    let level = cli.log_level.as_deref().unwrap_or(&config.settings.logging.level);
    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        config.settings.logging.format
    };
    logging::init(level, format)?;

    if config.devices.is_empty() {
        bail!("В {} не описано ни одного устройства", cli.config.display());
    }

    match cli.command.unwrap_or(Command::Run { listen: None }) {
        Command::Run { listen } => run_coordinators(config, listen).await,
        Command::Poll { device } => poll_devices(&config, device.as_deref()).await,
        Command::TestConnection { device } => test_connections(&config, device.as_deref()).await,
    }
}

fn select<'a>(config: &'a AppConfig, device: Option<&str>) -> Result<Vec<&'a DeviceProfile>> {
    match device {
        None => Ok(config.devices.iter().collect()),
        Some(name) => config
            .device(name)
            .map(|d| vec![d])
            .with_context(|| format!("Устройство '{name}' не найдено в конфигурации")),
    }
}

/// Координатор на каждое устройство, вывод состояния в stdout и HTTP API
async fn run_coordinators(config: AppConfig, listen: Option<String>) -> Result<ExitCode> {
    let settings = &config.settings;
    let executor = BlockingExecutor::new(settings.connection.workers);
    let mut devices = BTreeMap::new();

    for profile in &config.devices {
        let connection = profile.connection(&settings.connection)?;
        if connection.version() == SnmpVersion::V2c {
            warn!(
                device = %profile.name,
                "SNMPv2c передаёт community открытым текстом, по возможности используйте SNMPv3"
            );
        }

        let source = SnmpPollSource::new(
            SnmpClient::new(&connection),
            executor.clone(),
            Catalog::apc().clone(),
            settings.connection.round_timeout(),
        );
        let interval = profile.poll_interval(settings.polling.interval)?;
        let coordinator = Coordinator::new(profile.name.clone(), source, interval)?;
        let device_entities = entities(&profile.sensors()?);

        let name = profile.name.clone();
        let printed = device_entities.clone();
        coordinator.subscribe(move |state| {
            let json = JsonFormatter::format_state(&name, state, &printed);
            println!("{}", JsonFormatter::to_json_string(&json)?);
            Ok(())
        });

        devices.insert(
            profile.name.clone(),
            DeviceHandle {
                coordinator,
                entities: device_entities,
            },
        );
    }

    for device in devices.values() {
        device.coordinator.start();
    }
    info!(devices = devices.len(), workers = executor.workers(), "Опрос запущен");

    let shutdown = CancellationToken::new();
    let listen = listen.or_else(|| settings.http.as_ref().map(|h| h.listen.clone()));
    let server = match listen {
        Some(addr) => {
            let listener = TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Не удалось открыть {addr}"))?;
            info!(%addr, "HTTP API запущен");
            let router = create_router(AppState {
                devices: Arc::new(devices.clone()),
                executor: executor.clone(),
                connection: settings.connection.clone(),
            });
            let token = shutdown.clone();
            Some(tokio::spawn(async move {
                axum::serve(listener, router)
                    .with_graceful_shutdown(token.cancelled_owned())
                    .await
            }))
        }
        None => None,
    };

    tokio::signal::ctrl_c()
        .await
        .context("Не удалось дождаться Ctrl-C")?;
    info!("Остановка");

    shutdown.cancel();
    for device in devices.values() {
        device.coordinator.stop();
    }
    for device in devices.values() {
        device.coordinator.join().await;
    }
    executor.shutdown();

    if let Some(server) = server {
        server.await?.context("HTTP API завершился с ошибкой")?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Один раунд по каждому устройству, снимки в stdout
async fn poll_devices(config: &AppConfig, device: Option<&str>) -> Result<ExitCode> {
    let executor = BlockingExecutor::new(config.settings.connection.workers);
    let mut failed = false;

    for profile in select(config, device)? {
        let connection = profile.connection(&config.settings.connection)?;
        match setup::test_connection(&connection, &executor, config.settings.connection.round_timeout()).await {
            Ok(snapshot) => {
                let json = JsonFormatter::format_snapshot(&profile.name, &snapshot);
                println!("{}", JsonFormatter::to_json_string(&json)?);
            }
            Err(failure) => {
                error!(device = %profile.name, kind = %failure.kind(), "{failure}");
                failed = true;
            }
        }
    }

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

/// Проверка подключения с понятным сообщением на каждое устройство
async fn test_connections(config: &AppConfig, device: Option<&str>) -> Result<ExitCode> {
    let executor = BlockingExecutor::new(config.settings.connection.workers);
    let mut failed = false;

    for profile in select(config, device)? {
        let connection = profile.connection(&config.settings.connection)?;
        match setup::test_connection(&connection, &executor, config.settings.connection.round_timeout()).await {
            Ok(snapshot) => {
                let identity = DeviceIdentity::from_snapshot(&snapshot);
                println!(
                    "{}: OK, {} ({}, серийный номер {})",
                    profile.name,
                    identity.display_name(),
                    connection.version(),
                    identity.serial.as_deref().unwrap_or("неизвестен"),
                );
                if let Some(partial) = snapshot.partial_decode() {
                    println!("{}: {partial}", profile.name);
                }
            }
            Err(failure) => {
                println!("{}: ОШИБКА [{}] {failure}", profile.name, failure.kind());
                failed = true;
            }
        }
    }

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
