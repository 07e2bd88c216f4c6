use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_PATH;

/// Опрос ИБП APC по SNMP
#[derive(Debug, Parser)]
#[command(name = "apc-ups-snmp", version, about)]
pub struct Cli {
    /// Путь к YAML конфигурации
    #[arg(short, long, env = "APC_UPS_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Уровень логирования (директива EnvFilter)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Логи в JSON
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Периодический опрос всех устройств до Ctrl-C
    Run {
        /// Адрес HTTP API, перекрывает settings.http.listen
        #[arg(long)]
        listen: Option<String>,
    },
    /// Один раунд опроса, вывод снимков в JSON
    Poll {
        #[arg(long)]
        device: Option<String>,
    },
    /// Проверка учётных данных и доступности
    TestConnection {
        #[arg(long)]
        device: Option<String>,
    },
}
