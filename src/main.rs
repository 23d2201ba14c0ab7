//! # School Portal 主程序
//!
//! `serve`（默认）执行迁移后启动 HTTP 服务；`migrate` 仅执行迁移；
//! `create-superuser` 从环境变量创建超级用户。

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use school_portal::{
    auth::SessionStore,
    commands::{self, SuperuserOutcome},
    config::ConfigManager,
    database, lerror, linfo,
    logging::{self, LogComponent, LogStage},
    lwarn,
    web::{self, AppState},
};

#[derive(Parser, Debug)]
#[command(name = "school-portal", version, about = "School management portal", long_about = None)]
struct Cli {
    /// 配置文件路径（默认 `config/config.{RUST_ENV}.toml`）
    #[arg(short, long, env = "SCHOOL_PORTAL_CONFIG_PATH")]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// 执行迁移并启动服务
    Serve,
    /// 仅执行数据库迁移
    Migrate,
    /// 从 SUPERUSER_EMAIL / SUPERUSER_PASSWORD 创建超级用户
    CreateSuperuser,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let manager = match &cli.config {
        Some(path) => ConfigManager::from_file(path),
        None => ConfigManager::new(),
    };
    let manager = match manager {
        Ok(manager) => manager,
        Err(e) => {
            logging::init_logging(None);
            lerror!(
                "system",
                LogStage::Startup,
                LogComponent::Config,
                "config_load_failed",
                &format!("配置加载失败: {e}")
            );
            return ExitCode::FAILURE;
        }
    };
    let config = manager.config();
    logging::init_logging(Some(&config.logging.level));

    let command = cli.command.unwrap_or(Command::Serve);
    match run(command, config).await {
        Ok(code) => code,
        Err(e) => {
            lerror!(
                "system",
                LogStage::Startup,
                LogComponent::Main,
                "command_failed",
                &format!("{e:#}")
            );
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: std::sync::Arc<school_portal::AppConfig>) -> anyhow::Result<ExitCode> {
    let db = database::init_database(&config.database).await?;

    match command {
        Command::Serve => {
            database::run_migrations(&db).await?;
            let purged = SessionStore::new(&db).purge_expired().await?;
            linfo!(
                "system",
                LogStage::Startup,
                LogComponent::Session,
                "sessions_purged",
                "过期会话已清理",
                purged = purged
            );
            linfo!(
                "system",
                LogStage::Startup,
                LogComponent::Main,
                "service_starting",
                "服务启动",
                bind = %config.bind_address()
            );
            web::serve(AppState::new(db, config)).await?;
            linfo!(
                "system",
                LogStage::Shutdown,
                LogComponent::Main,
                "service_shutdown",
                "服务正常关闭"
            );
            Ok(ExitCode::SUCCESS)
        }
        Command::Migrate => {
            database::run_migrations(&db).await?;
            database::check_database_status(&db).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::CreateSuperuser => create_superuser(&db).await,
    }
}

async fn create_superuser(db: &sea_orm::DatabaseConnection) -> anyhow::Result<ExitCode> {
    let Ok((email, password)) = commands::superuser_credentials(|key| std::env::var(key).ok()) else {
        eprintln!("{}", commands::MSG_MISSING_ENV);
        return Ok(ExitCode::FAILURE);
    };

    match commands::create_superuser(db, &email, &password).await? {
        SuperuserOutcome::Created(user) => {
            linfo!(
                "system",
                LogStage::Startup,
                LogComponent::Command,
                "superuser_created",
                &format!("Superuser {} created successfully.", user.email)
            );
            println!("Superuser {} created successfully.", user.email);
        }
        SuperuserOutcome::AlreadyExists(email) => {
            lwarn!(
                "system",
                LogStage::Startup,
                LogComponent::Command,
                "superuser_exists",
                &format!("User with email {email} already exists.")
            );
            println!("User with email {email} already exists.");
        }
    }
    Ok(ExitCode::SUCCESS)
}
