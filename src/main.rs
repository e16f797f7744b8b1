use std::path::PathBuf;

use action_script::utils::logging;
use action_script::{App, Config};
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};

/// 动作块脚本执行器
#[derive(Parser, Debug)]
#[command(name = "action-script", version, about)]
struct Cli {
    /// 配置文件（TOML）
    #[arg(long, global = true, env = "ACTION_SCRIPT_CONFIG")]
    config: Option<PathBuf>,

    /// 显示详细日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 执行一个脚本文件
    Run {
        script: PathBuf,
        /// 浏览器后端：Chrome / Edge / Firefox
        #[arg(short, long)]
        browser: Option<String>,
    },
    /// 打印脚本的执行顺序
    Plan { script: PathBuf },
    /// 移动某一步的块（按配置吸附）并保存
    Move {
        script: PathBuf,
        /// 执行序号，从 1 开始
        step: usize,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        dx: f64,
        #[arg(long, allow_hyphen_values = true)]
        dy: f64,
    },
    /// 管理和执行测试套件
    Suite {
        #[command(subcommand)]
        command: SuiteCommand,
    },
}

#[derive(Subcommand, Debug)]
enum SuiteCommand {
    /// 新建套件
    New { name: String, scripts: Vec<PathBuf> },
    /// 整体替换套件成员
    Edit {
        name: String,
        #[arg(required = true)]
        scripts: Vec<PathBuf>,
    },
    /// 显示套件成员
    Show { name: String },
    /// 执行套件（套件名或套件文件路径）
    Run {
        suite: String,
        #[arg(short, long)]
        browser: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let mut config = Config::load(cli.config.as_deref())?;
    config.verbose_logging |= cli.verbose;

    // 初始化日志
    logging::init(config.verbose_logging);

    let app = App::initialize(config)?;

    match cli.command {
        Command::Run { script, browser } => {
            let report = app.run_script(&script, browser.as_deref()).await?;
            if !report.is_completed() {
                error!("❌ 脚本中止");
                std::process::exit(1);
            }
        }
        Command::Plan { script } => {
            app.plan(&script).await?;
        }
        Command::Move {
            script,
            step,
            dx,
            dy,
        } => {
            app.move_step(&script, step, dx, dy).await?;
        }
        Command::Suite { command } => match command {
            SuiteCommand::New { name, scripts } => {
                app.suite_new(&name, &scripts).await?;
            }
            SuiteCommand::Edit { name, scripts } => {
                app.suite_edit(&name, &scripts).await?;
            }
            SuiteCommand::Show { name } => {
                app.suite_show(&name).await?;
            }
            SuiteCommand::Run { suite, browser } => {
                let report = app.suite_run(&suite, browser.as_deref()).await?;
                if report.aborted() > 0 {
                    std::process::exit(1);
                }
                info!("✅ 套件全部完成");
            }
        },
    }

    Ok(())
}
