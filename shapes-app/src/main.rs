use std::io;
use std::path::PathBuf;

use clap::Parser;
use shapes_config::{AppConfig, ConfigError};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

mod report;

use report::RunOptions;

#[derive(Debug, Parser)]
#[command(name = "shapes-app")]
#[command(about = "加载矩形与立方体数据，输出几何分析与查询结果")]
struct Cli {
    /// 配置文件路径，缺省时按 SHAPES_CONFIG 或 ./config/default.toml 查找
    #[arg(long)]
    config: Option<PathBuf>,

    /// 矩形数据文件，覆盖配置中的 data.rectangles
    #[arg(long)]
    rectangles: Option<PathBuf>,

    /// 立方体数据文件，覆盖配置中的 data.cubes
    #[arg(long)]
    cubes: Option<PathBuf>,

    /// 象限查询使用的象限（1-4）
    #[arg(long, default_value_t = 1)]
    quadrant: i32,
}

fn main() {
    let cli = Cli::parse();
    let config = load_configuration(cli.config.clone());
    init_logging(&config);
    info!("启动形状分析");

    let options = RunOptions {
        rectangles: cli.rectangles.unwrap_or(config.data.rectangles),
        cubes: cli.cubes.unwrap_or(config.data.cubes),
        quadrant: cli.quadrant,
        recency_window: config.warehouse.recency_window(),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(err) = report::run(&options, &mut out) {
        error!(error = %format!("{err:#}"), "形状分析失败");
        eprintln!("错误：{err:#}");
        std::process::exit(1);
    }
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

/// 日志写到 stderr，stdout 只留给报告。
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
