use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// 环境变量：显式指定配置文件路径。
pub const CONFIG_ENV: &str = "SHAPES_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub warehouse: WarehouseConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `SHAPES_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 形状数据文件位置，相对路径以工作目录为基准。
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "DataConfig::default_rectangles")]
    pub rectangles: PathBuf,
    #[serde(default = "DataConfig::default_cubes")]
    pub cubes: PathBuf,
}

impl DataConfig {
    fn default_rectangles() -> PathBuf {
        PathBuf::from("data").join("rectangles.txt")
    }

    fn default_cubes() -> PathBuf {
        PathBuf::from("data").join("cubes.txt")
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            rectangles: Self::default_rectangles(),
            cubes: Self::default_cubes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseConfig {
    /// 缓存统计中“最近写入”的时间窗口（秒）。
    #[serde(default = "WarehouseConfig::default_recency_window_secs")]
    pub recency_window_secs: u64,
}

impl WarehouseConfig {
    fn default_recency_window_secs() -> u64 {
        60
    }

    #[inline]
    pub fn recency_window(&self) -> Duration {
        Duration::from_secs(self.recency_window_secs)
    }
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            recency_window_secs: Self::default_recency_window_secs(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
