use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::models::BrowserKind;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 等待超时（单个文件可恢复的唯一错误）
    #[error("等待超时: {what} (超过 {secs} 秒)")]
    Timeout { what: String, secs: u64 },
}

impl AppError {
    /// 创建超时错误
    pub fn timeout(what: impl Into<String>, timeout: Duration) -> Self {
        AppError::Timeout {
            what: what.into(),
            secs: timeout.as_secs(),
        }
    }

    /// 是否为等待超时
    ///
    /// 编排层只对超时做"放弃当前文件、继续下一个"的处理，其余错误一律向上传播
    pub fn is_timeout(&self) -> bool {
        matches!(self, AppError::Timeout { .. })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 启动浏览器失败
    #[error("启动浏览器失败 ({browser}): {reason}")]
    LaunchFailed { browser: BrowserKind, reason: String },
    /// 浏览器配置失败
    #[error("浏览器配置失败: {0}")]
    ConfigurationFailed(String),
    /// 当前驱动不支持该浏览器
    #[error("不支持的浏览器: {0} (仅支持基于 Chromium 的浏览器: chrome / edge)")]
    Unsupported(BrowserKind),
    /// 未找到浏览器可执行文件
    #[error("未找到 {0} 的可执行文件，请通过 --browser-path 指定")]
    ExecutableNotFound(BrowserKind),
    /// 尚未打开页面
    #[error("尚未打开任何页面")]
    NoActivePage,
    /// 页面中不存在该元素
    #[error("未找到元素: {selector}")]
    ElementNotFound { selector: String },
    /// CDP 协议错误
    #[error("CDP 调用失败: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
    /// 脚本返回值无法解析
    #[error("脚本返回值解析失败: {0}")]
    ScriptResult(#[from] serde_json::Error),
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件或目录失败
    #[error("读取失败 ({}): {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 写入、重命名或创建失败
    #[error("写入失败 ({}): {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// IO 错误（无路径信息）
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件解析失败
    #[error("配置文件解析失败 ({}): {source}", .path.display())]
    TomlParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// 配置值不合法
    #[error("配置值不合法 ({field}): {reason}")]
    InvalidValue { field: String, reason: String },
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::Cdp(err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Browser(BrowserError::ScriptResult(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::Io(err))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
