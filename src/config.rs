//! 程序配置
//!
//! 叠加顺序：默认值 → TOML 配置文件 → 环境变量 → 命令行参数

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppResult, ConfigError};
use crate::models::BrowserKind;

/// 浏览器会话配置，整个运行期间不变
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// 浏览器种类
    pub browser: BrowserKind,
    /// 是否无界面运行
    pub headless: bool,
    /// 每个等待步骤的超时秒数
    pub timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            browser: BrowserKind::Chrome,
            headless: false,
            timeout_secs: 30,
        }
    }
}

impl SessionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 转换网站的页面约定
///
/// 选择器和文件名都绑定在目标网站当前的页面结构上，页面改版时只需修改这里
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    /// 转换页面地址
    pub url: String,
    /// 隐藏的文件上传控件
    pub file_input_selector: String,
    /// 上传确认提示文字
    pub loading_text: String,
    /// 上传确认提示所在元素
    pub loading_selector: String,
    /// "开始转换"按钮
    pub start_button_selector: String,
    /// 结果下载链接
    pub result_link_selector: String,
    /// 网站生成的压缩包名称
    ///
    /// 留空时不检查名称，取点击下载后最新完成的文件
    pub archive_name: String,
    /// 等待结果时超时时间的倍数
    pub result_timeout_factor: u32,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            url: "https://www.i2pdf.com/pdf-to-text".to_string(),
            file_input_selector: "input.dz-hidden-input".to_string(),
            loading_text: "Loading Files, Please Wait ...".to_string(),
            loading_selector: "div.font-size-1.mb-3".to_string(),
            start_button_selector: "button.pdf_to_text".to_string(),
            result_link_selector:
                "a.btn.btn-primary.btn-lg.font-size-2.px-8.shadow-soft.text-center.text-left"
                    .to_string(),
            archive_name: "pdf2text.zip".to_string(),
            result_timeout_factor: 3,
        }
    }
}

impl SiteProfile {
    /// 让隐藏的上传控件可见、可交互的脚本
    pub fn reveal_input_script(&self) -> AppResult<String> {
        Ok(format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                if (el) {{
                    el.style.height = '100px';
                    el.style.width = '300px';
                    el.style.visibility = 'visible';
                    el.style.display = 'block';
                    el.style.position = 'fixed';
                    el.style.top = '100px';
                    el.style.left = '100px';
                    el.style.opacity = 1;
                    el.style.zIndex = 9999;
                }}
                return !!el;
            }})()
            "#,
            serde_json::to_string(&self.file_input_selector)?
        ))
    }

    /// 需要确认的压缩包名称，未配置时返回 None
    pub fn expected_archive(&self) -> Option<&str> {
        let name = self.archive_name.trim();
        (!name.is_empty()).then_some(name)
    }

    /// 等待转换结果的超时时间
    pub fn result_timeout(&self, base: Duration) -> Duration {
        base * self.result_timeout_factor.max(1)
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    pub session: SessionConfig,
    /// 下载目录
    pub downloads_dir: PathBuf,
    /// 是否把下载结果重命名为原文件名
    pub rename_downloads: bool,
    /// 显式指定的浏览器可执行文件
    pub browser_executable: Option<PathBuf>,
    /// 日志文件
    pub log_file: PathBuf,
    /// 是否显示调试日志
    pub verbose_logging: bool,
    pub site: SiteProfile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            downloads_dir: PathBuf::from("results"),
            rename_downloads: true,
            browser_executable: None,
            log_file: PathBuf::from("log.log"),
            verbose_logging: false,
            site: SiteProfile::default(),
        }
    }
}

/// TOML 配置文件的内容，所有字段可选
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub browser: Option<BrowserKind>,
    pub headless: Option<bool>,
    pub timeout: Option<u64>,
    pub downloads_dir: Option<PathBuf>,
    pub rename_downloads: Option<bool>,
    pub browser_path: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub site: Option<SiteProfile>,
}

impl Config {
    /// 读取 TOML 配置文件并覆盖到当前配置上
    pub fn merge_file(mut self, path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::AppError::file_read_failed(path, e))?;
        let file: FileConfig =
            toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
                path: path.to_path_buf(),
                source,
            })?;
        self.apply_file(file);
        Ok(self)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(browser) = file.browser {
            self.session.browser = browser;
        }
        if let Some(headless) = file.headless {
            self.session.headless = headless;
        }
        if let Some(timeout) = file.timeout {
            self.session.timeout_secs = timeout;
        }
        if let Some(dir) = file.downloads_dir {
            self.downloads_dir = dir;
        }
        if let Some(rename) = file.rename_downloads {
            self.rename_downloads = rename;
        }
        if let Some(path) = file.browser_path {
            self.browser_executable = Some(path);
        }
        if let Some(path) = file.log_file {
            self.log_file = path;
        }
        if let Some(site) = file.site {
            self.site = site;
        }
    }

    /// 用环境变量覆盖当前配置
    pub fn merge_env(self) -> AppResult<Self> {
        self.merge_vars(|name| std::env::var(name).ok())
    }

    fn merge_vars(mut self, var: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        if let Some(value) = var("PERSIAN_OCR_BROWSER") {
            self.session.browser =
                value
                    .parse()
                    .map_err(|_| ConfigError::EnvVarParseFailed {
                        var_name: "PERSIAN_OCR_BROWSER".to_string(),
                        value: value.clone(),
                        expected_type: "chrome|firefox|edge|safari".to_string(),
                    })?;
        }
        if let Some(value) = var("PERSIAN_OCR_HEADLESS") {
            self.session.headless = parse_var("PERSIAN_OCR_HEADLESS", &value, "bool")?;
        }
        if let Some(value) = var("PERSIAN_OCR_TIMEOUT") {
            self.session.timeout_secs = parse_var("PERSIAN_OCR_TIMEOUT", &value, "u64")?;
        }
        if let Some(value) = var("PERSIAN_OCR_DOWNLOADS") {
            self.downloads_dir = PathBuf::from(value);
        }
        if let Some(value) = var("PERSIAN_OCR_BROWSER_PATH") {
            self.browser_executable = Some(PathBuf::from(value));
        }
        if let Some(value) = var("PERSIAN_OCR_LOG_FILE") {
            self.log_file = PathBuf::from(value);
        }
        Ok(self)
    }

    /// 检查配置是否合法
    pub fn validate(&self) -> AppResult<()> {
        if self.session.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout".to_string(),
                reason: "超时时间必须大于 0 秒".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(var_name: &str, value: &str, expected: &str) -> AppResult<T> {
    value.trim().parse().map_err(|_| {
        ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.to_string(),
            expected_type: expected.to_string(),
        }
        .into()
    })
}
