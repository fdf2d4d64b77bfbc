//! 命令行参数

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use crate::config::Config;
use crate::error::AppResult;
use crate::models::{BrowserKind, SourceSpec};

const AFTER_HELP: &str = r#"示例:
  persian_ocr --file my.pdf --browser chrome --timeout 30
  persian_ocr --dir ./input --headless
  persian_ocr --file sample.pdf --browser edge --downloads ./out
"#;

/// 自动上传 PDF 到在线转换网站并下载文本结果
#[derive(Debug, Parser)]
#[command(name = "persian_ocr", version, after_help = AFTER_HELP)]
#[command(group(ArgGroup::new("source").required(true).args(["file", "dir"])))]
pub struct Cli {
    /// 要上传的单个 PDF 文件
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// 包含多个 PDF 文件的目录
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// 使用的浏览器 [默认: chrome]
    #[arg(long, value_enum)]
    pub browser: Option<BrowserKind>,

    /// 以无头模式（不显示窗口）运行浏览器
    #[arg(long)]
    pub headless: bool,

    /// 每个等待步骤的最长时间（秒），等待转换结果时为三倍 [默认: 30]
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// 下载目录 [默认: results]
    #[arg(long, value_name = "DIR")]
    pub downloads: Option<PathBuf>,

    /// 保留网站生成的文件名，不重命名为原文件名
    #[arg(long)]
    pub keep_download_name: bool,

    /// 浏览器可执行文件路径
    #[arg(long, value_name = "PATH")]
    pub browser_path: Option<PathBuf>,

    /// TOML 配置文件
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// 日志文件 [默认: log.log]
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// 输入来源
    pub fn source(&self) -> SourceSpec {
        SourceSpec::new(self.file.clone(), self.dir.clone())
    }

    /// 叠加默认值、配置文件、环境变量和命令行参数
    pub fn load_config(&self) -> AppResult<Config> {
        let mut config = Config::default();
        if let Some(path) = &self.config {
            config = config.merge_file(path)?;
        }
        let config = config.merge_env()?;
        Ok(self.apply(config))
    }

    fn apply(&self, mut config: Config) -> Config {
        if let Some(browser) = self.browser {
            config.session.browser = browser;
        }
        if self.headless {
            config.session.headless = true;
        }
        if let Some(timeout) = self.timeout {
            config.session.timeout_secs = timeout;
        }
        if let Some(dir) = &self.downloads {
            config.downloads_dir = dir.clone();
        }
        if self.keep_download_name {
            config.rename_downloads = false;
        }
        if let Some(path) = &self.browser_path {
            config.browser_executable = Some(path.clone());
        }
        if let Some(path) = &self.log_file {
            config.log_file = path.clone();
        }
        if self.verbose {
            config.verbose_logging = true;
        }
        config
    }
}
