//! 应用入口 - 编排层
//!
//! 组装配置、输入来源和浏览器驱动，运行一次批量上传

use tracing::info;

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::CdpDriver;
use crate::models::{BatchReport, SourceSpec};
use crate::orchestrator::UploadOrchestrator;
use crate::services::SourceResolver;
use crate::utils::logging;

/// 应用主结构
pub struct App {
    config: Config,
    source: SourceSpec,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config, source: SourceSpec) -> AppResult<Self> {
        config.validate()?;
        logging::log_startup(&config, &source);
        Ok(Self { config, source })
    }

    /// 运行应用主逻辑
    ///
    /// # 返回
    /// 返回每个文件的处理结果
    pub async fn run(self) -> AppResult<BatchReport> {
        let resolver = SourceResolver::new(self.source.clone());
        // 浏览器在第一次打开页面时才启动
        let driver = CdpDriver::new(&self.config);
        let mut orchestrator = UploadOrchestrator::new(resolver, driver, &self.config);

        info!("\n📁 正在检查输入来源...");
        let report = orchestrator.run_report().await?;

        logging::print_final_stats(&report, &self.config.log_file);
        Ok(report)
    }
}
