//! 文件上传流程 - 流程层
//!
//! 核心职责：定义"一个文件"的完整处理流程
//!
//! 流程顺序：
//! 1. 打开转换页面 → 等待加载完成
//! 2. 显示隐藏的上传控件 → 选择文件 → 等待上传确认
//! 3. 点击开始转换 → 等待结果 → 点击下载
//! 4. 确认压缩包已下载 → 重命名为原文件名（可选）
//!
//! 任意等待步骤超时都会放弃当前文件，其余错误向上传播

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::config::{Config, SiteProfile};
use crate::error::AppResult;
use crate::infrastructure::BrowserDriver;
use crate::models::{UploadOutcome, UploadStage};
use crate::services::DownloadStore;
use crate::workflow::upload_ctx::UploadCtx;

/// 文件上传流程
///
/// - 编排单个文件的完整处理流程
/// - 不持有浏览器，只通过 `BrowserDriver` 操作
/// - 每个文件的阶段互相独立
pub struct UploadFlow {
    site: SiteProfile,
    timeout: Duration,
    rename_downloads: bool,
}

impl UploadFlow {
    pub fn new(config: &Config) -> Self {
        Self {
            site: config.site.clone(),
            timeout: config.session.timeout(),
            rename_downloads: config.rename_downloads,
        }
    }

    pub async fn run<D: BrowserDriver + ?Sized>(
        &self,
        driver: &mut D,
        store: &mut DownloadStore,
        ctx: &UploadCtx,
    ) -> AppResult<UploadOutcome> {
        let mut stage = UploadStage::Idle;

        match self.drive(driver, store, ctx, &mut stage).await {
            Ok(path) => {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                info!("{} ✅ 处理完成: {}", ctx, file_name);
                Ok(UploadOutcome::Downloaded {
                    source: ctx.path.clone(),
                    file_name,
                    path,
                })
            }
            Err(e) if e.is_timeout() => {
                error!(
                    "{} ❌ 部分步骤未能在 {} 秒内完成 (阶段: {}): {}",
                    ctx,
                    self.timeout.as_secs(),
                    stage,
                    e
                );
                Ok(UploadOutcome::Abandoned {
                    source: ctx.path.clone(),
                    stage,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// 依次执行各个步骤，`stage` 记录最后完成的阶段
    async fn drive<D: BrowserDriver + ?Sized>(
        &self,
        driver: &mut D,
        store: &mut DownloadStore,
        ctx: &UploadCtx,
        stage: &mut UploadStage,
    ) -> AppResult<PathBuf> {
        let site = &self.site;

        // ========== 1. 打开页面 ==========
        driver.open(&site.url).await?;
        driver.wait_for_ready_state(self.timeout).await?;
        *stage = UploadStage::Navigated;

        // ========== 2. 上传控件 ==========
        // 网站用 dropzone 隐藏了原生 input，需要先让它可见
        if !driver.is_element_visible(&site.file_input_selector).await? {
            debug!("{} 上传控件不可见，执行显示脚本", ctx);
            driver
                .execute_script(&site.reveal_input_script()?)
                .await?;
        }
        driver
            .wait_for_element_visible(&site.file_input_selector, self.timeout)
            .await?;
        *stage = UploadStage::InputVisible;

        driver
            .choose_file(&site.file_input_selector, ctx.path())
            .await?;
        *stage = UploadStage::FileChosen;
        info!("{} 📤 正在上传: {}", ctx, ctx.path.display());

        driver
            .wait_for_text(&site.loading_text, &site.loading_selector, self.timeout)
            .await?;
        *stage = UploadStage::UploadConfirmed;
        info!("{} ✓ 上传成功", ctx);

        // ========== 3. 转换 ==========
        driver
            .wait_for_element_clickable(&site.start_button_selector, self.timeout)
            .await?;
        driver.click(&site.start_button_selector).await?;
        *stage = UploadStage::ConversionStarted;
        info!("{} ⏳ 等待转换完成...", ctx);

        driver
            .wait_for_element_clickable(
                &site.result_link_selector,
                site.result_timeout(self.timeout),
            )
            .await?;
        *stage = UploadStage::ResultReady;

        // ========== 4. 下载 ==========
        let before = store.snapshot()?;
        driver.click(&site.result_link_selector).await?;
        let downloaded = match site.expected_archive() {
            Some(archive_name) => {
                store
                    .wait_for_archive(archive_name, &before, self.timeout)
                    .await?
            }
            None => store.latest_download(&before, self.timeout).await?,
        };
        *stage = UploadStage::Downloaded;

        if !self.rename_downloads {
            return Ok(downloaded);
        }
        let renamed = store.rename_to_source(&downloaded, ctx.path())?;
        *stage = UploadStage::Renamed;
        Ok(renamed)
    }
}
