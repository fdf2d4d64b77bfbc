use std::path::{Path, PathBuf};
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::config::SessionConfig;
use crate::error::{AppResult, BrowserError};
use crate::models::BrowserKind;

/// 启动浏览器
///
/// # 参数
/// - `session`: 浏览器种类、无头模式、超时
/// - `executable`: 显式指定的可执行文件（为空时按浏览器种类查找）
///
/// # 返回
/// 返回浏览器和后台事件处理任务
pub async fn launch_browser(
    session: &SessionConfig,
    executable: Option<&Path>,
) -> AppResult<(Browser, JoinHandle<()>)> {
    let kind = session.browser;
    if !kind.speaks_cdp() {
        error!("不支持的浏览器: {}", kind);
        return Err(BrowserError::Unsupported(kind).into());
    }

    info!(
        "🚀 启动浏览器: {} (无头模式: {})",
        kind,
        if session.headless { "ON" } else { "OFF" }
    );

    let mut builder = BrowserConfig::builder();
    builder = if session.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(path) = resolve_executable(kind, executable)? {
        debug!("浏览器可执行文件: {}", path.display());
        builder = builder.chrome_executable(path);
    }

    let config = builder
        .request_timeout(session.timeout().max(Duration::from_secs(30)))
        .args(vec![
            "--disable-gpu",
            "--no-sandbox",
            "--disable-dev-shm-usage",
        ])
        .build()
        .map_err(|e| {
            error!("配置浏览器失败: {}", e);
            BrowserError::ConfigurationFailed(e)
        })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        BrowserError::LaunchFailed {
            browser: kind,
            reason: e.to_string(),
        }
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    let handle = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 等待浏览器状态同步
    sleep(Duration::from_millis(300)).await;

    Ok((browser, handle))
}

/// 允许下载并把文件保存到 `dir`
pub async fn allow_downloads(browser: &Browser, dir: &Path) -> AppResult<()> {
    let mut params = SetDownloadBehaviorParams::new(SetDownloadBehaviorBehavior::Allow);
    params.download_path = Some(dir.to_string_lossy().to_string());
    browser.execute(params).await?;
    debug!("下载目录已设置: {}", dir.display());
    Ok(())
}

/// 确定浏览器可执行文件
///
/// 显式路径优先；Chrome 交给 chromiumoxide 自动探测
fn resolve_executable(kind: BrowserKind, explicit: Option<&Path>) -> AppResult<Option<PathBuf>> {
    if let Some(path) = explicit {
        return Ok(Some(path.to_path_buf()));
    }

    let candidates = kind.executable_candidates();
    if candidates.is_empty() {
        return Ok(None);
    }

    candidates
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .map(Some)
        .ok_or_else(|| BrowserError::ExecutableNotFound(kind).into())
}
