//! 基于 chromiumoxide 的浏览器驱动
//!
//! 第一次打开页面时才启动浏览器，整个运行期间只有一个浏览器进程，每个文件使用一个新页面

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::Browser;
use serde_json::Value as JsonValue;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::browser;
use crate::config::{Config, SessionConfig};
use crate::error::{AppError, AppResult, BrowserError};
use crate::infrastructure::driver::BrowserDriver;
use crate::infrastructure::js_executor::{DomProbe, JsExecutor};
use crate::utils::wait::poll_until;

/// 已启动的浏览器
struct CdpSession {
    browser: Browser,
    handler: JoinHandle<()>,
    executor: Option<JsExecutor>,
}

/// Chromium 系浏览器驱动
pub struct CdpDriver {
    session_config: SessionConfig,
    executable: Option<PathBuf>,
    downloads_path: PathBuf,
    session: Option<CdpSession>,
}

impl CdpDriver {
    pub fn new(config: &Config) -> Self {
        Self {
            session_config: config.session.clone(),
            executable: config.browser_executable.clone(),
            downloads_path: config.downloads_dir.clone(),
            session: None,
        }
    }

    /// 浏览器是否已经启动
    pub fn is_launched(&self) -> bool {
        self.session.is_some()
    }

    async fn ensure_session(&mut self) -> AppResult<&mut CdpSession> {
        if self.session.is_none() {
            let (browser, handler) =
                browser::launch_browser(&self.session_config, self.executable.as_deref()).await?;
            browser::allow_downloads(&browser, &self.downloads_path).await?;
            self.session = Some(CdpSession {
                browser,
                handler,
                executor: None,
            });
        }
        self.session
            .as_mut()
            .ok_or_else(|| BrowserError::NoActivePage.into())
    }

    fn executor(&self) -> AppResult<&JsExecutor> {
        self.session
            .as_ref()
            .and_then(|s| s.executor.as_ref())
            .ok_or_else(|| BrowserError::NoActivePage.into())
    }

    async fn wait_for_probe(
        &self,
        what: String,
        selector: &str,
        probe: DomProbe<'_>,
        timeout: Duration,
    ) -> AppResult<()> {
        let executor = self.executor()?;
        debug!("{}", what);
        poll_until(&what, timeout, move || async move {
            Ok(executor.probe(selector, probe).await?.then_some(()))
        })
        .await
    }
}

#[async_trait]
impl BrowserDriver for CdpDriver {
    async fn open(&mut self, url: &str) -> AppResult<()> {
        let session = self.ensure_session().await?;

        if let Some(previous) = session.executor.take() {
            if let Err(e) = previous.into_page().close().await {
                warn!("关闭上一个页面失败: {}", e);
            }
        }

        let page = session.browser.new_page(url).await.map_err(|e| {
            warn!("打开页面失败 {}: {}", url, e);
            AppError::from(e)
        })?;
        session.executor = Some(JsExecutor::new(page));
        info!("已导航到: {}", url);
        Ok(())
    }

    async fn wait_for_ready_state(&mut self, timeout: Duration) -> AppResult<()> {
        let executor = self.executor()?;
        poll_until("等待页面加载完成", timeout, move || async move {
            Ok(executor.is_ready().await?.then_some(()))
        })
        .await
    }

    async fn is_element_visible(&mut self, selector: &str) -> AppResult<bool> {
        self.executor()?.probe(selector, DomProbe::Visible).await
    }

    async fn execute_script(&mut self, script: &str) -> AppResult<JsonValue> {
        self.executor()?.eval(script).await
    }

    async fn wait_for_element_visible(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> AppResult<()> {
        self.wait_for_probe(
            format!("等待元素可见: {}", selector),
            selector,
            DomProbe::Visible,
            timeout,
        )
        .await
    }

    async fn choose_file(&mut self, selector: &str, path: &Path) -> AppResult<()> {
        let executor = self.executor()?;
        let element = executor
            .page()
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::ElementNotFound {
                selector: selector.to_string(),
            })?;

        let absolute = std::path::absolute(path)
            .map_err(|e| AppError::file_read_failed(path, e))?;
        let mut params =
            SetFileInputFilesParams::new(vec![absolute.to_string_lossy().to_string()]);
        params.object_id = Some(element.remote_object_id.clone());
        executor.page().execute(params).await?;
        debug!("已选择文件: {}", absolute.display());
        Ok(())
    }

    async fn wait_for_text(
        &mut self,
        text: &str,
        selector: &str,
        timeout: Duration,
    ) -> AppResult<()> {
        self.wait_for_probe(
            format!("等待文字 '{}' 出现在 {}", text, selector),
            selector,
            DomProbe::ContainsText(text),
            timeout,
        )
        .await
    }

    async fn wait_for_element_clickable(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> AppResult<()> {
        self.wait_for_probe(
            format!("等待元素可点击: {}", selector),
            selector,
            DomProbe::Clickable,
            timeout,
        )
        .await
    }

    async fn click(&mut self, selector: &str) -> AppResult<()> {
        let executor = self.executor()?;
        let element = executor
            .page()
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::ElementNotFound {
                selector: selector.to_string(),
            })?;
        element.click().await?;
        debug!("已点击: {}", selector);
        Ok(())
    }

    fn downloads_path(&self) -> &Path {
        &self.downloads_path
    }

    async fn set_downloads_path(&mut self, path: &Path) -> AppResult<()> {
        self.downloads_path = std::path::absolute(path)
            .map_err(|e| AppError::file_read_failed(path, e))?;
        if let Some(session) = self.session.as_ref() {
            browser::allow_downloads(&session.browser, &self.downloads_path).await?;
        }
        Ok(())
    }

    async fn close(&mut self) -> AppResult<()> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };

        if let Some(executor) = session.executor.take() {
            if let Err(e) = executor.into_page().close().await {
                debug!("关闭页面失败: {}", e);
            }
        }
        session.browser.close().await?;
        if let Err(e) = session.browser.wait().await {
            warn!("等待浏览器退出失败: {}", e);
        }
        session.handler.abort();
        info!("🛑 浏览器已关闭");
        Ok(())
    }
}
