//! 浏览器驱动接口 - 基础设施层
//!
//! 上传流程只通过这个接口操作浏览器，不直接接触 chromiumoxide

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::AppResult;

/// 浏览器驱动能力
///
/// 所有 `wait_*` 方法在超过 `timeout` 后返回 `AppError::Timeout`，
/// 与"元素不存在"（`BrowserError::ElementNotFound`）区分开。
#[async_trait]
pub trait BrowserDriver: Send {
    /// 打开页面（每次调用都使用一个新的页面）
    async fn open(&mut self, url: &str) -> AppResult<()>;

    /// 等待 `document.readyState` 变为 `complete`
    async fn wait_for_ready_state(&mut self, timeout: Duration) -> AppResult<()>;

    /// 元素当前是否可见
    async fn is_element_visible(&mut self, selector: &str) -> AppResult<bool>;

    /// 在当前页面执行脚本
    async fn execute_script(&mut self, script: &str) -> AppResult<JsonValue>;

    async fn wait_for_element_visible(&mut self, selector: &str, timeout: Duration)
        -> AppResult<()>;

    /// 通过文件上传控件提交本地文件（等同于原生文件选择框）
    async fn choose_file(&mut self, selector: &str, path: &Path) -> AppResult<()>;

    async fn wait_for_text(
        &mut self,
        text: &str,
        selector: &str,
        timeout: Duration,
    ) -> AppResult<()>;

    async fn wait_for_element_clickable(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> AppResult<()>;

    async fn click(&mut self, selector: &str) -> AppResult<()>;

    /// 当前下载目录
    fn downloads_path(&self) -> &Path;

    /// 设置下载目录
    async fn set_downloads_path(&mut self, path: &Path) -> AppResult<()>;

    /// 释放浏览器资源
    async fn close(&mut self) -> AppResult<()>;
}
