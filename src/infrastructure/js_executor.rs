//! JS 执行器 - 基础设施层
//!
//! 持有当前页面，只暴露"执行 JS"和"检查元素状态"的能力

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::AppResult;

/// 元素状态检查
#[derive(Debug, Clone, Copy)]
pub enum DomProbe<'a> {
    /// 元素可见（有尺寸、未隐藏、不透明）
    Visible,
    /// 元素可见且未被禁用
    Clickable,
    /// 元素可见且文本包含指定内容
    ContainsText(&'a str),
}

/// JS 执行器
///
/// 职责：
/// - 持有当前文件使用的 Page
/// - 暴露 eval() / probe() 能力
/// - 不认识上传流程
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 取回 page（用于关闭页面）
    pub fn into_page(self) -> Page {
        self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> AppResult<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> AppResult<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 检查元素当前状态
    ///
    /// # 参数
    /// - `selector`: CSS 选择器
    /// - `probe`: 要检查的状态
    pub async fn probe(&self, selector: &str, probe: DomProbe<'_>) -> AppResult<bool> {
        let js_code = probe_script(selector, probe)?;
        self.eval_as::<bool>(js_code).await
    }

    /// 页面是否加载完成
    pub async fn is_ready(&self) -> AppResult<bool> {
        let state: String = self.eval_as("document.readyState").await?;
        Ok(state == "complete")
    }
}

/// 生成元素状态检查脚本
fn probe_script(selector: &str, probe: DomProbe<'_>) -> AppResult<String> {
    let condition = match probe {
        DomProbe::Visible => "visible".to_string(),
        DomProbe::Clickable => "visible && !el.disabled".to_string(),
        DomProbe::ContainsText(text) => format!(
            "visible && (el.innerText || el.textContent || '').includes({})",
            serde_json::to_string(text)?
        ),
    };

    Ok(format!(
        r#"
        (() => {{
            const el = document.querySelector({});
            if (!el) return false;
            const style = window.getComputedStyle(el);
            const rect = el.getBoundingClientRect();
            const visible = style.display !== 'none'
                && style.visibility !== 'hidden'
                && parseFloat(style.opacity || '1') > 0
                && rect.width > 0
                && rect.height > 0;
            return Boolean({});
        }})()
        "#,
        serde_json::to_string(selector)?,
        condition
    ))
}
