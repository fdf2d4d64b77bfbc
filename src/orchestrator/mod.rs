//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 组装配置、浏览器驱动和编排器
//! - 输出启动信息和全局统计
//!
//! ### `upload_orchestrator` - 批量上传编排器
//! - 检查输入来源，不合法时不启动浏览器
//! - 按顺序逐个处理文件（`Vec<PathBuf>`）
//! - 单个文件超时不影响其余文件
//! - 运行结束时关闭浏览器
//!
//! ## 层次关系
//!
//! ```text
//! app
//!     ↓
//! upload_orchestrator (处理 Vec<PathBuf>)
//!     ↓
//! workflow::UploadFlow (处理单个文件)
//!     ↓
//! services (能力层：source_resolver / download_store)
//!     ↓
//! infrastructure (基础设施：BrowserDriver / JsExecutor)
//! ```

pub mod app;
pub mod upload_orchestrator;

pub use app::App;
pub use upload_orchestrator::UploadOrchestrator;
