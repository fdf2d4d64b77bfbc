//! # Persian OCR
//!
//! 把 PDF 上传到在线转换网站，等待转换完成后下载文本压缩包
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有浏览器资源，只暴露能力
//! - `BrowserDriver` - 上传流程使用的浏览器接口
//! - `CdpDriver` - 基于 chromiumoxide 的实现
//! - `JsExecutor` - 当前页面的 owner，提供 eval() / probe() 能力
//!
//! ### ② 业务能力层（Services）
//! - `SourceResolver` - 检查输入来源，列出待上传的 PDF
//! - `DownloadStore` - 确认下载结果，重命名为原文件名
//!
//! ### ③ 流程层（Workflow）
//! - `UploadCtx` - 上下文封装（文件路径 + 序号）
//! - `UploadFlow` - 单个文件的流程（打开 → 上传 → 转换 → 下载 → 重命名）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/upload_orchestrator` - 顺序处理所有文件，超时的文件单独放弃
//! - `orchestrator/app` - 组装配置和驱动，输出统计
//!
//! ## 模块结构

pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, SessionConfig, SiteProfile};
pub use error::{AppError, AppResult};
pub use infrastructure::{BrowserDriver, CdpDriver, JsExecutor};
pub use models::{BatchReport, BrowserKind, SourceSpec, UploadOutcome, UploadStage};
pub use orchestrator::{App, UploadOrchestrator};
pub use services::{DownloadStore, SourceResolver};
pub use workflow::{UploadCtx, UploadFlow};
