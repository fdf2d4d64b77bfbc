//! 单个文件的处理阶段与结果

use std::fmt;
use std::path::{Path, PathBuf};

/// 单个文件的处理阶段
///
/// 只会向前推进，不会回退；任意等待阶段超时后转入 `Abandoned`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UploadStage {
    Idle,
    Navigated,
    InputVisible,
    FileChosen,
    UploadConfirmed,
    ConversionStarted,
    ResultReady,
    Downloaded,
    Renamed,
    Abandoned,
}

impl UploadStage {
    /// 日志中显示的描述
    pub fn label(self) -> &'static str {
        match self {
            UploadStage::Idle => "等待开始",
            UploadStage::Navigated => "页面已打开",
            UploadStage::InputVisible => "上传控件可见",
            UploadStage::FileChosen => "文件已选择",
            UploadStage::UploadConfirmed => "上传已确认",
            UploadStage::ConversionStarted => "转换已开始",
            UploadStage::ResultReady => "结果已就绪",
            UploadStage::Downloaded => "已下载",
            UploadStage::Renamed => "已重命名",
            UploadStage::Abandoned => "已放弃",
        }
    }
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 单个文件的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// 成功下载
    Downloaded {
        /// 原始输入文件
        source: PathBuf,
        /// 下载目录中的最终文件名
        file_name: String,
        /// 下载目录中的最终路径
        path: PathBuf,
    },
    /// 超时放弃
    Abandoned {
        source: PathBuf,
        /// 超时发生时所处的阶段
        stage: UploadStage,
    },
}

impl UploadOutcome {
    pub fn source(&self) -> &Path {
        match self {
            UploadOutcome::Downloaded { source, .. } | UploadOutcome::Abandoned { source, .. } => {
                source
            }
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        match self {
            UploadOutcome::Downloaded { file_name, .. } => Some(file_name),
            UploadOutcome::Abandoned { .. } => None,
        }
    }

    pub fn is_downloaded(&self) -> bool {
        matches!(self, UploadOutcome::Downloaded { .. })
    }
}

/// 一次运行的全部结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<UploadOutcome>,
}

impl BatchReport {
    pub fn push(&mut self, outcome: UploadOutcome) {
        self.outcomes.push(outcome);
    }

    /// 按处理顺序返回成功下载的文件名
    pub fn downloaded_names(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(|o| o.file_name().map(str::to_string))
            .collect()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_downloaded()).count()
    }

    pub fn abandoned(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}
