use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use persian_ocr::error::BrowserError;
use persian_ocr::{
    AppError, AppResult, BrowserDriver, Config, SourceResolver, SourceSpec, UploadOrchestrator,
    UploadOutcome, UploadStage,
};
use serde_json::Value as JsonValue;
use tempfile::TempDir;

/// 网站实际返回的压缩包名称
const SITE_ARCHIVE: &str = "pdf2text.zip";

/// 假驱动在哪一步出问题
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    /// 上传确认超时
    UploadTimeout,
    /// 转换结果超时
    ResultTimeout,
    /// 浏览器崩溃
    Crash,
}

/// 记录调用并模拟网站行为的假驱动
///
/// 点击结果链接时向下载目录写入压缩包，和真实浏览器一样遇到同名文件时追加 `(N)`
struct FakeDriver {
    site: persian_ocr::SiteProfile,
    downloads: PathBuf,
    faults: HashMap<String, Fault>,
    navigations: usize,
    chosen: Vec<PathBuf>,
    current: Option<String>,
    closed: bool,
}

impl FakeDriver {
    fn new(config: &Config) -> Self {
        Self {
            site: config.site.clone(),
            downloads: config.downloads_dir.clone(),
            faults: HashMap::new(),
            navigations: 0,
            chosen: Vec::new(),
            current: None,
            closed: false,
        }
    }

    fn with_fault(mut self, file_name: &str, fault: Fault) -> Self {
        self.faults.insert(file_name.to_string(), fault);
        self
    }

    fn fault(&self) -> Option<Fault> {
        self.current
            .as_ref()
            .and_then(|name| self.faults.get(name))
            .copied()
    }

    fn timeout(what: &str, timeout: Duration) -> AppError {
        AppError::timeout(what, timeout)
    }

    fn write_archive(&self) -> AppResult<()> {
        let archive = Path::new(SITE_ARCHIVE);
        let stem = archive.file_stem().unwrap().to_string_lossy().to_string();
        let ext = archive.extension().unwrap().to_string_lossy().to_string();

        let mut target = self.downloads.join(SITE_ARCHIVE);
        let mut n = 1;
        while target.exists() {
            target = self.downloads.join(format!("{} ({}).{}", stem, n, ext));
            n += 1;
        }
        fs::write(target, b"PK")?;
        Ok(())
    }
}

#[async_trait]
impl BrowserDriver for FakeDriver {
    async fn open(&mut self, url: &str) -> AppResult<()> {
        assert_eq!(url, self.site.url);
        self.navigations += 1;
        self.current = None;
        Ok(())
    }

    async fn wait_for_ready_state(&mut self, _timeout: Duration) -> AppResult<()> {
        Ok(())
    }

    async fn is_element_visible(&mut self, _selector: &str) -> AppResult<bool> {
        Ok(false)
    }

    async fn execute_script(&mut self, _script: &str) -> AppResult<JsonValue> {
        Ok(JsonValue::Bool(true))
    }

    async fn wait_for_element_visible(
        &mut self,
        _selector: &str,
        _timeout: Duration,
    ) -> AppResult<()> {
        Ok(())
    }

    async fn choose_file(&mut self, selector: &str, path: &Path) -> AppResult<()> {
        assert_eq!(selector, self.site.file_input_selector);
        self.chosen.push(path.to_path_buf());
        self.current = path.file_name().map(|n| n.to_string_lossy().to_string());
        if self.fault() == Some(Fault::Crash) {
            return Err(BrowserError::NoActivePage.into());
        }
        Ok(())
    }

    async fn wait_for_text(
        &mut self,
        _text: &str,
        _selector: &str,
        timeout: Duration,
    ) -> AppResult<()> {
        match self.fault() {
            Some(Fault::UploadTimeout) => Err(Self::timeout("上传确认", timeout)),
            _ => Ok(()),
        }
    }

    async fn wait_for_element_clickable(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> AppResult<()> {
        if selector == self.site.result_link_selector {
            assert_eq!(timeout, self.site.result_timeout(Duration::from_secs(10)));
            if self.fault() == Some(Fault::ResultTimeout) {
                return Err(Self::timeout("转换结果", timeout));
            }
        }
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> AppResult<()> {
        if selector == self.site.result_link_selector {
            self.write_archive()?;
        }
        Ok(())
    }

    fn downloads_path(&self) -> &Path {
        &self.downloads
    }

    async fn set_downloads_path(&mut self, path: &Path) -> AppResult<()> {
        self.downloads = path.to_path_buf();
        Ok(())
    }

    async fn close(&mut self) -> AppResult<()> {
        self.closed = true;
        Ok(())
    }
}

/// 测试环境：输入目录 + 下载目录
struct Fixture {
    _root: TempDir,
    input: PathBuf,
    config: Config,
}

impl Fixture {
    fn new(files: &[&str]) -> Self {
        let root = TempDir::new().expect("无法创建临时目录");
        let input = root.path().join("in");
        fs::create_dir_all(&input).unwrap();
        for name in files {
            fs::write(input.join(name), b"%PDF-1.4").unwrap();
        }

        let mut config = Config::default();
        config.session.timeout_secs = 10;
        config.downloads_dir = root.path().join("results");

        Self {
            _root: root,
            input,
            config,
        }
    }

    fn orchestrator(
        &self,
        spec: SourceSpec,
        driver: FakeDriver,
    ) -> UploadOrchestrator<FakeDriver> {
        UploadOrchestrator::new(SourceResolver::new(spec), driver, &self.config)
    }

    fn file_names(paths: &[PathBuf]) -> Vec<String> {
        let mut names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}

/// 目录中有两个 PDF 和一个文本文件：只处理 PDF，结果按原文件名重命名
#[tokio::test]
async fn test_dir_end_to_end() {
    let fx = Fixture::new(&["x.pdf", "y.pdf", "notes.txt"]);
    let driver = FakeDriver::new(&fx.config);
    let mut orchestrator = fx.orchestrator(SourceSpec::from_dir(&fx.input), driver);

    let mut downloaded = orchestrator.run().await.unwrap();
    downloaded.sort();

    assert_eq!(downloaded, vec!["x.zip".to_string(), "y.zip".to_string()]);
    assert_eq!(
        Fixture::file_names(&orchestrator.driver().chosen),
        vec!["x.pdf", "y.pdf"]
    );
    assert_eq!(orchestrator.driver().navigations, 2);
    assert!(orchestrator.driver().closed);

    let results = fx.config.downloads_dir;
    assert!(results.join("x.zip").exists());
    assert!(results.join("y.zip").exists());
    assert!(!results.join("pdf2text.zip").exists());
}

/// 单个文件
#[tokio::test]
async fn test_single_file() {
    let fx = Fixture::new(&["a.pdf"]);
    let driver = FakeDriver::new(&fx.config);
    let mut orchestrator = fx.orchestrator(SourceSpec::from_file(fx.input.join("a.pdf")), driver);

    let downloaded = orchestrator.run().await.unwrap();

    assert_eq!(downloaded, vec!["a.zip".to_string()]);
    assert_eq!(orchestrator.driver().chosen, vec![fx.input.join("a.pdf")]);
}

/// 来源不合法时不打开任何页面
#[tokio::test]
async fn test_invalid_source_never_navigates() {
    let fx = Fixture::new(&["a.pdf"]);

    let specs = [
        SourceSpec::new(Some(fx.input.join("a.pdf")), Some(fx.input.clone())),
        SourceSpec::default(),
        SourceSpec::from_file(fx.input.join("missing.pdf")),
    ];

    for spec in specs {
        let driver = FakeDriver::new(&fx.config);
        let mut orchestrator = fx.orchestrator(spec, driver);

        let downloaded = orchestrator.run().await.unwrap();

        assert!(downloaded.is_empty());
        assert_eq!(orchestrator.driver().navigations, 0);
        assert!(orchestrator.driver().chosen.is_empty());
    }
}

/// 中间的文件超时，前后两个文件照常处理
#[tokio::test]
async fn test_timeout_is_isolated() {
    for fault in [Fault::UploadTimeout, Fault::ResultTimeout] {
        let fx = Fixture::new(&["a.pdf", "b.pdf", "c.pdf"]);
        let driver = FakeDriver::new(&fx.config).with_fault("b.pdf", fault);
        let mut orchestrator = fx.orchestrator(SourceSpec::from_dir(&fx.input), driver);

        let report = orchestrator.run_report().await.unwrap();

        assert_eq!(report.total(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(orchestrator.driver().navigations, 3);

        let mut names = report.downloaded_names();
        names.sort();
        assert_eq!(names, vec!["a.zip".to_string(), "c.zip".to_string()]);

        let abandoned = report
            .outcomes
            .iter()
            .find(|o| !o.is_downloaded())
            .unwrap();
        assert_eq!(abandoned.source(), fx.input.join("b.pdf"));
        let expected_stage = match fault {
            Fault::UploadTimeout => UploadStage::FileChosen,
            _ => UploadStage::ConversionStarted,
        };
        assert!(matches!(
            abandoned,
            UploadOutcome::Abandoned { stage, .. } if *stage == expected_stage
        ));
    }
}

/// 非超时错误终止整个批次，但仍然关闭浏览器
#[tokio::test]
async fn test_unexpected_error_aborts_batch() {
    let fx = Fixture::new(&["a.pdf"]);
    let driver = FakeDriver::new(&fx.config).with_fault("a.pdf", Fault::Crash);
    let mut orchestrator = fx.orchestrator(SourceSpec::from_dir(&fx.input), driver);

    let err = orchestrator.run().await.unwrap_err();

    assert!(!err.is_timeout());
    assert!(orchestrator.driver().closed);
}

/// 保留网站生成的文件名时，第二个压缩包按浏览器规则追加序号
#[tokio::test]
async fn test_keep_download_name() {
    let mut fx = Fixture::new(&["x.pdf", "y.pdf"]);
    fx.config.rename_downloads = false;
    let driver = FakeDriver::new(&fx.config);
    let mut orchestrator = fx.orchestrator(SourceSpec::from_dir(&fx.input), driver);

    let mut downloaded = orchestrator.run().await.unwrap();
    downloaded.sort();

    assert_eq!(
        downloaded,
        vec!["pdf2text (1).zip".to_string(), "pdf2text.zip".to_string()]
    );
}

/// 同一批次里两个主名相同的文件不会互相覆盖结果
#[tokio::test]
async fn test_same_stem_results_are_both_kept() {
    let fx = Fixture::new(&["a.pdf", "a.PDF"]);
    let driver = FakeDriver::new(&fx.config);
    let mut orchestrator = fx.orchestrator(SourceSpec::from_dir(&fx.input), driver);

    let mut downloaded = orchestrator.run().await.unwrap();
    downloaded.sort();

    assert_eq!(downloaded, vec!["a (1).zip".to_string(), "a.zip".to_string()]);
    let results = &fx.config.downloads_dir;
    for name in &downloaded {
        assert!(results.join(name).exists(), "{} 应该存在", name);
    }
    assert_eq!(fs::read_dir(results).unwrap().count(), 2);
}

/// 不配置压缩包名称时取最新下载的文件，同样按原文件名重命名
#[tokio::test]
async fn test_blank_archive_name_uses_latest_download() {
    let mut fx = Fixture::new(&["x.pdf", "y.pdf"]);
    fx.config.site.archive_name = String::new();
    let driver = FakeDriver::new(&fx.config);
    let mut orchestrator = fx.orchestrator(SourceSpec::from_dir(&fx.input), driver);

    let mut downloaded = orchestrator.run().await.unwrap();
    downloaded.sort();

    assert_eq!(downloaded, vec!["x.zip".to_string(), "y.zip".to_string()]);
}
