use anyhow::Result;
use clap::Parser;
use persian_ocr::cli::Cli;
use persian_ocr::utils::logging;
use persian_ocr::App;

#[tokio::main]
async fn main() -> Result<()> {
    // 解析参数（缺少 --file / --dir 时由 clap 报用法错误并退出）
    let cli = Cli::parse();

    // 加载配置
    let config = cli.load_config()?;

    // 初始化日志，guard 在 main 返回时落盘
    let _log_guard = logging::init(&config.log_file, config.verbose_logging)?;

    // 初始化并运行应用
    App::initialize(config, cli.source())?.run().await?;

    Ok(())
}
