use anyhow::Result;
/// 日志工具模块
///
/// 提供日志初始化和格式化输出的辅助函数
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing
///
/// 优先使用 `RUST_LOG`，其次是命令行指定的级别，最后看是否开启详细日志
pub fn init(level_override: Option<&str>, verbose: bool) {
    let default_level = level_override.unwrap_or(if verbose { "debug" } else { "info" });
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
/// - `command`: 本次运行的子命令
pub fn init_log_file(log_file_path: &str, command: &str) -> Result<()> {
    let log_header = format!(
        "{}\n{} 运行日志 - {}\n{}\n\n",
        "=".repeat(60),
        command,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录批次开始信息
///
/// # 参数
/// - `batch_num`: 批次编号（从 1 开始）
/// - `total_batches`: 批次总数
/// - `requested`: 本批请求的题目数量
/// - `previous`: 已经生成的题目数量
pub fn log_batch_start(batch_num: usize, total_batches: usize, requested: usize, previous: usize) {
    info!("{}", "=".repeat(60));
    info!("📦 开始生成第 {}/{} 批", batch_num, total_batches);
    info!("📄 本批请求 {} 题，已有 {} 题", requested, previous);
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
pub fn log_batch_complete(batch_num: usize, received: usize, requested: usize) {
    info!("{}", "─".repeat(60));
    info!("✓ 第 {} 批完成: 收到 {}/{} 题", batch_num, received, requested);
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
