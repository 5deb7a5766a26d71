use anyhow::Result;
/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs;
use tracing::info;

/// 初始化 tracing 订阅器
///
/// RUST_LOG 未设置时默认 info 级别
pub fn init() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// 初始化日志文件
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n案件处理日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(target_url: &str, billing_range: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 案件录入与账单提交模式");
    info!("🌐 目标列表: {}", target_url);
    info!("📅 账单期间: {}", billing_range);
    info!("{}", "=".repeat(60));
}

/// 记录队列加载信息
pub fn log_queue_loaded(total: usize, skipped: usize) {
    info!("✓ 找到 {} 个待处理的条目", total);
    if skipped > 0 {
        info!("⤼ 其中 {} 个在跳过集中", skipped);
    }
    info!("💡 单会话串行处理，条目间可暂停/停止\n");
}

/// 打印最终统计信息
pub fn print_final_stats(ok: usize, warn: usize, bad: usize, pending: usize, log_file_path: &str) {
    let total = ok + warn + bad + pending;
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", ok, total);
    info!("⚠️ 带警告: {}", warn);
    info!("❌ 失败: {}", bad);
    if pending > 0 {
        info!("⏭ 未处理（跳过/停止）: {}", pending);
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
