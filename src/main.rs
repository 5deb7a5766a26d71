use anyhow::Result;
use case_invoice_submit::browser::CdpSessionFactory;
use case_invoice_submit::config::{Config, RunConfig};
use case_invoice_submit::orchestrator::{event_channel, summarize, RunOrchestrator};
use case_invoice_submit::utils::logging;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();
    let run_config = RunConfig::load(&config.run_config_file).await?;
    let requested = run_config.requested_range()?;

    logging::init_log_file(&config.output_log_file)?;
    logging::log_startup(&config.target_url, &requested.to_string());

    // 事件通道：核心写，观察任务读
    let (events, mut event_rx) = event_channel();
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            info!("[事件] {}", serde_json::to_string(&event).unwrap_or_default());
        }
    });

    // 组装并执行一次完整运行
    let factory = Arc::new(CdpSessionFactory::new(config.clone()));
    let orchestrator = RunOrchestrator::new(config.clone(), run_config, factory, events);
    orchestrator.run(0).await?;

    // 输出最终统计
    let state = orchestrator.get_state();
    let (ok, warn, bad, pending) = summarize(&state.queue);
    logging::print_final_stats(ok, warn, bad, pending, &config.output_log_file);

    Ok(())
}
