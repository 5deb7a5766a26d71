use crate::models::billing::DateRange;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 案件列表页 URL
    pub target_url: String,
    /// 凭证文书生成后端 URL
    pub backend_url: String,
    /// 运行配置（日期区间、费率等）TOML 文件路径
    pub run_config_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    // --- 等待 / 重试参数 ---
    /// 微轮询次数（单个页面条件）
    pub poll_attempts: usize,
    /// 微轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 当前页定位重试次数
    pub locate_attempts: usize,
    /// 当前页定位重试间隔（毫秒）
    pub locate_interval_ms: u64,
    /// 单条目刷新重试上限
    pub refresh_retry_limit: usize,
    /// 会话重启上限
    pub session_restart_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            target_url: "https://verwaltung.example.de/#/akteListe".to_string(),
            backend_url: "http://127.0.0.1:8700".to_string(),
            run_config_file: "runconfig.toml".to_string(),
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            poll_attempts: 20,
            poll_interval_ms: 250,
            locate_attempts: 10,
            locate_interval_ms: 300,
            refresh_retry_limit: 5,
            session_restart_limit: 2,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.browser_debug_port),
            target_url: std::env::var("TARGET_URL").unwrap_or(default.target_url),
            backend_url: std::env::var("BACKEND_URL").unwrap_or(default.backend_url),
            run_config_file: std::env::var("RUN_CONFIG_FILE").unwrap_or(default.run_config_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            poll_attempts: std::env::var("POLL_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.poll_attempts),
            poll_interval_ms: std::env::var("POLL_INTERVAL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.poll_interval_ms),
            locate_attempts: std::env::var("LOCATE_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.locate_attempts),
            locate_interval_ms: std::env::var("LOCATE_INTERVAL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.locate_interval_ms),
            refresh_retry_limit: std::env::var("REFRESH_RETRY_LIMIT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.refresh_retry_limit),
            session_restart_limit: std::env::var("SESSION_RESTART_LIMIT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.session_restart_limit),
        }
    }
}

/// 运行配置
///
/// 操作员在运行开始前写入的键值配置，运行开始时读取一次，
/// 核心流程不会修改它。
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// 请求的账单起始日（ISO 格式，如 2024-01-01）
    pub billing_start: String,
    /// 请求的账单截止日
    pub billing_end: String,
    /// 每日费率（分）
    pub rate_per_day_cents: i64,
    /// 显式指定的总金额（分）；给出时信任它，只在不一致时告警
    #[serde(default)]
    pub explicit_amount_cents: Option<i64>,
    /// 是否执行凭证文书生成与上传
    #[serde(default = "default_true")]
    pub upload_enabled: bool,
    /// 是否执行账单录入
    #[serde(default = "default_true")]
    pub billing_enabled: bool,
    /// 需要跳过的条目 key 集合（中性跳过，不算成功也不算失败）
    #[serde(default)]
    pub skip_keys: Vec<String>,
    /// 列表名称过滤（子串匹配）
    #[serde(default)]
    pub search_filter: Option<String>,
    /// 凭证引用号（未上传文书时使用）
    #[serde(default)]
    pub proof_reference: Option<String>,
}

fn default_true() -> bool {
    true
}

impl RunConfig {
    /// 从 TOML 文件加载运行配置
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("无法读取运行配置文件: {}", path.display()))?;
        let config: RunConfig = toml::from_str(&content)
            .with_context(|| format!("无法解析运行配置文件: {}", path.display()))?;
        Ok(config)
    }

    /// 请求的账单日期区间
    pub fn requested_range(&self) -> Result<DateRange> {
        let start = NaiveDate::parse_from_str(&self.billing_start, "%Y-%m-%d")
            .with_context(|| format!("无法解析起始日期: {}", self.billing_start))?;
        let end = NaiveDate::parse_from_str(&self.billing_end, "%Y-%m-%d")
            .with_context(|| format!("无法解析截止日期: {}", self.billing_end))?;
        anyhow::ensure!(start <= end, "起始日期 {} 晚于截止日期 {}", start, end);
        Ok(DateRange::new(start, end))
    }
}
