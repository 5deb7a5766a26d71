//! 命令接口 - 对外协作层
//!
//! 操作员界面通过请求/响应式命令驱动引擎，
//! 进度事件另行通过事件通道持续推送。

use crate::models::{CaseItem, CaseStatus, DateRange};
use crate::orchestrator::RunOrchestrator;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

/// 引擎接受的命令
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    RunStart {
        #[serde(default)]
        from_index: usize,
    },
    RunPause,
    RunResume,
    RunStop,
    ScrapeList,
    VisitOne {
        key: String,
        name: String,
    },
    GenerateAndUpload {
        backend_url: String,
        start: NaiveDate,
        end: NaiveDate,
    },
    EnterBilling {
        start: NaiveDate,
        end: NaiveDate,
        rate_per_day_cents: i64,
        proof_reference: String,
    },
}

/// 命令响应
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommandResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<CaseItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CaseStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate: Option<bool>,
}

impl CommandResponse {
    fn success() -> Self {
        Self {
            ok: true,
            ..Default::default()
        }
    }

    fn failure(error: impl std::fmt::Display) -> Self {
        Self {
            ok: false,
            error: Some(error.to_string()),
            ..Default::default()
        }
    }
}

/// 执行一条命令
///
/// RUN_START 在后台任务中执行整个运行并立即返回；
/// 其余命令同步完成。
pub async fn dispatch(orchestrator: Arc<RunOrchestrator>, command: Command) -> CommandResponse {
    match command {
        Command::RunStart { from_index } => {
            let runner = orchestrator.clone();
            tokio::spawn(async move {
                if let Err(e) = runner.run(from_index).await {
                    error!("运行失败: {:#}", e);
                }
            });
            CommandResponse::success()
        }
        Command::RunPause => {
            orchestrator.pause();
            CommandResponse::success()
        }
        Command::RunResume => {
            orchestrator.resume();
            CommandResponse::success()
        }
        Command::RunStop => {
            orchestrator.stop();
            CommandResponse::success()
        }
        Command::ScrapeList => match orchestrator.scrape_list().await {
            Ok(items) => CommandResponse {
                items: Some(items),
                ..CommandResponse::success()
            },
            Err(e) => CommandResponse::failure(e),
        },
        Command::VisitOne { key, name } => match orchestrator.visit_one(&key, &name).await {
            Ok(item) => CommandResponse {
                status: Some(item.status),
                error: item.error,
                ..CommandResponse::success()
            },
            Err(e) => CommandResponse::failure(e),
        },
        Command::GenerateAndUpload {
            backend_url,
            start,
            end,
        } => {
            match orchestrator
                .generate_and_upload_once(&backend_url, DateRange::new(start, end))
                .await
            {
                Ok(_) => CommandResponse::success(),
                Err(e) => CommandResponse::failure(e),
            }
        }
        Command::EnterBilling {
            start,
            end,
            rate_per_day_cents,
            proof_reference,
        } => {
            match orchestrator
                .enter_billing_once(
                    DateRange::new(start, end),
                    rate_per_day_cents,
                    &proof_reference,
                )
                .await
            {
                Ok(outcome) => CommandResponse {
                    duplicate: Some(outcome.duplicate.is_duplicate()),
                    ..CommandResponse::success()
                },
                Err(e) => CommandResponse::failure(e),
            }
        }
    }
}
