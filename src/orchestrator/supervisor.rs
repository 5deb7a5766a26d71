//! 重试/重启监督器 - 编排层
//!
//! 三层恢复，外层包内层：
//! 1. 微轮询（control::poll_until）——单个页面条件，各服务自己使用
//! 2. 条目刷新重试（有界）——可重试失败时刷新页面、从定位重新开始
//! 3. 会话重启（有界）——刷新预算耗尽后整个会话推倒重建、重新认证
//!
//! 终态错误（无交集、校验失败、显式跳过）直接短路，不消耗任何预算。
//! 单个条目的失败永远不会中止整个运行。

use crate::control::RunControl;
use crate::error::{classify, ErrorKind};
use crate::infrastructure::{PageReader, SessionFactory};
use crate::models::{CaseItem, CaseStatus};
use crate::orchestrator::events::{emit, EventSender, ProgressEvent};
use crate::workflow::{VisitCtx, VisitFlow};
use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct RetryRestartSupervisor {
    factory: Arc<dyn SessionFactory>,
    reader: Box<dyn PageReader>,
    refresh_limit: usize,
    restart_limit: usize,
    events: EventSender,
}

impl RetryRestartSupervisor {
    /// 打开初始会话
    pub async fn start(
        factory: Arc<dyn SessionFactory>,
        refresh_limit: usize,
        restart_limit: usize,
        events: EventSender,
    ) -> Result<Self> {
        let reader = factory.open().await?;
        Ok(Self {
            factory,
            reader,
            refresh_limit,
            restart_limit,
            events,
        })
    }

    pub fn reader(&self) -> &dyn PageReader {
        self.reader.as_ref()
    }

    /// 处理一个条目，穷尽所有恢复层后才标记永久失败
    ///
    /// 返回后条目必然处于终态（ok/warn/bad）。
    pub async fn process_item(
        &mut self,
        flow: &VisitFlow,
        control: &RunControl,
        item: &mut CaseItem,
        ctx: &VisitCtx,
    ) {
        let mut restarts = 0usize;
        let mut last_error: Option<anyhow::Error> = None;

        'session: loop {
            // ========== 第二层：条目刷新重试 ==========
            for attempt in 1..=self.refresh_limit.max(1) {
                match flow.run(self.reader.as_ref(), control, item, ctx).await {
                    Ok(()) => return,
                    Err(e) => {
                        let kind = classify(&e);
                        if kind.is_terminal() {
                            // 终态错误不重试
                            error!("{} ❌ 终态失败 ({}): {}", ctx, kind.as_str(), e);
                            self.mark_failed(item, kind, &e);
                            return;
                        }

                        warn!(
                            "{} ⚠️ 第 {}/{} 次尝试失败 ({}): {}",
                            ctx,
                            attempt,
                            self.refresh_limit,
                            kind.as_str(),
                            e
                        );
                        last_error = Some(e);

                        if control.is_stopped() {
                            // 停止请求：不再消耗重试预算，条目落为终态
                            break 'session;
                        }
                        if kind == ErrorKind::SessionLost {
                            // 会话已失效，刷新没有意义，直接升级到重启层
                            break;
                        }
                        if attempt < self.refresh_limit {
                            if let Err(reload_err) = self.reader.reload().await {
                                warn!("{} 刷新页面失败: {}", ctx, reload_err);
                                break;
                            }
                        }
                    }
                }
            }

            // ========== 第三层：会话重启 ==========
            if restarts >= self.restart_limit || control.is_stopped() {
                break 'session;
            }
            restarts += 1;
            info!(
                "{} 🔄 会话重启 ({}/{})，重新认证后从当前条目继续",
                ctx, restarts, self.restart_limit
            );
            emit(
                &self.events,
                ProgressEvent::for_item("session_restart", item),
            );

            match self.factory.open().await {
                Ok(reader) => {
                    self.reader = reader;
                }
                Err(e) => {
                    warn!("{} 会话重启失败: {}", ctx, e);
                    last_error = Some(e);
                    // 预算未耗尽则再试一次重启
                    if restarts >= self.restart_limit {
                        break 'session;
                    }
                }
            }
        }

        // 所有恢复层耗尽：永久失败，运行继续处理下一个条目
        let (kind, detail) = match &last_error {
            Some(e) => (classify(e), e.to_string()),
            None => (ErrorKind::Unknown, "未知失败".to_string()),
        };
        error!("{} ❌ 恢复预算耗尽，条目永久失败: {}", ctx, detail);
        self.mark_failed_with_detail(item, kind, detail);
    }

    fn mark_failed(&self, item: &mut CaseItem, kind: ErrorKind, error: &anyhow::Error) {
        self.mark_failed_with_detail(item, kind, error.to_string());
    }

    fn mark_failed_with_detail(&self, item: &mut CaseItem, kind: ErrorKind, detail: String) {
        item.status = CaseStatus::Bad;
        let reason = format!("{}: {}", kind.as_str(), detail);
        item.error = match item.error.take() {
            Some(existing) => Some(format!("{} · {}", existing, reason)),
            None => Some(reason),
        };
    }
}
