//! 单条目访问流程 - 流程层
//!
//! 状态机：Pending → Navigating → Located → DetailLoaded
//!         → (Uploading?) → (Billing?) → Returning → Done | Failed
//!
//! 约定：
//! - 可重试的失败向上抛给监督器（刷新重试 / 会话重启）
//! - 终态失败（无交集、校验失败）在这里落到条目上并正常返回，
//!   不消耗任何重试预算
//! - 上传与账单两个副作用互相独立：上传失败只记录，不阻断账单

use crate::config::{Config, RunConfig};
use crate::control::{PollPolicy, RunControl};
use crate::error::{classify, AutoError, ErrorKind};
use crate::infrastructure::PageReader;
use crate::models::{CaseItem, CaseStatus, DateRange, PagerWindow, StageStatus};
use crate::services::duplicate_guard::DuplicateCheck;
use crate::services::{BillingService, DocumentService, ItemLocator, Pager};
use crate::workflow::visit_ctx::VisitCtx;
use anyhow::Result;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// 访问状态（用于日志与测试观察）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitState {
    Pending,
    Navigating,
    Located,
    DetailLoaded,
    Uploading,
    Billing,
    Returning,
    Done,
    Failed,
}

impl VisitState {
    pub fn as_str(self) -> &'static str {
        match self {
            VisitState::Pending => "pending",
            VisitState::Navigating => "navigating",
            VisitState::Located => "located",
            VisitState::DetailLoaded => "detail_loaded",
            VisitState::Uploading => "uploading",
            VisitState::Billing => "billing",
            VisitState::Returning => "returning",
            VisitState::Done => "done",
            VisitState::Failed => "failed",
        }
    }
}

/// 单条目访问流程
///
/// 不持有任何资源（page），只依赖业务能力（services）。
pub struct VisitFlow {
    billing: BillingService,
    documents: DocumentService,
    requested: DateRange,
    run: RunConfig,
    poll: PollPolicy,
    locate: PollPolicy,
}

impl VisitFlow {
    pub fn new(config: &Config, run: RunConfig, requested: DateRange) -> Self {
        let poll = PollPolicy::new(config.poll_attempts, config.poll_interval_ms);
        Self {
            billing: BillingService::new(poll),
            documents: DocumentService::new(config.backend_url.as_str()),
            requested,
            run,
            poll,
            locate: PollPolicy::new(config.locate_attempts, config.locate_interval_ms),
        }
    }

    /// 处理一个条目
    ///
    /// 返回 Ok 表示条目已达终态（ok/warn/bad 均可能）；
    /// 返回 Err 表示可重试失败，由监督器决定下一层恢复。
    pub async fn run(
        &self,
        reader: &dyn PageReader,
        control: &RunControl,
        item: &mut CaseItem,
        ctx: &VisitCtx,
    ) -> Result<()> {
        let mut reasons: Vec<String> = Vec::new();
        let pager = Pager::new(reader, control, self.poll);
        let locator = ItemLocator::new(reader, control, self.locate);

        // ========== Pending → Navigating：定位记录 ==========
        self.log_state(ctx, VisitState::Navigating);
        let (row, anchor) = match locator.find_on_current_page(&item.name).await? {
            Some(row) => (row, pager.read_required().await?),
            None => {
                debug!("{} 当前页未找到，跨页扫描", ctx);
                match locator.find_across_all_pages(&pager, &item.name).await? {
                    Some(found) => found,
                    None => {
                        // 整个列表都没有这条记录；监督器按可重试处理，
                        // 预算耗尽后落为 ELEMENT_NOT_FOUND
                        return Err(AutoError::element_not_found(format!(
                            "记录 {:?} 不在列表中",
                            item.name
                        ))
                        .into());
                    }
                }
            }
        };
        item.page_anchor = Some(anchor);
        self.log_state(ctx, VisitState::Located);

        // ========== Located → DetailLoaded：打开详情 ==========
        reader.open_row(&row).await?;
        if let Err(e) = self.wait_detail_marker(reader, control).await {
            if classify(&e) != ErrorKind::Timeout {
                return Err(e);
            }
            // 标记可能是可选的：短暂无条件等待后降级继续，
            // 但必须在条目上留下痕迹，不能静默当成成功
            warn!("{} ⚠️ 详情页标记未出现，降级继续", ctx);
            reasons.push("详情页标记未出现（降级继续）".to_string());
            sleep(Duration::from_millis(self.poll.interval.as_millis() as u64 * 2)).await;
        }
        self.log_state(ctx, VisitState::DetailLoaded);

        // 抓取联系数据（录入与文书生成都要用）
        let contact = reader.scrape_contact().await?;
        debug!("{} 联系数据: {} / {}", ctx, contact.name, contact.file_number);

        // ========== DetailLoaded → Uploading（按需） ==========
        let mut proof_reference = self
            .run
            .proof_reference
            .clone()
            .unwrap_or_else(|| item.key.clone());

        if self.run.upload_enabled && item.upload_status != StageStatus::Done {
            if reader.needs_attestation().await? {
                self.log_state(ctx, VisitState::Uploading);
                match self.upload_stage(reader, &contact).await {
                    Ok(reference) => {
                        item.upload_status = StageStatus::Done;
                        proof_reference = reference;
                        info!("{} ✓ 凭证文书已上传", ctx);
                    }
                    Err(e) => {
                        // 上传失败只记录，不阻断账单
                        error!("{} ❌ 上传失败: {}", ctx, e);
                        item.upload_status = StageStatus::Error;
                        reasons.push(format!("上传: {}", e));
                    }
                }
            } else {
                debug!("{} 无签章标志，无需上传文书", ctx);
            }
        } else if item.upload_status == StageStatus::Done {
            debug!("{} 文书已在先前尝试中上传，跳过", ctx);
        }

        // ========== → Billing（按需） ==========
        if self.run.billing_enabled {
            self.log_state(ctx, VisitState::Billing);
            match self
                .billing
                .enter_billing(
                    reader,
                    control,
                    self.requested,
                    self.run.rate_per_day_cents,
                    self.run.explicit_amount_cents,
                    &proof_reference,
                )
                .await
            {
                Ok(outcome) => {
                    item.billing_status = match outcome.duplicate {
                        DuplicateCheck::None => StageStatus::Done,
                        DuplicateCheck::Exact | DuplicateCheck::SameDates => {
                            StageStatus::Duplicate
                        }
                    };
                    reasons.extend(outcome.warnings);
                }
                Err(e) => {
                    if classify(&e).is_terminal() {
                        // 终态失败：落在条目上，不消耗重试预算
                        error!("{} ❌ 账单录入终态失败: {}", ctx, e);
                        item.billing_status = StageStatus::Error;
                        reasons.push(format!("账单: {}", e));
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        // ========== → Returning：回列表并恢复锚点 ==========
        self.log_state(ctx, VisitState::Returning);
        if let Err(e) = self.return_to_list(reader, control, &pager, anchor).await {
            warn!("{} ⚠️ 恢复列表窗口失败: {}", ctx, e);
            reasons.push(format!("返回列表: {}", e));
        }

        // ========== 终态判定 ==========
        let all_requested_ok =
            item.upload_status.is_success() && item.billing_status.is_success();
        item.status = if !all_requested_ok {
            CaseStatus::Bad
        } else if reasons.is_empty() {
            CaseStatus::Ok
        } else {
            CaseStatus::Warn
        };
        item.error = if reasons.is_empty() {
            None
        } else {
            Some(reasons.join(" · "))
        };

        let final_state = if item.status == CaseStatus::Bad {
            VisitState::Failed
        } else {
            VisitState::Done
        };
        self.log_state(ctx, final_state);
        info!("{} 终态: {}", ctx, item.status.as_str());
        Ok(())
    }

    /// 等待详情页标记出现
    async fn wait_detail_marker(&self, reader: &dyn PageReader, control: &RunControl) -> Result<()> {
        crate::control::poll_until(self.poll, control, "详情页标记", || async move {
            reader.detail_marker_present().await
        })
        .await
    }

    /// 生成并上传凭证文书，返回文书引用号
    async fn upload_stage(
        &self,
        reader: &dyn PageReader,
        contact: &crate::models::ContactInfo,
    ) -> Result<String> {
        let document = self.documents.generate(contact, self.requested).await?;
        reader
            .upload_document(&document.file_name, &document.content)
            .await?;
        Ok(document.reference)
    }

    /// 返回列表，失败时直接导航到列表 URL 兜底，最后恢复锚点窗口
    async fn return_to_list(
        &self,
        reader: &dyn PageReader,
        control: &RunControl,
        pager: &Pager<'_>,
        anchor: PagerWindow,
    ) -> Result<()> {
        if let Err(e) = reader.back_to_list().await {
            debug!("返回按钮不可用 ({}), 直接导航到列表", e);
            reader.goto_list().await?;
        }

        let wait = crate::control::poll_until(self.poll, control, "列表重新出现", || async move {
            reader.list_present().await
        })
        .await;
        if wait.is_err() {
            // 兜底：再试一次直接导航
            reader.goto_list().await?;
            crate::control::poll_until(self.poll, control, "列表重新出现", || async move {
                reader.list_present().await
            })
            .await?;
        }

        pager.go_to_window_start(anchor.start).await?;
        Ok(())
    }

    fn log_state(&self, ctx: &VisitCtx, state: VisitState) {
        debug!("{} → {}", ctx, state.as_str());
    }
}
