//! 账单录入 - 业务能力层
//!
//! 单个案件的账单流程：读授权窗口 → 钳制 → 重复检测 → 提交 → 验证。
//! 幂等保证：提交前必先做重复检测；提交后轮询新记录出现才算成功。
//! 验证超时是可重试错误——重试会先再次命中重复检测，绝不会把
//! "已落库但未及时渲染"的记录提交第二遍。

use crate::control::{poll_until, PollPolicy, RunControl};
use crate::infrastructure::PageReader;
use crate::models::{BillingRequest, DateRange};
use crate::services::clamp::clamp;
use crate::services::duplicate_guard::{check_duplicate, DuplicateCheck};
use anyhow::Result;
use tracing::{info, warn};

/// 一次账单录入的结果
#[derive(Debug, Clone)]
pub struct BillingOutcome {
    /// 重复检测结果；is_duplicate() 时未发生任何提交副作用
    pub duplicate: DuplicateCheck,
    pub request: BillingRequest,
    pub warnings: Vec<String>,
}

pub struct BillingService {
    /// 提交后验证新记录出现的轮询策略
    verify: PollPolicy,
}

impl BillingService {
    pub fn new(verify: PollPolicy) -> Self {
        Self { verify }
    }

    /// 在当前详情页录入一条账单记录
    pub async fn enter_billing(
        &self,
        reader: &dyn PageReader,
        control: &RunControl,
        requested: DateRange,
        rate_per_day_cents: i64,
        explicit_amount_cents: Option<i64>,
        proof_reference: &str,
    ) -> Result<BillingOutcome> {
        // 授权窗口读取一次，本次访问内不再变化
        let window = reader.authorization_window().await?;
        let outcome = clamp(
            requested,
            &window,
            rate_per_day_cents,
            explicit_amount_cents,
            proof_reference,
        )?;
        let request = outcome.request;
        let mut warnings = outcome.warnings;

        for warning in &warnings {
            warn!("⚠️ {}", warning);
        }

        // 提交前的重复检测（幂等的关键）
        let existing = reader.existing_entries().await?;
        let duplicate = check_duplicate(&existing, &request);
        match duplicate {
            DuplicateCheck::Exact => {
                info!("✓ 已存在完全一致的账单记录，跳过提交");
                return Ok(BillingOutcome {
                    duplicate,
                    request,
                    warnings,
                });
            }
            DuplicateCheck::SameDates => {
                warn!("⚠️ 同期间已有记录（金额不同），保守起见不再提交");
                warnings.push("同期间已有账单记录，未重新提交".to_string());
                return Ok(BillingOutcome {
                    duplicate,
                    request,
                    warnings,
                });
            }
            DuplicateCheck::None => {}
        }

        info!("📤 提交账单记录: {} – {}", request.start, request.end);
        reader.submit_billing(&request).await?;

        // 验证：轮询已提交列表，直到新记录出现
        let wanted = &request;
        poll_until(self.verify, control, "新账单记录出现", || async move {
            let entries = reader.existing_entries().await?;
            Ok(check_duplicate(&entries, wanted) == DuplicateCheck::Exact)
        })
        .await?;

        info!("✓ 账单记录已确认");
        Ok(BillingOutcome {
            duplicate: DuplicateCheck::None,
            request,
            warnings,
        })
    }
}
