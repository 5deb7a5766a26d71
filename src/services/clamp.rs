//! 授权钳制 - 业务能力层（纯函数）
//!
//! 把操作员请求的账单期间与案件的授权窗口求交集，并重新计算金额。
//! 无交集是终态错误：换多少次重试，期间也不会重叠。

use crate::error::AutoError;
use crate::models::{AuthorizationWindow, BillingRequest, DateRange};

/// 钳制结果：最终的账单请求 + 不阻断提交的警告
#[derive(Debug, Clone)]
pub struct ClampOutcome {
    pub request: BillingRequest,
    pub warnings: Vec<String>,
}

/// 期间钳制与金额计算
///
/// 金额策略：按钳制后的天数重新计算；调用方显式给出金额时信任它，
/// 只在与计算值不一致时告警（目标系统会做自己的校验）。
/// 超出授权上限同样只告警，不阻断。
pub fn clamp(
    requested: DateRange,
    window: &AuthorizationWindow,
    rate_per_day_cents: i64,
    explicit_amount_cents: Option<i64>,
    proof_reference: &str,
) -> Result<ClampOutcome, AutoError> {
    let effective_start = requested.start.max(window.opened);
    let effective_end = requested.end.min(window.authorized_end);

    if effective_end < effective_start {
        return Err(AutoError::NoOverlap {
            requested,
            authorized: DateRange::new(window.opened, window.authorized_end),
        });
    }

    let clamped = DateRange::new(effective_start, effective_end);
    let computed = rate_per_day_cents * clamped.inclusive_days();

    let mut warnings = Vec::new();
    let amount_cents = match explicit_amount_cents {
        Some(explicit) => {
            if explicit != computed {
                warnings.push(format!(
                    "显式金额 {} 分与按天计算值 {} 分不一致",
                    explicit, computed
                ));
            }
            explicit
        }
        None => computed,
    };

    if amount_cents > window.max_amount_cents {
        warnings.push(format!(
            "金额 {} 分超出授权上限 {} 分",
            amount_cents, window.max_amount_cents
        ));
    }

    Ok(ClampOutcome {
        request: BillingRequest {
            start: effective_start,
            end: effective_end,
            amount_cents,
            proof_reference: proof_reference.to_string(),
        },
        warnings,
    })
}
