//! 重复提交检测 - 业务能力层（纯函数）
//!
//! 提交前扫描已有记录。两级策略：
//! 1. 严格：同起止日 + 同金额（分级精确相等），确认为重复
//! 2. 兜底：仅同起止日——页面文本抽取出的金额不一定可靠，
//!    同期间已有记录时保守地不再尝试提交

use crate::models::{BillingRequest, ExistingEntry};

/// 重复检测结果（重复不是错误，属于成功路径）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateCheck {
    /// 没有冲突，可以提交
    None,
    /// 起止日与金额完全一致
    Exact,
    /// 仅起止日一致（金额不同或无法比较）
    SameDates,
}

impl DuplicateCheck {
    /// 是否应当跳过提交
    pub fn is_duplicate(self) -> bool {
        !matches!(self, DuplicateCheck::None)
    }
}

/// 扫描已有记录，判断目标请求是否重复
///
/// 日期按同一天比较，金额按分精确比较，无任何模糊匹配。
pub fn check_duplicate(entries: &[ExistingEntry], target: &BillingRequest) -> DuplicateCheck {
    let exact = entries.iter().any(|e| {
        e.start == target.start && e.end == target.end && e.amount_cents == target.amount_cents
    });
    if exact {
        return DuplicateCheck::Exact;
    }

    let same_dates = entries
        .iter()
        .any(|e| e.start == target.start && e.end == target.end);
    if same_dates {
        return DuplicateCheck::SameDates;
    }

    DuplicateCheck::None
}
