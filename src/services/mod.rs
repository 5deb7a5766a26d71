//! 业务能力层（Services Layer）
//!
//! 描述"我能做什么"，每个服务只提供一种能力，只处理单个案件：
//!
//! - `Pager` - 分页窗口读取与翻页
//! - `ItemLocator` - 在列表中定位一条记录
//! - `clamp` - 请求期间与授权期间的钳制（纯函数）
//! - `duplicate_guard` - 重复提交检测（纯函数）
//! - `BillingService` - 账单录入（钳制 + 重复检测 + 提交 + 验证）
//! - `DocumentService` - 凭证文书生成
//!
//! 不出现 Vec<CaseItem>，不关心流程顺序。

pub mod billing_service;
pub mod clamp;
pub mod document_service;
pub mod duplicate_guard;
pub mod locator;
pub mod pager;

pub use billing_service::{BillingOutcome, BillingService};
pub use clamp::{clamp, ClampOutcome};
pub use document_service::{DocumentService, GeneratedDocument};
pub use duplicate_guard::{check_duplicate, DuplicateCheck};
pub use locator::ItemLocator;
pub use pager::Pager;
