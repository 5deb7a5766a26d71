//! # Case Invoice Submit
//!
//! 针对第三方案件管理系统的自动化录入与账单提交引擎
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//! - `PageReader` - 唯一的 UI 接缝，只返回解析后的值
//! - `SessionFactory` - 会话的创建与重建
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个案件
//! - `Pager` / `ItemLocator` - 分页与定位能力
//! - `clamp` / `duplicate_guard` - 钳制与幂等检测（纯函数）
//! - `BillingService` / `DocumentService` - 账单录入与文书生成能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个条目"的完整访问流程
//! - `VisitCtx` - 上下文封装（key + 队列位置）
//! - `VisitFlow` - 状态机编排（定位 → 详情 → 上传 → 账单 → 返回）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/run_orchestrator` - 队列调度、暂停/停止、进度事件
//! - `orchestrator/supervisor` - 刷新重试与会话重启
//!
//! ## 关键保证
//!
//! - 同一 (记录, 期间, 金额) 的账单至多产生一次有效提交
//! - 单个条目失败绝不中止整个运行
//! - 跨页定位总是从第一页开始，扫描页数有界

pub mod api;
pub mod browser;
pub mod config;
pub mod control;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::{connect_to_browser_and_page, CdpSessionFactory};
pub use config::{Config, RunConfig};
pub use control::{poll_until, PollPolicy, RunControl};
pub use error::{classify, AutoError, ErrorKind};
pub use infrastructure::{JsExecutor, PageReader, SessionFactory};
pub use models::{
    AuthorizationWindow, BillingRequest, CaseItem, CaseStatus, DateRange, ExistingEntry,
    PagerWindow, StageStatus,
};
pub use orchestrator::{event_channel, ProgressEvent, RunOrchestrator, RunState};
pub use workflow::{VisitCtx, VisitFlow};
