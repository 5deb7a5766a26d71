//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责队列调度与失败恢复，是整个引擎的"指挥中心"。
//!
//! ### `run_orchestrator` - 运行编排器
//! - 冻结工作队列（`Vec<CaseItem>`）
//! - 串行处理条目，维护暂停/停止标志与分页锚点
//! - 持有会话锁，保证两次运行绝不交错
//! - 向事件通道汇报进度
//!
//! ### `supervisor` - 重试/重启监督器
//! - 条目级刷新重试（有界）
//! - 会话级重启（有界，重新认证）
//! - 终态错误短路，单条目失败不中止运行
//!
//! ### `events` - 进度事件
//! - 无界通道，核心永不等待消费方
//!
//! ## 层次关系
//!
//! ```text
//! run_orchestrator (处理 Vec<CaseItem>)
//!     ↓
//! supervisor (单个 CaseItem 的恢复策略)
//!     ↓
//! workflow::VisitFlow (单个 CaseItem 的访问流程)
//!     ↓
//! services (能力层：pager / locator / clamp / guard / billing / document)
//!     ↓
//! infrastructure (基础设施：JsExecutor / PageReader)
//! ```

pub mod events;
pub mod run_orchestrator;
pub mod supervisor;

pub use events::{event_channel, EventReceiver, EventSender, ProgressEvent};
pub use run_orchestrator::{summarize, RunOrchestrator, RunState};
pub use supervisor::RetryRestartSupervisor;
