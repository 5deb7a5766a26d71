//! 基础设施层（Infrastructure Layer)
//!
//! 持有稀缺资源（Page / Browser 连接），只暴露能力：
//!
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//! - `PageReader` - 核心逻辑唯一的 UI 接缝：只返回解析后的值，
//!   选择器字符串全部隔离在 `cdp_reader` 中
//! - `SessionFactory` - 会话的创建与重建（登录态由浏览器侧维持）

pub mod cdp_reader;
pub mod js_executor;
pub mod page_reader;
pub mod selectors;

pub use cdp_reader::CdpPageReader;
pub use js_executor::JsExecutor;
pub use page_reader::{PageReader, SessionFactory};
