//! 访问上下文
//!
//! 封装"我正在处理队列中第几个条目"这一信息

use std::fmt::Display;

/// 单个条目的访问上下文
#[derive(Debug, Clone)]
pub struct VisitCtx {
    /// 条目在运行内的稳定 key
    pub key: String,
    /// 列表中显示的名称
    pub name: String,
    /// 条目在队列中的序号（从 1 开始，仅用于日志显示）
    pub item_index: usize,
    /// 队列总长度
    pub total: usize,
}

impl VisitCtx {
    pub fn new(key: String, name: String, item_index: usize, total: usize) -> Self {
        Self {
            key,
            name,
            item_index,
            total,
        }
    }
}

impl Display for VisitCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[条目 {}/{} {}]", self.item_index, self.total, self.name)
    }
}
