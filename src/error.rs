use crate::models::billing::{DateRange, ParseError};
use std::fmt;

/// 自动化错误分类
///
/// 供重试监督器决定走哪一层恢复：
/// - 可重试：刷新重试 / 会话重启
/// - 终态：立即放弃当前条目，不消耗重试预算
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ElementNotFound,
    Timeout,
    SessionLost,
    Network,
    Validation,
    NoOverlap,
    Skip,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::ElementNotFound => "ELEMENT_NOT_FOUND",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::SessionLost => "SESSION_LOST",
            ErrorKind::Network => "NETWORK",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::NoOverlap => "NO_OVERLAP",
            ErrorKind::Skip => "SKIP",
            ErrorKind::Unknown => "UNKNOWN",
        }
    }

    /// 终态错误不进入任何重试层
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ErrorKind::Validation | ErrorKind::NoOverlap | ErrorKind::Skip
        )
    }
}

/// 自动化过程错误
///
/// 重复记录（DUPLICATE）不是错误，属于成功路径，
/// 由 DuplicateGuard 的检查结果表达，不出现在这里。
#[derive(Debug)]
pub enum AutoError {
    /// 页面元素未出现
    ElementNotFound { what: String },
    /// 有界等待超时
    Timeout { what: String, waited_ms: u64 },
    /// 自动化会话失效（连接断开 / 登录过期）
    SessionLost { detail: String },
    /// 网络请求失败
    Network { detail: String },
    /// 输入校验失败（重试不可能成功）
    Validation { detail: String },
    /// 请求期间与授权期间无交集（重试不可能成功）
    NoOverlap {
        requested: DateRange,
        authorized: DateRange,
    },
    /// 显式标记跳过的条件（终态，不算失败重试）
    Skip { reason: String },
    /// 其他未分类错误
    Unknown { detail: String },
}

impl AutoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AutoError::ElementNotFound { .. } => ErrorKind::ElementNotFound,
            AutoError::Timeout { .. } => ErrorKind::Timeout,
            AutoError::SessionLost { .. } => ErrorKind::SessionLost,
            AutoError::Network { .. } => ErrorKind::Network,
            AutoError::Validation { .. } => ErrorKind::Validation,
            AutoError::NoOverlap { .. } => ErrorKind::NoOverlap,
            AutoError::Skip { .. } => ErrorKind::Skip,
            AutoError::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind().is_terminal()
    }

    // ========== 便捷构造函数 ==========

    pub fn element_not_found(what: impl Into<String>) -> Self {
        AutoError::ElementNotFound { what: what.into() }
    }

    pub fn timeout(what: impl Into<String>, waited_ms: u64) -> Self {
        AutoError::Timeout {
            what: what.into(),
            waited_ms,
        }
    }

    pub fn session_lost(detail: impl Into<String>) -> Self {
        AutoError::SessionLost {
            detail: detail.into(),
        }
    }

    pub fn network(detail: impl Into<String>) -> Self {
        AutoError::Network {
            detail: detail.into(),
        }
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        AutoError::Validation {
            detail: detail.into(),
        }
    }

    pub fn skip(reason: impl Into<String>) -> Self {
        AutoError::Skip {
            reason: reason.into(),
        }
    }

    pub fn unknown(detail: impl Into<String>) -> Self {
        AutoError::Unknown {
            detail: detail.into(),
        }
    }
}

impl fmt::Display for AutoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutoError::ElementNotFound { what } => {
                write!(f, "页面元素未找到: {}", what)
            }
            AutoError::Timeout { what, waited_ms } => {
                write!(f, "等待超时 ({} ms): {}", waited_ms, what)
            }
            AutoError::SessionLost { detail } => {
                write!(f, "会话失效: {}", detail)
            }
            AutoError::Network { detail } => {
                write!(f, "网络错误: {}", detail)
            }
            AutoError::Validation { detail } => {
                write!(f, "校验失败: {}", detail)
            }
            AutoError::NoOverlap {
                requested,
                authorized,
            } => {
                write!(
                    f,
                    "请求期间 [{}] 与授权期间 [{}] 无交集",
                    requested, authorized
                )
            }
            AutoError::Skip { reason } => {
                write!(f, "跳过: {}", reason)
            }
            AutoError::Unknown { detail } => {
                write!(f, "未知错误: {}", detail)
            }
        }
    }
}

impl std::error::Error for AutoError {}

// ========== 从常见错误类型转换 ==========
// anyhow 对所有实现 std::error::Error 的类型已有自动包装，
// 这里只做分类映射。

impl From<chromiumoxide::error::CdpError> for AutoError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        // CDP 错误按文本分类：连接层故障视为会话失效，其余归未知
        let text = err.to_string();
        let lowered = text.to_lowercase();
        if lowered.contains("timeout") || lowered.contains("timed out") {
            AutoError::Timeout {
                what: text,
                waited_ms: 0,
            }
        } else if lowered.contains("websocket")
            || lowered.contains("connection")
            || lowered.contains("channel")
            || lowered.contains("no response")
        {
            AutoError::SessionLost { detail: text }
        } else {
            AutoError::Unknown { detail: text }
        }
    }
}

impl From<reqwest::Error> for AutoError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AutoError::Timeout {
                what: err.to_string(),
                waited_ms: 0,
            }
        } else {
            AutoError::Network {
                detail: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for AutoError {
    fn from(err: serde_json::Error) -> Self {
        AutoError::Unknown {
            detail: format!("JSON 解析失败: {}", err),
        }
    }
}

impl From<ParseError> for AutoError {
    fn from(err: ParseError) -> Self {
        // 页面文本解析不出来 = 期待的内容还没渲染，按元素未找到重试
        AutoError::ElementNotFound {
            what: err.to_string(),
        }
    }
}

/// 从 anyhow 错误链中提取分类；未分类的一律视为 UNKNOWN（可重试）
pub fn classify(err: &anyhow::Error) -> ErrorKind {
    err.downcast_ref::<AutoError>()
        .map(AutoError::kind)
        .unwrap_or(ErrorKind::Unknown)
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AutoError>;
