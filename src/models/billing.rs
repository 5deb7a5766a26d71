//! 账单相关的领域类型与文本解析
//!
//! 金额一律以整数分（cent）表示，避免浮点误差；
//! 页面文本为德式格式（日期 `31.01.2024`、金额 `1.234,56 €`）。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 页面文本解析错误
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("无法解析日期文本: {0:?}")]
    Date(String),
    #[error("无法解析金额文本: {0:?}")]
    Amount(String),
    #[error("无法解析分页指示文本: {0:?}")]
    PagerLabel(String),
}

/// 闭区间日期范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// 含首尾两端的天数
    pub fn inclusive_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} – {}", self.start, self.end)
    }
}

/// 当前案件的授权窗口（按次抓取，读取后不再变化）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationWindow {
    /// 授权起始日
    pub opened: NaiveDate,
    /// 授权截止日
    pub authorized_end: NaiveDate,
    /// 金额上限（分）
    pub max_amount_cents: i64,
}

/// 一条待提交的账单记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingRequest {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub amount_cents: i64,
    /// 关联的凭证文书引用
    pub proof_reference: String,
}

impl BillingRequest {
    pub fn range(&self) -> DateRange {
        DateRange::new(self.start, self.end)
    }
}

/// 已提交列表中的一条记录（从页面解析）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingEntry {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub amount_cents: i64,
}

/// 解析页面上的日期文本
///
/// 接受 `31.01.2024`（页面显示格式）与 `2024-01-31`（ISO）两种写法。
pub fn parse_ui_date(text: &str) -> Result<NaiveDate, ParseError> {
    let trimmed = text.trim();
    NaiveDate::parse_from_str(trimmed, "%d.%m.%Y")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
        .map_err(|_| ParseError::Date(text.to_string()))
}

/// 解析金额文本为分
///
/// 页面上出现的写法包括 `528,00 €`、`1.234,56`、`48`。
/// 规则：最后一个后面只跟 1–2 位数字的分隔符视为小数点，其余分隔符为千位符。
pub fn parse_amount_cents(text: &str) -> Result<i64, ParseError> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return Err(ParseError::Amount(text.to_string()));
    }

    let negative = cleaned.starts_with('-');
    let digits_part = cleaned.trim_start_matches('-');

    // 找小数分隔符：最后一个 ',' 或 '.'，且其后不超过 2 位数字
    let decimal_pos = digits_part
        .rfind([',', '.'])
        .filter(|pos| digits_part.len() - pos - 1 <= 2);

    let (int_part, frac_part) = match decimal_pos {
        Some(pos) => (&digits_part[..pos], &digits_part[pos + 1..]),
        None => (digits_part, ""),
    };

    let int_digits: String = int_part.chars().filter(|c| c.is_ascii_digit()).collect();
    if int_digits.is_empty() && frac_part.is_empty() {
        return Err(ParseError::Amount(text.to_string()));
    }

    let whole: i64 = if int_digits.is_empty() {
        0
    } else {
        int_digits
            .parse()
            .map_err(|_| ParseError::Amount(text.to_string()))?
    };

    let cents: i64 = match frac_part.len() {
        0 => 0,
        1 => {
            frac_part
                .parse::<i64>()
                .map_err(|_| ParseError::Amount(text.to_string()))?
                * 10
        }
        2 => frac_part
            .parse()
            .map_err(|_| ParseError::Amount(text.to_string()))?,
        _ => return Err(ParseError::Amount(text.to_string())),
    };

    let total = whole * 100 + cents;
    Ok(if negative { -total } else { total })
}

/// 格式化分为页面输入使用的金额文本（`528,00`）
pub fn format_amount_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.abs();
    format!("{}{},{:02}", sign, abs / 100, abs % 100)
}
