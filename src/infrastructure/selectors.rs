//! 目标 UI 版本的选择器表
//!
//! 唯一允许出现选择器字符串的地方。UI 升级时只改这里和 cdp_reader。

/// 分页指示文本，如 "1–10 von 234"
pub const PAGER_LABEL: &str = ".list-footer .pagination-label";
/// 下一页按钮
pub const PAGER_NEXT: &str = ".list-footer button.page-next";
/// 上一页按钮
pub const PAGER_PREV: &str = ".list-footer button.page-prev";
/// 列表行
pub const LIST_ROW: &str = "table.akte-list tbody tr";
/// 行内名称单元格
pub const ROW_NAME: &str = "td.klient-name";
/// 列表容器（判断列表是否渲染）
pub const LIST_CONTAINER: &str = "table.akte-list";

/// 详情页标记
pub const DETAIL_MARKER: &str = ".akte-detail .stammdaten-header";
/// 联系数据字段
pub const CONTACT_NAME: &str = ".stammdaten .feld-name";
pub const CONTACT_FILE_NUMBER: &str = ".stammdaten .feld-aktenzeichen";
pub const CONTACT_ADDRESS: &str = ".stammdaten .feld-anschrift";
pub const CONTACT_PHONE: &str = ".stammdaten .feld-telefon";
/// 签章标志（出现则需要生成并上传凭证文书）
pub const SIGNATURE_FLAG: &str = ".akte-detail .unterschrift-vorhanden";

/// 授权窗口字段
pub const AUTH_OPENED: &str = ".genehmigung .feld-beginn";
pub const AUTH_END: &str = ".genehmigung .feld-ende";
pub const AUTH_MAX_AMOUNT: &str = ".genehmigung .feld-hoechstbetrag";

/// 已提交账单记录的行及其单元格
pub const ENTRY_ROW: &str = "table.abrechnung-list tbody tr";
pub const ENTRY_START: &str = "td.zeitraum-von";
pub const ENTRY_END: &str = "td.zeitraum-bis";
pub const ENTRY_AMOUNT: &str = "td.betrag";

/// 返回列表按钮
pub const BACK_BUTTON: &str = ".akte-detail button.zurueck";

/// 账单提交接口（页面内 fetch，复用登录 Cookie）
pub const BILLING_SAVE_ENDPOINT: &str = "/api/akte/abrechnung/save";
/// 凭证文书上传接口
pub const UPLOAD_ENDPOINT: &str = "/api/akte/nachweis/upload";
