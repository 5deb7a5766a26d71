use serde::{Deserialize, Serialize};

/// 分页窗口："第 start–end 条 / 共 total 条"
///
/// 不变量：1 <= start <= end <= total。
/// 每次导航后重新读取，不跨运行持久化。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagerWindow {
    pub start: u32,
    pub end: u32,
    pub total: u32,
}

impl PagerWindow {
    pub fn new(start: u32, end: u32, total: u32) -> Self {
        Self { start, end, total }
    }

    /// 窗口是否满足不变量
    pub fn is_valid(&self) -> bool {
        1 <= self.start && self.start <= self.end && self.end <= self.total
    }

    /// 页大小（由窗口边界推导，不另行配置）
    pub fn page_size(&self) -> u32 {
        self.end - self.start + 1
    }

    /// 总页数 = ceil(total / page_size)
    pub fn total_pages(&self) -> u32 {
        let size = self.page_size().max(1);
        self.total.div_ceil(size)
    }

    /// 当前页号（从 1 开始）
    pub fn page_number(&self) -> u32 {
        let size = self.page_size().max(1);
        (self.start - 1) / size + 1
    }
}

impl std::fmt::Display for PagerWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}–{} / {}", self.start, self.end, self.total)
    }
}

/// 案件条目的终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    /// 尚未处理
    Pending,
    /// 全部请求的子操作成功（或确认为无副作用的重复）
    Ok,
    /// 成功但带有警告（非终态信息）
    Warn,
    /// 至少一个请求的子操作失败
    Bad,
}

impl CaseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CaseStatus::Pending => "pending",
            CaseStatus::Ok => "ok",
            CaseStatus::Warn => "warn",
            CaseStatus::Bad => "bad",
        }
    }

    /// ok / bad 为本次运行的终态，warn 只是附加信息
    pub fn is_terminal(self) -> bool {
        matches!(self, CaseStatus::Ok | CaseStatus::Bad)
    }
}

/// 单个子操作（上传 / 账单）的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// 本次运行未请求该操作
    NotRequested,
    /// 操作成功完成
    Done,
    /// 发现已有完全一致的记录，跳过提交（成功路径）
    Duplicate,
    /// 操作失败
    Error,
}

impl StageStatus {
    /// 对终态判定而言是否算成功
    pub fn is_success(self) -> bool {
        matches!(
            self,
            StageStatus::NotRequested | StageStatus::Done | StageStatus::Duplicate
        )
    }
}

/// 案件条目
///
/// 扫描列表时创建，仅由 VisitFlow 修改，运行结束后丢弃。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseItem {
    /// 运行内唯一的稳定标识
    pub key: String,
    /// 列表中显示的名称（定位依据）
    pub name: String,
    /// 最后一次定位成功时所在的分页窗口
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_anchor: Option<PagerWindow>,
    pub status: CaseStatus,
    pub upload_status: StageStatus,
    pub billing_status: StageStatus,
    /// 拼接后的失败/警告原因（如 "上传: … · 账单: …"）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CaseItem {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            page_anchor: None,
            status: CaseStatus::Pending,
            upload_status: StageStatus::NotRequested,
            billing_status: StageStatus::NotRequested,
            error: None,
        }
    }
}

/// 当前页上的一行记录（序号 + 名称，已由 PageReader 解析）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowHandle {
    /// 在当前页内的行号（从 0 开始）
    pub index: usize,
    pub name: String,
}

/// 从详情页抓取的联系数据，用于生成凭证文书
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    /// 案卷号
    pub file_number: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}
