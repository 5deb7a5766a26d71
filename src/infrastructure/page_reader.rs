//! 页面读取接缝 - 基础设施层
//!
//! 核心逻辑（状态机、钳制、重复检测）不依赖任何选择器字符串，
//! 只消费这里返回的解析值。每个目标 UI 版本提供一个实现；
//! 测试用内存实现，无需真实浏览器。

use crate::models::{
    AuthorizationWindow, BillingRequest, ContactInfo, ExistingEntry, PagerWindow, RowHandle,
};
use anyhow::Result;
use async_trait::async_trait;

/// 对单个已认证页面的全部读写能力
///
/// 所有方法都是"发起远程动作 + 读取其效果"中的一步，
/// 有界等待由上层（Pager / VisitFlow / 监督器）负责。
#[async_trait]
pub trait PageReader: Send + Sync {
    // ========== 列表与分页 ==========

    /// 读取分页指示。列表未渲染时返回 None（调用方重试）。
    async fn pager_window(&self) -> Result<Option<PagerWindow>>;

    /// 点击"下一页"
    async fn pager_next(&self) -> Result<()>;

    /// 点击"上一页"
    async fn pager_previous(&self) -> Result<()>;

    /// 当前页上可见的行
    async fn visible_rows(&self) -> Result<Vec<RowHandle>>;

    /// 打开某一行的详情
    async fn open_row(&self, row: &RowHandle) -> Result<()>;

    /// 列表是否已渲染
    async fn list_present(&self) -> Result<bool>;

    // ========== 详情页 ==========

    /// 详情页标记是否出现
    async fn detail_marker_present(&self) -> Result<bool>;

    /// 抓取联系数据
    async fn scrape_contact(&self) -> Result<ContactInfo>;

    /// 当前案件是否带有需要凭证文书的签章标志
    async fn needs_attestation(&self) -> Result<bool>;

    /// 上传凭证文书
    async fn upload_document(&self, file_name: &str, content: &[u8]) -> Result<()>;

    /// 抓取授权窗口（日期区间 + 金额上限）
    async fn authorization_window(&self) -> Result<AuthorizationWindow>;

    /// 已提交的账单记录列表
    async fn existing_entries(&self) -> Result<Vec<ExistingEntry>>;

    /// 提交一条账单记录
    async fn submit_billing(&self, request: &BillingRequest) -> Result<()>;

    // ========== 导航 ==========

    /// 从详情页返回列表
    async fn back_to_list(&self) -> Result<()>;

    /// 兜底：直接导航到列表 URL
    async fn goto_list(&self) -> Result<()>;

    /// 刷新当前页面
    async fn reload(&self) -> Result<()>;
}

/// 会话工厂
///
/// 凭据存储与登录表单填写不属于本引擎；会话的获取与重建
/// 只通过这个接口表达。会话重启 = 丢弃旧 reader，重新 open()。
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn PageReader>>;
}
