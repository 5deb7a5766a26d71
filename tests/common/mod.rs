//! 测试公用：内存版 PageReader / SessionFactory
//!
//! 模拟一个分页案件列表与详情页，支持故障注入
//! （渲染失败、会话丢失、验证延迟），无需真实浏览器。

use anyhow::Result;
use async_trait::async_trait;
use case_invoice_submit::error::AutoError;
use case_invoice_submit::infrastructure::{PageReader, SessionFactory};
use case_invoice_submit::models::{
    AuthorizationWindow, BillingRequest, ContactInfo, ExistingEntry, PagerWindow, RowHandle,
};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 模拟远程系统的全部可变状态（会话重启后仍然存在）
pub struct MockState {
    pub names: Vec<String>,
    pub page_size: usize,
    /// 当前页（从 1 开始）
    pub current_page: usize,
    /// 打开的详情页对应的记录名
    pub detail_open: Option<String>,
    pub default_auth: AuthorizationWindow,
    pub auth_overrides: HashMap<String, AuthorizationWindow>,
    pub entries: HashMap<String, Vec<ExistingEntry>>,
    pub uploads: Vec<(String, String)>,
    pub submissions: Vec<(String, BillingRequest)>,
    pub needs_attestation: bool,
    // --- 故障注入 ---
    /// visible_rows 先失败 N 次
    pub fail_visible_rows: usize,
    /// 下一次 submit_billing 抛会话丢失
    pub submit_session_lost: bool,
    /// existing_entries 隐藏最新一条记录 N 次（模拟渲染延迟）
    pub delay_verify: usize,
    /// 每次成功提交后的回调（测试用来触发 stop 等）
    pub on_submit: Option<Box<dyn Fn() + Send + Sync>>,
    // --- 观察计数 ---
    pub reload_count: usize,
    pub visible_rows_pages: Vec<usize>,
}

impl MockState {
    pub fn new(names: &[&str], page_size: usize) -> Self {
        Self {
            names: names.iter().map(|s| s.to_string()).collect(),
            page_size,
            current_page: 1,
            detail_open: None,
            default_auth: AuthorizationWindow {
                opened: date(2024, 1, 1),
                authorized_end: date(2024, 12, 31),
                max_amount_cents: 1_000_000,
            },
            auth_overrides: HashMap::new(),
            entries: HashMap::new(),
            uploads: Vec::new(),
            submissions: Vec::new(),
            needs_attestation: false,
            fail_visible_rows: 0,
            submit_session_lost: false,
            delay_verify: 0,
            on_submit: None,
            reload_count: 0,
            visible_rows_pages: Vec::new(),
        }
    }

    fn total_pages(&self) -> usize {
        self.names.len().div_ceil(self.page_size).max(1)
    }

    fn window(&self) -> PagerWindow {
        let total = self.names.len() as u32;
        let start = ((self.current_page - 1) * self.page_size + 1) as u32;
        let end = (self.current_page * self.page_size).min(self.names.len()) as u32;
        PagerWindow::new(start, end, total)
    }

    fn page_slice(&self) -> &[String] {
        let from = (self.current_page - 1) * self.page_size;
        let to = (from + self.page_size).min(self.names.len());
        &self.names[from..to]
    }
}

pub struct MockPageReader {
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl PageReader for MockPageReader {
    async fn pager_window(&self) -> Result<Option<PagerWindow>> {
        let state = self.state.lock().unwrap();
        if state.detail_open.is_some() {
            return Ok(None);
        }
        Ok(Some(state.window()))
    }

    async fn pager_next(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.current_page < state.total_pages() {
            state.current_page += 1;
        }
        Ok(())
    }

    async fn pager_previous(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.current_page > 1 {
            state.current_page -= 1;
        }
        Ok(())
    }

    async fn visible_rows(&self) -> Result<Vec<RowHandle>> {
        let mut state = self.state.lock().unwrap();
        if state.fail_visible_rows > 0 {
            state.fail_visible_rows -= 1;
            return Err(AutoError::element_not_found("列表行").into());
        }
        let page = state.current_page;
        state.visible_rows_pages.push(page);
        Ok(state
            .page_slice()
            .iter()
            .enumerate()
            .map(|(index, name)| RowHandle {
                index,
                name: name.clone(),
            })
            .collect())
    }

    async fn open_row(&self, row: &RowHandle) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let name = state
            .page_slice()
            .get(row.index)
            .cloned()
            .ok_or_else(|| AutoError::element_not_found("列表行"))?;
        state.detail_open = Some(name);
        Ok(())
    }

    async fn list_present(&self) -> Result<bool> {
        Ok(self.state.lock().unwrap().detail_open.is_none())
    }

    async fn detail_marker_present(&self) -> Result<bool> {
        Ok(self.state.lock().unwrap().detail_open.is_some())
    }

    async fn scrape_contact(&self) -> Result<ContactInfo> {
        let state = self.state.lock().unwrap();
        let name = state
            .detail_open
            .clone()
            .ok_or_else(|| AutoError::element_not_found("详情页"))?;
        Ok(ContactInfo {
            file_number: format!("AZ-{}", name.len()),
            name,
            address: "Teststraße 1, 10115 Berlin".to_string(),
            phone: None,
        })
    }

    async fn needs_attestation(&self) -> Result<bool> {
        Ok(self.state.lock().unwrap().needs_attestation)
    }

    async fn upload_document(&self, file_name: &str, _content: &[u8]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let record = state.detail_open.clone().unwrap_or_default();
        state.uploads.push((record, file_name.to_string()));
        Ok(())
    }

    async fn authorization_window(&self) -> Result<AuthorizationWindow> {
        let state = self.state.lock().unwrap();
        let name = state
            .detail_open
            .clone()
            .ok_or_else(|| AutoError::element_not_found("授权窗口"))?;
        Ok(state
            .auth_overrides
            .get(&name)
            .copied()
            .unwrap_or(state.default_auth))
    }

    async fn existing_entries(&self) -> Result<Vec<ExistingEntry>> {
        let mut state = self.state.lock().unwrap();
        let name = state
            .detail_open
            .clone()
            .ok_or_else(|| AutoError::element_not_found("账单列表"))?;
        let mut list = state.entries.get(&name).cloned().unwrap_or_default();
        if state.delay_verify > 0 {
            state.delay_verify -= 1;
            list.pop();
        }
        Ok(list)
    }

    async fn submit_billing(&self, request: &BillingRequest) -> Result<()> {
        let hook = {
            let mut state = self.state.lock().unwrap();
            if state.submit_session_lost {
                state.submit_session_lost = false;
                return Err(AutoError::session_lost("连接中断").into());
            }
            let name = state
                .detail_open
                .clone()
                .ok_or_else(|| AutoError::element_not_found("账单表单"))?;
            state.submissions.push((name.clone(), request.clone()));
            state.entries.entry(name).or_default().push(ExistingEntry {
                start: request.start,
                end: request.end,
                amount_cents: request.amount_cents,
            });
            state.on_submit.take()
        };
        // 在锁外触发回调，回调用完即弃
        if let Some(hook) = hook {
            hook();
        }
        Ok(())
    }

    async fn back_to_list(&self) -> Result<()> {
        self.state.lock().unwrap().detail_open = None;
        Ok(())
    }

    async fn goto_list(&self) -> Result<()> {
        self.state.lock().unwrap().detail_open = None;
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.reload_count += 1;
        state.detail_open = None;
        Ok(())
    }
}

/// 共享同一份远程状态的会话工厂（重启后数据仍在）
pub struct MockSessionFactory {
    pub state: Arc<Mutex<MockState>>,
    pub open_count: AtomicUsize,
}

impl MockSessionFactory {
    pub fn new(state: MockState) -> Arc<Self> {
        Arc::new(Self {
            state: Arc::new(Mutex::new(state)),
            open_count: AtomicUsize::new(0),
        })
    }

    pub fn opens(&self) -> usize {
        self.open_count.load(Ordering::SeqCst)
    }

    pub fn with_state<T>(&self, f: impl FnOnce(&mut MockState) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }
}

#[async_trait]
impl SessionFactory for MockSessionFactory {
    async fn open(&self) -> Result<Box<dyn PageReader>> {
        self.open_count.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockPageReader {
            state: self.state.clone(),
        }))
    }
}

/// 测试用的快速配置（毫秒级轮询间隔）
pub fn fast_config() -> case_invoice_submit::Config {
    case_invoice_submit::Config {
        poll_attempts: 3,
        poll_interval_ms: 1,
        locate_attempts: 2,
        locate_interval_ms: 1,
        refresh_retry_limit: 3,
        session_restart_limit: 2,
        ..case_invoice_submit::Config::default()
    }
}

/// 测试用运行配置：账单期间 2024-01-10 – 2024-01-20，日费率 48 分
pub fn fast_run_config() -> case_invoice_submit::RunConfig {
    case_invoice_submit::RunConfig {
        billing_start: "2024-01-10".to_string(),
        billing_end: "2024-01-20".to_string(),
        rate_per_day_cents: 48,
        explicit_amount_cents: None,
        upload_enabled: false,
        billing_enabled: true,
        skip_keys: Vec::new(),
        search_filter: None,
        proof_reference: Some("NW-TEST".to_string()),
    }
}
