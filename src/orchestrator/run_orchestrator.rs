//! 运行编排器 - 编排层
//!
//! 持有工作队列与运行状态，串行处理条目（单会话、单工作者），
//! 在每个条目前后检查暂停/停止标志，向事件通道汇报进度。
//!
//! 队列在运行开始时冻结：运行中不支持重新扫描列表。
//! 会话锁保证两次运行的远程导航绝不交错。

use crate::config::{Config, RunConfig};
use crate::control::{PollPolicy, RunControl};
use crate::error::AutoError;
use crate::infrastructure::{PageReader, SessionFactory};
use crate::models::{CaseItem, CaseStatus, DateRange, PagerWindow};
use crate::orchestrator::events::{emit, EventSender, ProgressEvent};
use crate::orchestrator::supervisor::RetryRestartSupervisor;
use crate::services::{BillingOutcome, BillingService, DocumentService, Pager};
use crate::workflow::{VisitCtx, VisitFlow};
use anyhow::{Context, Result};
use std::sync::{Arc, Mutex};
use tracing::info;

/// 运行状态快照
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RunState {
    pub queue: Vec<CaseItem>,
    pub running: bool,
    pub paused: bool,
    pub stopped: bool,
    pub page_anchor: Option<PagerWindow>,
    pub total_count: u32,
}

pub struct RunOrchestrator {
    config: Config,
    run_config: RunConfig,
    factory: Arc<dyn SessionFactory>,
    control: Arc<RunControl>,
    state: Arc<Mutex<RunState>>,
    events: EventSender,
    /// 会话独占锁：两次运行绝不交错使用同一自动化会话
    session_lock: Arc<tokio::sync::Mutex<()>>,
}

impl RunOrchestrator {
    pub fn new(
        config: Config,
        run_config: RunConfig,
        factory: Arc<dyn SessionFactory>,
        events: EventSender,
    ) -> Self {
        Self {
            config,
            run_config,
            factory,
            control: Arc::new(RunControl::new()),
            state: Arc::new(Mutex::new(RunState::default())),
            events,
            session_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn control(&self) -> Arc<RunControl> {
        self.control.clone()
    }

    /// 当前运行状态快照
    pub fn get_state(&self) -> RunState {
        self.state.lock().expect("run state poisoned").clone()
    }

    pub fn pause(&self) {
        self.control.request_pause();
        self.state.lock().expect("run state poisoned").paused = true;
        info!("⏸ 暂停请求已登记（在条目间或轮询边界生效）");
        emit(&self.events, ProgressEvent::of("run_paused"));
    }

    pub fn resume(&self) {
        self.control.request_resume();
        self.state.lock().expect("run state poisoned").paused = false;
        info!("▶ 继续处理");
        emit(&self.events, ProgressEvent::of("run_resumed"));
    }

    /// 协作式停止：不抢占进行中的远程动作
    pub fn stop(&self) {
        self.control.request_stop();
        self.state.lock().expect("run state poisoned").stopped = true;
        info!("⏹ 停止请求已登记（当前条目完成后生效）");
        emit(&self.events, ProgressEvent::of("run_stop_requested"));
    }

    /// 执行一次完整运行
    ///
    /// 唯一会拒绝运行的错误是拿不到会话锁；
    /// 其后任何单条目失败都只影响该条目。
    pub async fn run(&self, from_index: usize) -> Result<()> {
        let _guard = self
            .session_lock
            .clone()
            .try_lock_owned()
            .map_err(|_| AutoError::validation("自动化会话已被另一运行占用"))?;

        self.control.reset();
        emit(&self.events, ProgressEvent::of("run_started"));

        let requested = self.run_config.requested_range()?;
        let flow = VisitFlow::new(&self.config, self.run_config.clone(), requested);
        let mut supervisor = RetryRestartSupervisor::start(
            self.factory.clone(),
            self.config.refresh_retry_limit,
            self.config.session_restart_limit,
            self.events.clone(),
        )
        .await
        .context("无法打开自动化会话")?;

        // 队列在此刻冻结
        let items = self.scrape_with_reader(supervisor.reader()).await?;
        let total = items.len();
        {
            let mut state = self.state.lock().expect("run state poisoned");
            state.queue = items.clone();
            state.total_count = items.len() as u32;
            state.running = true;
            state.stopped = false;
        }
        info!("📋 队列就绪: {} 个条目，从第 {} 个开始", total, from_index + 1);

        for (idx, mut item) in items.into_iter().enumerate() {
            if idx < from_index {
                continue;
            }
            if self.control.is_stopped() {
                break;
            }
            self.control.pause_point().await;
            if self.control.is_stopped() {
                break;
            }

            // 跳过集：中性跳过，不算成功也不算失败
            if self.run_config.skip_keys.contains(&item.key) {
                info!("⤼ 跳过条目 {}", item.key);
                emit(&self.events, ProgressEvent::for_item("item_skipped", &item));
                continue;
            }

            let ctx = VisitCtx::new(item.key.clone(), item.name.clone(), idx + 1, total);
            emit(&self.events, ProgressEvent::for_item("item_started", &item));

            supervisor
                .process_item(&flow, &self.control, &mut item, &ctx)
                .await;

            {
                let mut state = self.state.lock().expect("run state poisoned");
                if item.page_anchor.is_some() {
                    state.page_anchor = item.page_anchor;
                }
                if let Some(slot) = state.queue.get_mut(idx) {
                    *slot = item.clone();
                }
            }
            let event_name = format!("item_{}", item.status.as_str());
            emit(&self.events, ProgressEvent::for_item(event_name, &item));
        }

        let stopped = self.control.is_stopped();
        {
            let mut state = self.state.lock().expect("run state poisoned");
            state.running = false;
            state.stopped = stopped;
        }
        if stopped {
            info!("⏹ 运行已停止");
            emit(&self.events, ProgressEvent::of("run_stopped"));
        } else {
            info!("✅ 运行完成");
            emit(&self.events, ProgressEvent::of("run_finished"));
        }
        Ok(())
    }

    /// 扫描整个列表，构建冻结队列
    pub async fn scrape_with_reader(&self, reader: &dyn PageReader) -> Result<Vec<CaseItem>> {
        let poll = PollPolicy::new(self.config.poll_attempts, self.config.poll_interval_ms);
        let pager = Pager::new(reader, &self.control, poll);

        pager.rewind_to_first_page().await?;
        let mut window = pager.read_required().await?;
        let filter = self
            .run_config
            .search_filter
            .as_deref()
            .map(|f| f.to_lowercase());

        let mut items = Vec::new();
        loop {
            let rows = reader.visible_rows().await?;
            for row in rows {
                let name = row.name.trim().to_string();
                if name.is_empty() {
                    continue;
                }
                if let Some(filter) = &filter {
                    if !name.to_lowercase().contains(filter) {
                        continue;
                    }
                }
                // key 按列表中的绝对位置生成，运行内稳定且唯一
                let absolute = window.start as usize + row.index;
                let mut item = CaseItem::new(format!("{:04}-{}", absolute, name), name);
                item.page_anchor = Some(window);
                items.push(item);
            }

            if self.control.is_stopped() || !pager.next().await? {
                break;
            }
            window = pager.read_required().await?;
        }

        info!("✓ 列表扫描完成: {} 个条目 (共 {} 条记录)", items.len(), window.total);
        emit(&self.events, ProgressEvent::of("scrape_finished"));
        Ok(items)
    }

    /// SCRAPE_LIST 命令：独立扫描（不启动运行）
    pub async fn scrape_list(&self) -> Result<Vec<CaseItem>> {
        let _guard = self
            .session_lock
            .clone()
            .try_lock_owned()
            .map_err(|_| AutoError::validation("自动化会话已被另一运行占用"))?;
        let reader = self.factory.open().await?;
        let items = self.scrape_with_reader(reader.as_ref()).await?;
        {
            let mut state = self.state.lock().expect("run state poisoned");
            state.total_count = items.len() as u32;
            state.queue = items.clone();
        }
        Ok(items)
    }

    /// VISIT_ONE 命令：处理单个条目
    pub async fn visit_one(&self, key: &str, name: &str) -> Result<CaseItem> {
        let _guard = self
            .session_lock
            .clone()
            .try_lock_owned()
            .map_err(|_| AutoError::validation("自动化会话已被另一运行占用"))?;

        let requested = self.run_config.requested_range()?;
        let flow = VisitFlow::new(&self.config, self.run_config.clone(), requested);
        let mut supervisor = RetryRestartSupervisor::start(
            self.factory.clone(),
            self.config.refresh_retry_limit,
            self.config.session_restart_limit,
            self.events.clone(),
        )
        .await?;

        let mut item = CaseItem::new(key, name);
        let ctx = VisitCtx::new(item.key.clone(), item.name.clone(), 1, 1);
        supervisor
            .process_item(&flow, &self.control, &mut item, &ctx)
            .await;
        Ok(item)
    }

    /// ENTER_BILLING 命令：对当前打开的详情页录入一条账单
    pub async fn enter_billing_once(
        &self,
        range: DateRange,
        rate_per_day_cents: i64,
        proof_reference: &str,
    ) -> Result<BillingOutcome> {
        let reader = self.factory.open().await?;
        let billing = BillingService::new(PollPolicy::new(
            self.config.poll_attempts,
            self.config.poll_interval_ms,
        ));
        billing
            .enter_billing(
                reader.as_ref(),
                &self.control,
                range,
                rate_per_day_cents,
                self.run_config.explicit_amount_cents,
                proof_reference,
            )
            .await
    }

    /// GENERATE_AND_UPLOAD 命令：为当前详情页生成并上传凭证文书
    pub async fn generate_and_upload_once(
        &self,
        backend_url: &str,
        range: DateRange,
    ) -> Result<String> {
        let reader = self.factory.open().await?;
        let documents = DocumentService::new(backend_url);
        let contact = reader.scrape_contact().await?;
        let document = documents.generate(&contact, range).await?;
        reader
            .upload_document(&document.file_name, &document.content)
            .await?;
        info!("✓ 文书生成并上传完成: {}", document.file_name);
        Ok(document.reference)
    }
}

/// 汇总一次运行的结果（日志输出用）
pub fn summarize(queue: &[CaseItem]) -> (usize, usize, usize, usize) {
    let mut ok = 0;
    let mut warn_count = 0;
    let mut bad = 0;
    let mut pending = 0;
    for item in queue {
        match item.status {
            CaseStatus::Ok => ok += 1,
            CaseStatus::Warn => warn_count += 1,
            CaseStatus::Bad => bad += 1,
            CaseStatus::Pending => pending += 1,
        }
    }
    (ok, warn_count, bad, pending)
}
