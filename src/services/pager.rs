//! 分页器 - 业务能力层
//!
//! 读取列表的分页指示（"start–end / total"），推导页大小与总页数，
//! 发起前后翻页。翻页是"点击 + 有界等待窗口变化"，没有特权跳转。

use crate::control::{poll_until, PollPolicy, RunControl};
use crate::error::AutoError;
use crate::infrastructure::PageReader;
use crate::models::PagerWindow;
use anyhow::Result;
use tokio::time::sleep;
use tracing::{debug, warn};

pub struct Pager<'a> {
    reader: &'a dyn PageReader,
    control: &'a RunControl,
    poll: PollPolicy,
}

impl<'a> Pager<'a> {
    pub fn new(reader: &'a dyn PageReader, control: &'a RunControl, poll: PollPolicy) -> Self {
        Self {
            reader,
            control,
            poll,
        }
    }

    /// 读取当前分页窗口；列表未渲染时返回 None
    pub async fn read(&self) -> Result<Option<PagerWindow>> {
        self.reader.pager_window().await
    }

    /// 读取分页窗口，未渲染时有界轮询直到出现
    pub async fn read_required(&self) -> Result<PagerWindow> {
        for attempt in 0..self.poll.attempts {
            if let Some(window) = self.reader.pager_window().await? {
                return Ok(window);
            }
            if self.control.is_stopped() {
                break;
            }
            self.control.pause_point().await;
            if attempt + 1 < self.poll.attempts {
                sleep(self.poll.interval).await;
            }
        }
        Err(AutoError::timeout("分页指示", self.poll.total_wait_ms()).into())
    }

    /// 翻到下一页
    ///
    /// 阻塞直到窗口边界变化或超时；返回是否翻页成功。
    /// 已在最后一页时不点击，直接返回 false。
    pub async fn next(&self) -> Result<bool> {
        let before = self.read_required().await?;
        if before.end >= before.total {
            return Ok(false);
        }

        self.reader.pager_next().await?;
        self.wait_window_change(before).await
    }

    /// 翻到上一页；已在第一页时直接返回 false
    pub async fn previous(&self) -> Result<bool> {
        let before = self.read_required().await?;
        if before.start <= 1 {
            return Ok(false);
        }

        self.reader.pager_previous().await?;
        self.wait_window_change(before).await
    }

    /// 导航到以第 n 条记录开头的窗口
    ///
    /// 只由 previous/next 原语组合而成：先回退到第一页，再前进。
    /// 若 total 在两次读取之间缩小（记录被删除），目标会被钳制到
    /// 仍然有效的最后一个窗口起点。
    pub async fn go_to_window_start(&self, n: u32) -> Result<bool> {
        let window = self.read_required().await?;
        let size = window.page_size().max(1);
        let last_valid_start = (window.total_pages().max(1) - 1) * size + 1;
        let target = n.min(last_valid_start);

        debug!("导航到窗口起点 {} (钳制后 {})", n, target);

        self.rewind_to_first_page().await?;

        // 前进到目标窗口
        let mut guard = self.read_required().await?.total_pages() + 1;
        while guard > 0 {
            let current = self.read_required().await?;
            if current.start >= target {
                return Ok(current.start == target);
            }
            if !self.next().await? {
                break;
            }
            guard -= 1;
        }

        warn!("未能到达窗口起点 {}", target);
        Ok(false)
    }

    /// 回退到第一页（有界：最多 total_pages 次）
    pub async fn rewind_to_first_page(&self) -> Result<()> {
        let mut guard = self.read_required().await?.total_pages() + 1;
        while guard > 0 {
            let current = self.read_required().await?;
            if current.start <= 1 {
                return Ok(());
            }
            if !self.previous().await? {
                break;
            }
            guard -= 1;
        }
        Err(AutoError::element_not_found("第一页").into())
    }

    /// 点击后有界等待窗口边界发生变化
    async fn wait_window_change(&self, before: PagerWindow) -> Result<bool> {
        let reader = self.reader;
        let changed = poll_until(self.poll, self.control, "分页窗口变化", || async move {
            match reader.pager_window().await? {
                Some(now) => Ok(now.start != before.start || now.end != before.end),
                None => Ok(false),
            }
        })
        .await;

        match changed {
            Ok(()) => Ok(true),
            Err(e) => {
                // 超时视为翻页失败，交由调用方决定是否重试
                if crate::error::classify(&e) == crate::error::ErrorKind::Timeout {
                    warn!("翻页后窗口未变化: {}", before);
                    Ok(false)
                } else {
                    Err(e)
                }
            }
        }
    }
}
