//! 记录定位器 - 业务能力层
//!
//! 在分页列表中按名称找到一行。当前页找不到时，严格地回到第一页
//! 逐页向前扫描：远程排序或记录数可能在两次运行之间变化，
//! 只有锚定第一页的扫描顺序是可复现、保证终止的。

use crate::control::{PollPolicy, RunControl};
use crate::infrastructure::PageReader;
use crate::models::{PagerWindow, RowHandle};
use crate::services::pager::Pager;
use anyhow::Result;
use tokio::time::sleep;
use tracing::{debug, info, warn};

pub struct ItemLocator<'a> {
    reader: &'a dyn PageReader,
    control: &'a RunControl,
    /// 当前页内定位的重试策略（吸收懒渲染）
    locate: PollPolicy,
}

impl<'a> ItemLocator<'a> {
    pub fn new(reader: &'a dyn PageReader, control: &'a RunControl, locate: PollPolicy) -> Self {
        Self {
            reader,
            control,
            locate,
        }
    }

    /// 在当前页上按名称找行
    ///
    /// 固定间隔的有界重试：容忍短暂的空列表（渲染延迟），
    /// 不容忍真正不存在的记录——次数用尽返回 None。
    pub async fn find_on_current_page(&self, name: &str) -> Result<Option<RowHandle>> {
        let wanted = name.trim();
        for attempt in 0..self.locate.attempts {
            let rows = self.reader.visible_rows().await?;
            if let Some(row) = rows.into_iter().find(|r| r.name.trim() == wanted) {
                return Ok(Some(row));
            }
            if self.control.is_stopped() {
                break;
            }
            self.control.pause_point().await;
            if attempt + 1 < self.locate.attempts {
                sleep(self.locate.interval).await;
            }
        }
        Ok(None)
    }

    /// 跨页查找：从第一页起逐页向前扫描
    ///
    /// 无视任何"上次在哪页"的缓存，总是先回到第一页，
    /// 最多扫描 ceil(total/page_size) 页。成功时返回所在的分页窗口，
    /// 供调用方重新锚定 Pager；失败时尽力恢复原窗口。
    pub async fn find_across_all_pages(
        &self,
        pager: &Pager<'_>,
        name: &str,
    ) -> Result<Option<(RowHandle, PagerWindow)>> {
        let original = pager.read().await?;

        pager.rewind_to_first_page().await?;
        let first = pager.read_required().await?;
        let max_pages = first.total_pages().max(1);
        debug!("跨页扫描 {:?}，最多 {} 页", name, max_pages);

        for page in 1..=max_pages {
            if let Some(row) = self.find_on_current_page(name).await? {
                let window = pager.read_required().await?;
                info!("✓ 第 {} 页找到 {:?} ({})", page, name, window);
                return Ok(Some((row, window)));
            }
            if self.control.is_stopped() {
                break;
            }
            if page < max_pages && !pager.next().await? {
                break;
            }
        }

        warn!("⚠️ 扫描 {} 页后未找到 {:?}", max_pages, name);
        if let Some(original) = original {
            let _ = pager.go_to_window_start(original.start).await;
        }
        Ok(None)
    }
}
