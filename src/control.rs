//! 运行控制句柄与有界轮询
//!
//! 没有模块级可变状态：队列、标志、锚点都通过显式句柄传入各组件，
//! 测试时无需真实远程目标即可驱动引擎。

use crate::error::AutoError;
use anyhow::Result;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::sleep;

/// 运行控制标志
///
/// stop 是协作式的：只在条目之间和各轮询循环的边界处检查，
/// 绝不抢占正在进行的远程动作。pause 只在同样的边界生效。
#[derive(Debug, Default)]
pub struct RunControl {
    paused: AtomicBool,
    stopped: AtomicBool,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新一次运行开始前复位两个标志
    pub fn reset(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.stopped.store(false, Ordering::SeqCst);
    }

    pub fn request_pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn request_resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn request_stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// 暂停点：暂停期间在此等待，收到停止请求时立即返回
    pub async fn pause_point(&self) {
        while self.is_paused() && !self.is_stopped() {
            sleep(Duration::from_millis(100)).await;
        }
    }
}

/// 轮询策略（次数 × 间隔）
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub attempts: usize,
    pub interval: Duration,
}

impl PollPolicy {
    pub fn new(attempts: usize, interval_ms: u64) -> Self {
        Self {
            attempts,
            interval: Duration::from_millis(interval_ms),
        }
    }

    pub fn total_wait_ms(&self) -> u64 {
        self.attempts as u64 * self.interval.as_millis() as u64
    }
}

/// 微轮询：有界等待单个页面条件成立
///
/// 探测为真返回 Ok；次数用尽返回 TIMEOUT。
/// 每次探测之间检查停止/暂停标志，但不会中断一次已发出的探测。
pub async fn poll_until<F, Fut>(
    policy: PollPolicy,
    control: &RunControl,
    what: &str,
    mut probe: F,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    for attempt in 0..policy.attempts {
        if probe().await? {
            return Ok(());
        }
        if control.is_stopped() {
            break;
        }
        control.pause_point().await;
        if attempt + 1 < policy.attempts {
            sleep(policy.interval).await;
        }
    }
    Err(AutoError::timeout(what, policy.total_wait_ms()).into())
}
