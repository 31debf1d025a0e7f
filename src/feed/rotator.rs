//! 周期换图驱动。
//!
//! 每条 feed 一个后台任务，按 [`FeedTiming::scan_interval`] 周期调用
//! `update()`；手动触发走每条 feed 自己的 Notify 立即唤醒并重置计时，
//! 任务正忙时触发以许可保留，回到等待点再消费。周期换图的失败不终止
//! 轮询，记日志并走事件广播。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::error;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::interval;

use crate::emitter::{FeedEmitter, FeedEvent};
use crate::feed::PhotoFeed;

pub struct FeedRotator {
    emitter: Arc<FeedEmitter>,
    running: Arc<AtomicBool>,
    tasks: Mutex<Vec<FeedTask>>,
}

/// 一条 feed 的轮询任务句柄与它的手动触发器
struct FeedTask {
    handle: JoinHandle<()>,
    trigger: Arc<Notify>,
}

impl FeedRotator {
    pub fn new(emitter: Arc<FeedEmitter>) -> Self {
        Self {
            emitter,
            running: Arc::new(AtomicBool::new(false)),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// 为每条 feed 起一个周期换图任务。重复调用会先停掉上一批任务。
    pub fn start(&self, feeds: Vec<Arc<PhotoFeed>>) {
        self.stop();
        self.running.store(true, Ordering::Release);

        if let Ok(mut tasks) = self.tasks.lock() {
            for feed in feeds {
                let running = Arc::clone(&self.running);
                let trigger = Arc::new(Notify::new());
                let emitter = Arc::clone(&self.emitter);
                let handle = tokio::spawn({
                    let trigger = Arc::clone(&trigger);
                    async move {
                        run_feed_loop(feed, running, trigger, emitter).await;
                    }
                });
                tasks.push(FeedTask { handle, trigger });
            }
        }
    }

    /// 立即给所有 feed 换一张，并让它们的周期计时从现在重新起算。
    /// 任务没停在等待点（换图进行中、刚 spawn 还没被轮询）时，notify_one
    /// 的许可会留到它下次进入等待立刻消费，触发不会丢。
    pub fn trigger_now(&self) {
        if let Ok(tasks) = self.tasks.lock() {
            for task in tasks.iter() {
                task.trigger.notify_one();
            }
        }
    }

    /// 停止全部换图任务；进行中的换图一并打断。
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        if let Ok(mut tasks) = self.tasks.lock() {
            for task in tasks.drain(..) {
                task.handle.abort();
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for FeedRotator {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_feed_loop(
    feed: Arc<PhotoFeed>,
    running: Arc<AtomicBool>,
    trigger: Arc<Notify>,
    emitter: Arc<FeedEmitter>,
) {
    let mut ticker = interval(feed.timing().scan_interval);
    // tokio interval 第一次 tick 立刻到期；先消费掉，让周期从一个完整间隔后开始
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => { /* 定时 */ }
            _ = trigger.notified() => {
                // 手动触发后重置计时，下一次自动换图从现在重新起算
                ticker.reset();
            }
        }
        if !running.load(Ordering::Acquire) {
            break;
        }

        if let Err(e) = feed.update().await {
            error!("Failed to update feed {}: {}", feed.unique_id(), e);
            emitter.emit(FeedEvent::UpdateFailed {
                source_id: feed.unique_id().to_string(),
                error: e.to_string(),
            });
        }
    }
}
