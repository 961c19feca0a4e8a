//! 有界并发映射
//!
//! 固定数量的 worker 从共享游标领取下一个下标，结果按原始顺序返回。
//! worker `k` 在第一次领取前等待 `k × stagger`，避免同时打满共享的限流额度。

use futures::future::try_join_all;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::sleep;

/// 以最多 `concurrency` 个 worker 并发执行 `f`，结果与 `items` 顺序一致
///
/// 任意一次 `f` 返回错误时，第一个错误直接返回给调用方，其余 worker 不再领取新任务
pub async fn map_with_concurrency<'a, T, R, E, F, Fut>(
    items: &'a [T],
    concurrency: usize,
    stagger: Duration,
    f: F,
) -> Result<Vec<R>, E>
where
    F: Fn(&'a T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    let cursor = AtomicUsize::new(0);
    let worker_count = concurrency.min(items.len());

    let workers = (0..worker_count).map(|worker_index| {
        let cursor = &cursor;
        let f = &f;
        async move {
            if worker_index > 0 {
                sleep(stagger * worker_index as u32).await;
            }
            let mut finished = Vec::new();
            loop {
                let idx = cursor.fetch_add(1, Ordering::SeqCst);
                if idx >= items.len() {
                    break;
                }
                finished.push((idx, f(&items[idx]).await?));
            }
            Ok::<_, E>(finished)
        }
    });

    let per_worker = try_join_all(workers).await?;

    let mut slots: Vec<Option<R>> = (0..items.len()).map(|_| None).collect();
    for (idx, result) in per_worker.into_iter().flatten() {
        slots[idx] = Some(result);
    }
    Ok(slots.into_iter().flatten().collect())
}
