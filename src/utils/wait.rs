//! 带上限的轮询等待

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::error::{AppError, AppResult};

/// 默认轮询间隔
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 反复执行 `check` 直到返回 `Some`，或超过 `timeout`
///
/// # 参数
/// - `what`: 超时日志中显示的等待内容
/// - `timeout`: 等待上限
/// - `check`: 检查函数，出错时立即返回该错误
///
/// # 返回
/// 返回 `check` 第一次给出的值；超时返回 `AppError::Timeout`
pub async fn poll_until<T, F, Fut>(what: &str, timeout: Duration, mut check: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<Option<T>>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(value) = check().await? {
            return Ok(value);
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(AppError::timeout(what, timeout));
        }
        sleep(POLL_INTERVAL.min(deadline - now)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_returns_first_ready_value() {
        let calls = AtomicUsize::new(0);
        let value = tokio_test::block_on(poll_until("计数", Duration::from_secs(5), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok((n >= 2).then_some(n)) }
        }))
        .unwrap();

        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_times_out() {
        let err = poll_until::<(), _, _>("永远不会出现", Duration::from_millis(300), || async {
            Ok(None)
        })
        .await
        .unwrap_err();

        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_check_error_is_not_swallowed() {
        let err = poll_until::<(), _, _>("出错", Duration::from_secs(5), || async {
            Err(AppError::from(std::io::Error::other("boom")))
        })
        .await
        .unwrap_err();

        assert!(!err.is_timeout());
    }
}
