use std::future::Future;

use tokio::runtime::Handle;

/// Drives an SDK future to completion from synchronous code.
///
/// Must be called from a plain thread or a `spawn_blocking` worker, never from
/// inside a task polled by the runtime. `handle` should belong to a
/// multi-thread runtime: a current-thread runtime only drives IO while some
/// thread sits in its `Runtime::block_on`, so a call from a plain thread can
/// hang.
pub fn poll_until_ready_error<Fut, T, E>(handle: &Handle, future: Fut) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
{
    poll_until_ready(handle, future)
}

pub fn poll_until_ready<Fut, T>(handle: &Handle, future: Fut) -> T
where
    Fut: Future<Output = T>,
{
    handle.block_on(future)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_until_ready_on_worker_thread() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let handle = runtime.handle().clone();

        let result = std::thread::spawn(move || {
            poll_until_ready(&handle, async {
                tokio::task::yield_now().await;
                7
            })
        })
        .join()
        .unwrap();

        assert_eq!(result, 7);
    }

    #[test]
    fn test_poll_until_ready_error_passes_error_through() {
        let runtime = tokio::runtime::Runtime::new().unwrap();

        let result: Result<(), String> =
            poll_until_ready_error(runtime.handle(), async { Err("boom".to_string()) });

        assert_eq!(result, Err("boom".to_string()));
    }

    #[test]
    fn test_poll_until_ready_drives_timers_from_plain_thread() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let handle = runtime.handle().clone();

        let result = std::thread::spawn(move || {
            poll_until_ready(&handle, async {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                "woke"
            })
        })
        .join()
        .unwrap();

        assert_eq!(result, "woke");
    }
}
