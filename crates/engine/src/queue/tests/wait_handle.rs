// Copyright The ringflow Authors
// SPDX-License-Identifier: Apache-2.0

use crate::queue::WaitHandle;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn set_and_reset_toggle_state() {
    let handle = WaitHandle::new(false);
    assert!(!handle.is_set());
    handle.set();
    handle.set();
    assert!(handle.is_set());
    handle.reset();
    assert!(!handle.is_set());
    assert!(WaitHandle::new(true).is_set());
}

#[test]
fn wait_timeout_reports_expiry_and_wakeup() {
    let handle = WaitHandle::new(false);
    assert!(!handle.wait_timeout(Duration::from_millis(10)));

    std::thread::scope(|scope| {
        _ = scope.spawn(|| {
            std::thread::sleep(Duration::from_millis(10));
            handle.set();
        });
        assert!(handle.wait_timeout(Duration::from_secs(5)));
    });
}

#[tokio::test(flavor = "current_thread")]
async fn async_wait_completes_once_set() {
    let handle = Arc::new(WaitHandle::new(false));
    assert!(!handle.wait_async_timeout(Duration::from_millis(10)).await);

    let setter = handle.clone();
    let task = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        setter.set();
    });
    handle.wait().await;
    task.await.expect("setter task should finish");

    assert!(handle.wait_async_timeout(Duration::from_millis(1)).await);
}
