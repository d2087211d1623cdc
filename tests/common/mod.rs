#![allow(dead_code)]

use std::{future::Future, sync::Arc, time::Duration};

use herald::{event::EventWaiter, platform::memory::InMemoryPlatform};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[ctor::ctor]
fn init_tests() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

pub fn attached_platform() -> (Arc<InMemoryPlatform>, Arc<EventWaiter>) {
    let platform = Arc::new(InMemoryPlatform::new());
    let waiter = Arc::new(EventWaiter::new());
    waiter.attach(platform.as_ref());
    (platform, waiter)
}

/// Polls `check` until it yields a value, failing the test after one second.
pub async fn eventually<T, F, Fut>(mut check: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for _ in 0..200 {
        if let Some(value) = check().await {
            return value;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}
