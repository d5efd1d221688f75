//! Tasks and generators are plain futures and streams, so a foreign
//! executor can drive them too.

use core_coro::executor::SerialExecutor;
use core_coro::{AsyncGenerator, Generator, Task, Yielder};

use futures::StreamExt;
use std::time::Duration;

async fn doubled(value: u32) -> anyhow::Result<u32> {
    Ok(value * 2)
}

#[tokio::test]
async fn test_task_awaited_on_tokio() {
    let value = Task::new(doubled(21)).await.unwrap();
    assert_eq!(value, 42);
}

#[tokio::test]
async fn test_generator_as_stream_on_tokio() {
    let values: Vec<u32> = AsyncGenerator::from(Generator::from_items(vec![1, 2, 3]))
        .map(|value| value * 10)
        .filter_map(|item| async move { item.ok() })
        .collect()
        .await;
    assert_eq!(values, vec![10, 20, 30]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_timer_wakes_tokio_task() {
    let executor = SerialExecutor::new();
    let timer = executor.handle();
    let ticks = AsyncGenerator::new(move |co: Yielder<u8>| async move {
        for tick in 0..2 {
            timer.sleep(Duration::from_millis(2)).await?;
            co.yield_value(tick).await;
        }
        anyhow::Ok(())
    });

    let values = ticks.collect().await.unwrap();
    assert_eq!(values, vec![0, 1]);
}

#[tokio::test]
async fn test_spawned_task_runs_on_tokio() {
    let handle = tokio::spawn(Task::new(doubled(4)));
    assert_eq!(handle.await.unwrap().unwrap(), 8);
}
