use async_workerpool::{Config, Pool, Status, Task, TaskResult};
use tokio::runtime::Builder;
use tracing_subscriber::EnvFilter;
use std::time::{Duration, Instant};


fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let rt = Builder::new_multi_thread()
        .enable_all()
        .build()?;

    rt.block_on(async {
        let config = Config::from_env()?;
        let pool = Pool::with_config(config)?;
        pool.run();

        let now = Instant::now();
        let tasks: Vec<Task> = (1..=5)
            .map(|i| Task::new(move || {
                std::thread::sleep(Duration::from_millis(100));
                if i == 4 {
                    TaskResult::failed().with_info(String::from("some error description"))
                } else {
                    TaskResult::success().with_info(i)
                }
            }))
            .collect();
        let total = tasks.len();
        pool.submit_all(tasks)?;

        let results = pool.results();
        for _ in 0..total {
            let Some(result) = results.recv().await else { break };
            match result.status() {
                Status::Success => println!("result: success {:?}", result.info_ref::<i32>()),
                Status::Failed => println!("result: failed {:?}", result.info_ref::<String>()),
            }
        }

        while pool.loaded() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        pool.stop()?;
        pool.wait_stopped().await;

        println!("elapsed: {:?}, {:?}", now.elapsed(), pool.metrics());
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
