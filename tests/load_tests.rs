#[cfg(test)]
mod tests {
    use async_workerpool::{
        pool::{Config, Pool},
        result::{Status, TaskResult},
        task::Task,
    };
    use std::{
        collections::HashSet,
        future::Future,
        time::{Duration, Instant},
    };

    async fn measure<F, Fut, T>(name: &str, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let start = Instant::now();
        let result = f().await;
        let elapsed = start.elapsed();
        println!("✓ {}: {:?}", name, elapsed);
        result
    }

    fn counting_tasks(count: usize, work: Duration) -> Vec<Task> {
        (0..count)
            .map(|i| Task::new(move || {
                std::thread::sleep(work);
                TaskResult::success().with_info(i)
            }))
            .collect()
    }

    async fn collect_all(pool: &Pool, count: usize) -> HashSet<usize> {
        let results = pool.results();
        let mut seen = HashSet::with_capacity(count);
        for _ in 0..count {
            let result = results
                .recv_timeout(Duration::from_secs(10))
                .await
                .expect("все результаты должны прийти");
            assert_eq!(result.status(), Status::Success);
            let value = result.into_info::<usize>().expect("нагрузка - usize");
            assert!(seen.insert(value), "дубликат результата {}", value);
        }
        seen
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn load_test_1_unbuffered_delivery() {
        println!("\n=== LOAD TEST 1: 1k задач, без буфера ===");
        let pool = Pool::new(8, None).unwrap();
        pool.run();

        pool.submit_all(counting_tasks(1_000, Duration::from_micros(100))).unwrap();
        let seen = measure("1k tasks @ 100μs", || collect_all(&pool, 1_000)).await;

        assert_eq!(seen, (0..1_000).collect::<HashSet<_>>());
        assert!(pool.results().try_recv().is_none(), "лишних результатов быть не должно");

        let metrics = pool.metrics();
        println!("  Success rate: {:.1}%", metrics.success_rate() * 100.0);
        assert_eq!(metrics.submitted, 1_000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn load_test_2_buffered_many_submitters() {
        println!("\n=== LOAD TEST 2: 2k задач, буфер, 20 отправителей ===");
        let pool = Pool::with_config(Config::io_bound()).unwrap();
        pool.run();

        for batch in 0..20 {
            let tasks: Vec<Task> = (0..100)
                .map(|i| {
                    let id: usize = batch * 100 + i;
                    Task::from_async(move || async move {
                        tokio::time::sleep(Duration::from_micros(200)).await;
                        TaskResult::success().with_info(id)
                    })
                })
                .collect();
            pool.submit_all(tasks).unwrap();
        }

        let seen = measure("2k async tasks", || collect_all(&pool, 2_000)).await;
        assert_eq!(seen.len(), 2_000);
        assert_eq!(pool.metrics().succeeded, 2_000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn load_test_3_multiple_readers() {
        println!("\n=== LOAD TEST 3: несколько читателей ===");
        let pool = Pool::new(6, Some(32)).unwrap();
        pool.run();
        pool.submit_all(counting_tasks(600, Duration::from_micros(50))).unwrap();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let results = pool.results();
                tokio::spawn(async move {
                    let mut got = Vec::new();
                    while let Ok(result) = results.recv_timeout(Duration::from_millis(500)).await {
                        got.push(result.into_info::<usize>().unwrap());
                    }
                    got
                })
            })
            .collect();

        let mut all = Vec::new();
        for reader in readers {
            all.extend(reader.await.unwrap());
        }
        let unique: HashSet<_> = all.iter().copied().collect();
        println!("  Прочитано: {}", all.len());
        assert_eq!(all.len(), 600, "каждый результат ровно одному читателю");
        assert_eq!(unique.len(), 600);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn load_test_4_drain_then_stop() {
        println!("\n=== LOAD TEST 4: дренаж и остановка ===");
        let pool = Pool::new(4, Some(10)).unwrap();
        pool.run();

        for _ in 0..5 {
            pool.submit_all(counting_tasks(10, Duration::from_millis(5))).unwrap();
        }

        let results = pool.results();
        for _ in 0..50 {
            results.recv_timeout(Duration::from_secs(5)).await.unwrap();
        }

        // После дренажа ни один воркер не занят, stop проходит
        let deadline = Instant::now() + Duration::from_secs(1);
        while pool.loaded() && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        pool.stop().unwrap();
        assert!(pool.wait_stopped_timeout(Duration::from_secs(1)).await);
        assert!(results.recv().await.is_none());
    }
}
