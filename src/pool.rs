use super::{
    errors::{PoolError, Result},
    handle::Results,
    model::PoolMetrics,
    result::{Status, TaskResult},
    task::{Task, TaskKind},
};
use std::{
    any::Any,
    panic::AssertUnwindSafe,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, PoisonError,
    },
};
use flume::{Receiver, Sender};
use futures::FutureExt;
use tokio::time::Duration;
use tokio_util::{
    sync::CancellationToken,
    task::TaskTracker,
};
use tracing::{debug, error, warn};


/// Конфигурация пула воркеров
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub num_workers: usize,
    /// Общая емкость канала задач и канала результатов. `None` - без буфера.
    pub buffer_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_workers: num_cpus::get(),
            buffer_size: None,
        }
    }
}

impl Config {
    pub fn cpu_bound() -> Self {
        Self {
            num_workers: num_cpus::get(),
            buffer_size: None,
        }
    }

    pub fn io_bound() -> Self {
        let num_cpus = num_cpus::get();
        Self {
            num_workers: num_cpus * 2,
            buffer_size: Some(num_cpus * 20),
        }
    }

    /// Значения по умолчанию, переопределенные `POOL_WORKERS` и `POOL_BUFFER`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("POOL_WORKERS") {
            config.num_workers = parse_env("POOL_WORKERS", &raw)?;
        }
        if let Ok(raw) = std::env::var("POOL_BUFFER") {
            config.buffer_size = Some(parse_env("POOL_BUFFER", &raw)?);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_workers < 1 {
            return Err(PoolError::InvalidConfiguration(format!(
                "workers count should be at least 1, got: {}",
                self.num_workers
            )));
        }
        Ok(())
    }

    // 0 - rendezvous: отправка ждет получателя
    fn capacity(&self) -> usize {
        self.buffer_size.unwrap_or(0)
    }
}

fn parse_env(name: &str, raw: &str) -> Result<usize> {
    raw.trim().parse().map_err(|_| {
        PoolError::InvalidConfiguration(format!("{name} should be a non-negative integer, got: {raw:?}"))
    })
}


/// Состояние, которое воркеры делят с пулом
struct Shared {
    tasks: Receiver<Task>,
    busy_workers: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    cancellation_token: CancellationToken,
}

/// Счетчик занятых воркеров. Уменьшается и при выходе по панике.
struct BusyGuard<'a>(&'a AtomicUsize);

impl<'a> BusyGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Shared {
    async fn worker_loop(&self, id: usize, results: Sender<TaskResult>) {
        debug!(worker = id, "worker listening");

        loop {
            let task = tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => break,
                received = self.tasks.recv_async() => match received {
                    Ok(task) => task,
                    Err(_) => break,
                },
            };

            let _busy = BusyGuard::enter(&self.busy_workers);

            let result = match execute(task).await {
                Ok(result) => result,
                Err(reason) => {
                    // Воркер не восстанавливается: пул теряет одно место
                    error!(worker = id, %reason, "task panicked, worker exits");
                    return;
                }
            };

            match result.status() {
                Status::Success => self.succeeded.fetch_add(1, Ordering::Relaxed),
                Status::Failed => self.failed.fetch_add(1, Ordering::Relaxed),
            };

            tokio::select! {
                biased;
                sent = results.send_async(result) => {
                    if sent.is_err() {
                        break;
                    }
                }
                _ = self.cancellation_token.cancelled() => {
                    warn!(worker = id, "pool stopped while publishing, result dropped");
                    break;
                }
            }
        }

        debug!(worker = id, "worker stopped");
    }
}

async fn execute(task: Task) -> std::result::Result<TaskResult, String> {
    match task.into_kind() {
        TaskKind::Blocking(f) => tokio::task::spawn_blocking(f).await.map_err(|join_err| {
            if join_err.is_panic() {
                panic_message(join_err.into_panic())
            } else {
                join_err.to_string()
            }
        }),
        TaskKind::Async(f) => AssertUnwindSafe(async move { f().await })
            .catch_unwind()
            .await
            .map_err(panic_message),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}


/// Пул из фиксированного числа воркеров.
///
/// Воркеры стартуют в [`Pool::run`] и берут задачи из общего канала,
/// результаты публикуются в канал [`Pool::results`]. Задача, которая уже
/// выполняется, никогда не прерывается: `stop` только просит воркеров выйти
/// между задачами, а зависшая задача навсегда занимает своего воркера.
///
/// `run` и `submit*` нужно вызывать внутри рантайма Tokio.
pub struct Pool {
    config: Config,
    shared: Arc<Shared>,
    task_sender: Sender<Task>,
    results: Receiver<TaskResult>,
    // Отправитель результатов до первого `run`; после него он есть только у воркеров
    launch: Mutex<Option<Sender<TaskResult>>>,
    workers: TaskTracker,
    submitted: AtomicUsize,
}

impl Pool {
    pub fn new(num_workers: usize, buffer_size: Option<usize>) -> Result<Self> {
        Self::with_config(Config {
            num_workers,
            buffer_size,
        })
    }

    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;

        let capacity = config.capacity();
        let (task_sender, tasks) = flume::bounded(capacity);
        let (result_sender, results) = flume::bounded(capacity);

        debug!(
            workers = config.num_workers,
            buffer = ?config.buffer_size,
            "worker pool created"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                tasks,
                busy_workers: AtomicUsize::new(0),
                succeeded: AtomicUsize::new(0),
                failed: AtomicUsize::new(0),
                cancellation_token: CancellationToken::new(),
            }),
            task_sender,
            results,
            launch: Mutex::new(Some(result_sender)),
            workers: TaskTracker::new(),
            submitted: AtomicUsize::new(0),
            config,
        })
    }

    /// Запускает воркеров. Срабатывает только первый вызов.
    pub fn run(&self) {
        let result_sender = {
            let mut launch = self.launch.lock().unwrap_or_else(PoisonError::into_inner);
            match launch.take() {
                Some(sender) => sender,
                None => return,
            }
        };

        if self.is_stopped() {
            return;
        }

        for id in 0..self.config.num_workers {
            let shared = Arc::clone(&self.shared);
            let results = result_sender.clone();
            self.workers.spawn(async move {
                shared.worker_loop(id, results).await;
            });
        }

        debug!(workers = self.config.num_workers, "worker pool started");
    }

    pub fn submit(&self, task: impl Into<Option<Task>>) -> Result<()> {
        let task = task
            .into()
            .ok_or_else(|| PoolError::InvalidTask("task is none".into()))?;
        self.forward(vec![task])
    }

    /// Задачи одного вызова попадают в канал в заданном порядке.
    /// Пустой пакет или любой `None` отклоняет весь пакет.
    pub fn submit_all<I, T>(&self, tasks: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<Option<Task>>,
    {
        let tasks = tasks
            .into_iter()
            .enumerate()
            .map(|(idx, task)| {
                task.into()
                    .ok_or_else(|| PoolError::InvalidTask(format!("task #{idx} is none")))
            })
            .collect::<Result<Vec<_>>>()?;

        if tasks.is_empty() {
            return Err(PoolError::InvalidTask("no tasks provided".into()));
        }
        self.forward(tasks)
    }

    fn forward(&self, tasks: Vec<Task>) -> Result<()> {
        if self.is_stopped() {
            return Err(PoolError::Stopped);
        }

        self.submitted.fetch_add(tasks.len(), Ordering::Relaxed);

        let sender = self.task_sender.clone();
        let token = self.shared.cancellation_token.clone();
        tokio::spawn(async move {
            let total = tasks.len();
            for (sent, task) in tasks.into_iter().enumerate() {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!(dropped = total - sent, "pool stopped, pending tasks dropped");
                        return;
                    }
                    res = sender.send_async(task) => {
                        if res.is_err() {
                            debug!(dropped = total - sent, "task channel closed, pending tasks dropped");
                            return;
                        }
                    }
                }
            }
        });

        Ok(())
    }

    #[inline]
    pub fn results(&self) -> Results {
        Results::new(self.results.clone())
    }

    /// Есть ли сейчас хотя бы один занятый воркер. Значение приблизительное.
    #[inline]
    pub fn loaded(&self) -> bool {
        self.shared.busy_workers.load(Ordering::Acquire) > 0
    }

    /// Останавливает воркеров, если ни один не занят.
    ///
    /// Не ждет их завершения, для этого есть [`Pool::wait_stopped`].
    /// Повторный вызов ничего не делает.
    pub fn stop(&self) -> Result<()> {
        if self.is_stopped() {
            return Ok(());
        }

        if self.loaded() {
            warn!(
                busy_workers = self.shared.busy_workers.load(Ordering::Relaxed),
                "stop rejected, workers are busy"
            );
            return Err(PoolError::Busy);
        }

        // Форвардеры и воркеры видят тот же токен и бросают оставшиеся задачи
        self.shared.cancellation_token.cancel();
        self.workers.close();

        // Если `run` не вызывался, канал результатов закрывается здесь
        drop(self.launch.lock().unwrap_or_else(PoisonError::into_inner).take());

        debug!("worker pool stop signalled");
        Ok(())
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.shared.cancellation_token.is_cancelled()
    }

    pub fn is_running(&self) -> bool {
        !self.is_stopped() && !self.workers.is_empty()
    }

    /// Ждет, пока после `stop` не завершится последний воркер
    pub async fn wait_stopped(&self) {
        self.workers.wait().await;
    }

    pub async fn wait_stopped_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait_stopped()).await.is_ok()
    }

    #[inline]
    pub fn worker_count(&self) -> usize {
        self.config.num_workers
    }

    /// Сколько воркеров еще не завершилось
    #[inline]
    pub fn active_workers(&self) -> usize {
        self.workers.len()
    }

    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            workers: self.config.num_workers,
            busy_workers: self.shared.busy_workers.load(Ordering::Relaxed),
            queued_tasks: self.task_sender.len(),
            submitted: self.submitted.load(Ordering::Relaxed),
            succeeded: self.shared.succeeded.load(Ordering::Relaxed),
            failed: self.shared.failed.load(Ordering::Relaxed),
        }
    }
}
