//! Пул воркеров поверх Tokio с фиксированным числом воркеров
//!
//! # Features
//! - Фиксированное число воркеров, идемпотентный запуск
//! - Общий канал задач и отдельный канал результатов
//! - Кооперативная остановка без прерывания выполняемых задач
//! - Приблизительный флаг нагрузки и метрики

pub mod errors;
pub mod handle;
pub mod model;
pub mod pool;
pub mod result;
pub mod task;

pub use errors::PoolError;
pub use handle::Results;
pub use pool::{Config, Pool};
pub use result::{Status, TaskResult};
pub use task::Task;
