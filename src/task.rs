use super::result::TaskResult;
use std::{
    fmt,
    future::Future,
};
use futures::{
    future::BoxFuture,
    FutureExt,
};


type BlockingFn = Box<dyn FnOnce() -> TaskResult + Send + 'static>;
type AsyncFn = Box<dyn FnOnce() -> BoxFuture<'static, TaskResult> + Send + 'static>;

pub(crate) enum TaskKind {
    /// Выполняется в `spawn_blocking`, чтобы не занимать поток рантайма
    Blocking(BlockingFn),
    Async(AsyncFn),
}

/// Единица работы без аргументов, возвращающая `TaskResult`
pub struct Task {
    kind: TaskKind,
}

impl Task {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> TaskResult + Send + 'static,
    {
        Self {
            kind: TaskKind::Blocking(Box::new(f)),
        }
    }

    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = TaskResult> + Send + 'static,
    {
        Self {
            kind: TaskKind::Async(Box::new(move || f().boxed())),
        }
    }

    #[inline]
    pub fn is_blocking(&self) -> bool {
        matches!(self.kind, TaskKind::Blocking(_))
    }

    #[inline]
    pub(crate) fn into_kind(self) -> TaskKind {
        self.kind
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_blocking() { "blocking" } else { "async" };
        f.debug_struct("Task").field("kind", &kind).finish()
    }
}
