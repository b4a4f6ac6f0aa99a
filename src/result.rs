use std::{
    any::Any,
    fmt,
};


/// Статус выполнения задачи
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Success,
    Failed,
}

impl Status {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success)
    }
}


/// Результат одной задачи: статус и произвольная полезная нагрузка.
///
/// Пул не интерпретирует `Failed` - это просто данные для читателя.
pub struct TaskResult {
    status: Status,
    info: Option<Box<dyn Any + Send>>,
}

impl TaskResult {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            info: None,
        }
    }

    #[inline]
    pub fn success() -> Self {
        Self::new(Status::Success)
    }

    #[inline]
    pub fn failed() -> Self {
        Self::new(Status::Failed)
    }

    pub fn with_info<I>(mut self, info: I) -> Self
    where
        I: Any + Send,
    {
        self.info = Some(Box::new(info));
        self
    }

    #[inline]
    pub fn status(&self) -> Status {
        self.status
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    #[inline]
    pub fn has_info(&self) -> bool {
        self.info.is_some()
    }

    /// Ссылка на нагрузку, если она есть и имеет тип `I`
    pub fn info_ref<I: Any>(&self) -> Option<&I> {
        self.info.as_ref().and_then(|info| info.downcast_ref::<I>())
    }

    /// Забирает нагрузку. При несовпадении типа результат возвращается обратно.
    pub fn into_info<I: Any>(self) -> Result<I, Self> {
        match self.info {
            Some(info) => match info.downcast::<I>() {
                Ok(value) => Ok(*value),
                Err(info) => Err(Self {
                    status: self.status,
                    info: Some(info),
                }),
            },
            None => Err(self),
        }
    }
}

impl fmt::Debug for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskResult")
            .field("status", &self.status)
            .field("has_info", &self.info.is_some())
            .finish()
    }
}
