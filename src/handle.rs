use super::{
    errors::{PoolError, Result},
    result::TaskResult,
};
use flume::Receiver;
use tokio::time::Duration;


/// Handle только на чтение канала результатов.
///
/// Клоны читают из одного канала: каждый результат достается ровно одному
/// читателю. Канал закрывается, когда после `stop` завершился последний воркер.
#[derive(Debug, Clone)]
pub struct Results {
    receiver: Receiver<TaskResult>,
}

impl Results {

    pub(crate) fn new(receiver: Receiver<TaskResult>) -> Self {
        Self { receiver }
    }

    /// `None` - канал закрыт и пуст
    #[inline]
    pub async fn recv(&self) -> Option<TaskResult> {
        self.receiver.recv_async().await.ok()
    }

    pub async fn recv_timeout(&self, timeout: Duration) -> Result<TaskResult> {
        match tokio::time::timeout(timeout, self.receiver.recv_async()).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(_)) => Err(PoolError::Closed),
            Err(_) => Err(PoolError::Timeout),
        }
    }

    /// Без ожидания. `None` - результата сейчас нет или канал закрыт.
    pub fn try_recv(&self) -> Option<TaskResult> {
        self.receiver.try_recv().ok()
    }

    /// Результаты в буфере. Без буфера всегда 0: результат ждет у воркера.
    #[inline]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.receiver.is_disconnected()
    }
}
