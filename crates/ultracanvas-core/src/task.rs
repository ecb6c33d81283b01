//! Cross-thread task queue feeding the UI thread.
//!
//! UI state is single-threaded. Worker threads hand work to the UI thread by
//! posting closures through a [`TaskSender`]; the application loop drains the
//! paired [`TaskQueue`] once per iteration, before event dispatch, and runs
//! each closure with mutable access to the UI context `Ctx`.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::error::{CoreError, Result};

/// A unique identifier for a posted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    /// Get the raw u64 value of this task ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

fn next_task_id() -> TaskId {
    TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
}

type BoxedTask<Ctx> = Box<dyn FnOnce(&mut Ctx) + Send + 'static>;

struct TaskData<Ctx> {
    id: TaskId,
    task: BoxedTask<Ctx>,
}

/// Receiving end, owned by the UI thread.
pub struct TaskQueue<Ctx> {
    receiver: Receiver<TaskData<Ctx>>,
    sender: Sender<TaskData<Ctx>>,
    batch_size: usize,
}

/// Sending end. Cheap to clone and safe to move to other threads.
pub struct TaskSender<Ctx> {
    sender: Sender<TaskData<Ctx>>,
}

impl<Ctx> Clone for TaskSender<Ctx> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<Ctx> std::fmt::Debug for TaskSender<Ctx> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskSender")
            .field("pending", &self.sender.len())
            .finish()
    }
}

impl<Ctx> TaskSender<Ctx> {
    /// Post a task to run on the UI thread.
    pub fn post<F>(&self, task: F) -> Result<TaskId>
    where
        F: FnOnce(&mut Ctx) + Send + 'static,
    {
        let id = next_task_id();
        self.sender
            .send(TaskData {
                id,
                task: Box::new(task),
            })
            .map_err(|_| CoreError::TaskQueueClosed)?;
        Ok(id)
    }
}

impl<Ctx> Default for TaskQueue<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ctx> TaskQueue<Ctx> {
    /// Create a new, unbounded task queue.
    pub fn new() -> Self {
        Self::with_batch_size(64)
    }

    /// Create a queue that runs at most `batch_size` tasks per drain.
    pub fn with_batch_size(batch_size: usize) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            receiver,
            sender,
            batch_size: batch_size.max(1),
        }
    }

    /// Get a sender handle for this queue.
    pub fn sender(&self) -> TaskSender<Ctx> {
        TaskSender {
            sender: self.sender.clone(),
        }
    }

    /// Number of tasks waiting.
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Run up to one batch of pending tasks in FIFO order.
    ///
    /// Returns the number of tasks executed.
    pub fn drain(&self, ctx: &mut Ctx) -> usize {
        let mut executed = 0;
        while executed < self.batch_size {
            match self.receiver.try_recv() {
                Ok(TaskData { id, task }) => {
                    crate::uc_trace!(task = id.as_u64(), "running posted task");
                    task(ctx);
                    executed += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        executed
    }
}

static_assertions::assert_impl_all!(TaskSender<u32>: Send, Sync, Clone);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_run_in_order() {
        let queue = TaskQueue::<Vec<u32>>::new();
        let sender = queue.sender();
        sender.post(|v| v.push(1)).unwrap();
        sender.post(|v| v.push(2)).unwrap();

        let mut ctx = Vec::new();
        assert_eq!(queue.drain(&mut ctx), 2);
        assert_eq!(ctx, vec![1, 2]);
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_post_from_other_thread() {
        let queue = TaskQueue::<u32>::new();
        let sender = queue.sender();
        std::thread::spawn(move || {
            sender.post(|n| *n += 5).unwrap();
        })
        .join()
        .unwrap();

        let mut ctx = 0;
        queue.drain(&mut ctx);
        assert_eq!(ctx, 5);
    }

    #[test]
    fn test_batch_size_limits_drain() {
        let queue = TaskQueue::<u32>::with_batch_size(2);
        let sender = queue.sender();
        for _ in 0..5 {
            sender.post(|n| *n += 1).unwrap();
        }

        let mut ctx = 0;
        assert_eq!(queue.drain(&mut ctx), 2);
        assert_eq!(queue.pending_count(), 3);
    }

    #[test]
    fn test_ids_are_unique() {
        let queue = TaskQueue::<()>::new();
        let sender = queue.sender();
        let a = sender.post(|_| {}).unwrap();
        let b = sender.post(|_| {}).unwrap();
        assert_ne!(a, b);
    }
}
