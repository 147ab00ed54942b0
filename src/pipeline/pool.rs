//! Fixed-size worker pool over scoped threads.

use crate::pipeline::cancel::CancellationToken;
use crossbeam_channel::unbounded;
use tracing::debug;

/// Runs independent tasks on a fixed number of threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// Create a pool; at least one worker is always used.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Pool sized to the machine's available parallelism.
    pub fn with_available_parallelism() -> Self {
        Self::new(std::thread::available_parallelism().map_or(1, std::num::NonZero::get))
    }

    /// Number of worker threads.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `work` over every task and hand each result to `on_result` on the
    /// calling thread, tagged with the task's index, in completion order.
    ///
    /// Workers stop taking new tasks once `cancel` is set; tasks never
    /// started produce no result.
    pub fn run<T, R, F>(
        &self,
        tasks: Vec<T>,
        cancel: &CancellationToken,
        work: F,
        mut on_result: impl FnMut(usize, R),
    ) where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync,
    {
        let threads = self.workers.min(tasks.len());
        if threads == 0 {
            return;
        }

        let (task_tx, task_rx) = unbounded::<(usize, T)>();
        let (result_tx, result_rx) = unbounded::<(usize, R)>();
        for task in tasks.into_iter().enumerate() {
            // The receiver is alive for the whole call.
            let _ = task_tx.send(task);
        }
        drop(task_tx);

        debug!("Starting {threads} worker(s)");
        std::thread::scope(|scope| {
            for _ in 0..threads {
                let task_rx = task_rx.clone();
                let result_tx = result_tx.clone();
                let work = &work;
                scope.spawn(move || {
                    while !cancel.is_cancelled() {
                        let Ok((index, task)) = task_rx.recv() else {
                            break;
                        };
                        if result_tx.send((index, work(task))).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(result_tx);

            for (index, result) in result_rx {
                on_result(index, result);
            }
        });
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::with_available_parallelism()
    }
}
