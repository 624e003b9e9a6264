use std::sync::mpsc;

/// How scheduled continuations run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Continuations run on the thread that waits for them.
    Deferred,
    /// Continuations run on a worker pool.
    Parallel,
}

/// Handle to one scheduled unit of work. Deferred work executes inside
/// `wait`; spawned work is awaited via a completion channel.
pub(crate) enum Task {
    Deferred(Box<dyn FnOnce() + Send>),
    Spawned(mpsc::Receiver<()>),
}

impl Task {
    pub(crate) fn wait(self) {
        match self {
            Task::Deferred(job) => job(),
            // A recv error means the worker dropped the sender without
            // signaling; there is nothing left to wait for either way.
            Task::Spawned(done) => {
                let _ = done.recv();
            }
        }
    }
}

pub(crate) struct Executor {
    pool: Option<rayon::ThreadPool>,
}

impl Executor {
    pub(crate) fn new(mode: RunMode) -> Self {
        let pool = match mode {
            RunMode::Deferred => None,
            // Pool construction only fails on resource exhaustion; degrade
            // to deferred execution rather than aborting the run.
            RunMode::Parallel => rayon::ThreadPoolBuilder::new().build().ok(),
        };
        Self { pool }
    }

    pub(crate) fn submit(&self, job: Box<dyn FnOnce() + Send>) -> Task {
        match &self.pool {
            None => Task::Deferred(job),
            Some(pool) => {
                let (done_tx, done_rx) = mpsc::channel();
                pool.spawn(move || {
                    job();
                    let _ = done_tx.send(());
                });
                Task::Spawned(done_rx)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_deferred_runs_on_wait() {
        let counter = Arc::new(AtomicUsize::new(0));
        let executor = Executor::new(RunMode::Deferred);
        let c = Arc::clone(&counter);
        let task = executor.submit(Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        task.wait();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_parallel_completes_before_wait_returns() {
        let counter = Arc::new(AtomicUsize::new(0));
        let executor = Executor::new(RunMode::Parallel);
        let tasks: Vec<Task> = (0..16)
            .map(|_| {
                let c = Arc::clone(&counter);
                executor.submit(Box::new(move || {
                    c.fetch_add(1, Ordering::SeqCst);
                }))
            })
            .collect();
        for task in tasks {
            task.wait();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 16);
    }
}
