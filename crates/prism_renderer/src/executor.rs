//! Persistent worker pool that runs indexed tasks in batches.
//!
//! Workers are spawned once and sleep on a condition variable between
//! dispatches. A dispatch publishes a task function and a batch count; each
//! worker repeatedly claims the next batch from an atomic counter until none
//! are left, then reports in. The last worker to report clears the task and
//! wakes whoever is waiting.

use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use thiserror::Error;

/// Task body: `(thread_index, task_index)`.
type TaskFn = dyn Fn(usize, usize) + Send + Sync;

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("failed to spawn worker thread {index}: {source}")]
    Spawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },
}

/// Hardware thread count, or 1 if it cannot be queried.
pub fn default_thread_count() -> usize {
    thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// Half the hardware threads, at least 1.
pub fn half_thread_count() -> usize {
    (default_thread_count() / 2).max(1)
}

/// Log and abort. Used for configuration mistakes that cannot be recovered
/// from without leaving workers in an unknown state.
fn fatal(message: &str) -> ! {
    log::error!("{message}");
    std::process::abort()
}

struct Dispatch {
    func: Arc<TaskFn>,
    total_tasks: usize,
    tasks_per_batch: usize,
    batch_count: usize,
}

struct State {
    dispatch: Option<Arc<Dispatch>>,
    /// Bumped on every dispatch so sleeping workers can tell new work apart
    /// from a spurious wake-up
    generation: u64,
    /// True from dispatch until the last worker has reported in
    working: bool,
    shutdown: bool,
}

struct Shared {
    state: Mutex<State>,
    work_available: Condvar,
    work_done: Condvar,
    next_batch: AtomicUsize,
    finished_threads: AtomicUsize,
    panicked: AtomicBool,
    thread_count: usize,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fixed-size pool of worker threads, reused across dispatches.
pub struct ParallelExecutor {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl ParallelExecutor {
    /// Spawn `thread_count` workers. Zero threads is a fatal error.
    pub fn new(thread_count: usize) -> Result<Self, ExecutorError> {
        if thread_count == 0 {
            fatal("ParallelExecutor requires at least one worker thread");
        }

        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                dispatch: None,
                generation: 0,
                working: false,
                shutdown: false,
            }),
            work_available: Condvar::new(),
            work_done: Condvar::new(),
            next_batch: AtomicUsize::new(0),
            finished_threads: AtomicUsize::new(thread_count),
            panicked: AtomicBool::new(false),
            thread_count,
        });

        // Dropping a partially built pool joins the workers spawned so far
        let mut executor = Self {
            shared,
            workers: Vec::with_capacity(thread_count),
        };
        for index in 0..thread_count {
            let shared = Arc::clone(&executor.shared);
            let handle = thread::Builder::new()
                .name(format!("prism-worker-{index}"))
                .spawn(move || worker_loop(&shared, index))
                .map_err(|source| ExecutorError::Spawn { index, source })?;
            executor.workers.push(handle);
        }

        log::info!("ParallelExecutor started with {thread_count} worker threads");
        Ok(executor)
    }

    pub fn thread_count(&self) -> usize {
        self.shared.thread_count
    }

    /// Run `func(thread_index, task_index)` for every task index in
    /// `0..total_tasks` and return once all of them have finished.
    ///
    /// `func` may borrow from the caller. If any task panicked, the panic
    /// is re-raised here after the whole dispatch has completed.
    pub fn execute<'a, F>(&mut self, func: F, total_tasks: usize, tasks_per_batch: usize)
    where
        F: Fn(usize, usize) + Send + Sync + 'a,
    {
        let func: Arc<dyn Fn(usize, usize) + Send + Sync + 'a> = Arc::new(func);
        // SAFETY: only the lifetime bound is erased. `wait` below returns only
        // after every worker has dropped its handle on the dispatch and the
        // last one has cleared the shared slot, so no copy of `func`
        // survives this call.
        let func: Arc<TaskFn> =
            unsafe { std::mem::transmute::<Arc<dyn Fn(usize, usize) + Send + Sync + 'a>, Arc<TaskFn>>(func) };

        self.dispatch(func, total_tasks, tasks_per_batch);
        self.wait();

        if self.shared.panicked.swap(false, Ordering::AcqRel) {
            panic!("a task dispatched to ParallelExecutor panicked");
        }
    }

    /// Start a dispatch and return immediately. Any dispatch still running
    /// is waited for first.
    pub fn execute_async<F>(&mut self, func: F, total_tasks: usize, tasks_per_batch: usize)
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.dispatch(Arc::new(func), total_tasks, tasks_per_batch);
    }

    /// Block until the current dispatch, if any, has completed.
    pub fn wait(&self) {
        let mut state = self.shared.lock();
        // `working` is only cleared under the lock, so the notify that
        // follows it cannot slip in between this check and the wait
        while state.working {
            state = self
                .shared
                .work_done
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn dispatch(&mut self, func: Arc<TaskFn>, total_tasks: usize, tasks_per_batch: usize) {
        self.wait();
        // A panic still flagged here came from an async dispatch; it was
        // already logged by the worker and belongs to no caller
        if self.shared.panicked.swap(false, Ordering::AcqRel) {
            log::warn!("Discarding panic from a previous asynchronous dispatch");
        }

        if tasks_per_batch == 0 {
            fatal("ParallelExecutor dispatch with tasks_per_batch == 0");
        }
        if total_tasks == 0 {
            return;
        }

        let dispatch = Dispatch {
            func,
            total_tasks,
            tasks_per_batch,
            batch_count: total_tasks.div_ceil(tasks_per_batch),
        };

        let mut state = self.shared.lock();
        // Workers read these only after taking the lock and seeing the new
        // generation, so relaxed stores are enough
        self.shared.next_batch.store(0, Ordering::Relaxed);
        self.shared.finished_threads.store(0, Ordering::Relaxed);
        state.dispatch = Some(Arc::new(dispatch));
        state.working = true;
        state.generation += 1;
        self.shared.work_available.notify_all();
    }
}

impl Drop for ParallelExecutor {
    fn drop(&mut self) {
        self.wait();
        self.shared.lock().shutdown = true;
        self.shared.work_available.notify_all();

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::warn!("ParallelExecutor worker exited with a panic");
            }
        }
        log::info!("ParallelExecutor stopped");
    }
}

fn worker_loop(shared: &Shared, thread_index: usize) {
    let mut seen_generation = 0;

    loop {
        let dispatch = {
            let mut state = shared.lock();
            while state.generation == seen_generation && !state.shutdown {
                state = shared
                    .work_available
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            if state.shutdown {
                return;
            }
            seen_generation = state.generation;
            state.dispatch.clone()
        };

        if let Some(dispatch) = dispatch {
            let result = panic::catch_unwind(AssertUnwindSafe(|| run_batches(shared, &dispatch, thread_index)));
            if result.is_err() {
                log::error!("Task panicked on worker {thread_index}");
                shared.panicked.store(true, Ordering::Release);
            }
        }

        // Last one out clears the task and wakes the waiter
        if shared.finished_threads.fetch_add(1, Ordering::AcqRel) + 1 == shared.thread_count {
            let mut state = shared.lock();
            state.dispatch = None;
            state.working = false;
            shared.work_done.notify_all();
        }
    }
}

fn run_batches(shared: &Shared, dispatch: &Dispatch, thread_index: usize) {
    loop {
        let batch = shared.next_batch.fetch_add(1, Ordering::Relaxed);
        if batch >= dispatch.batch_count {
            return;
        }

        let start = batch * dispatch.tasks_per_batch;
        let end = (start + dispatch.tasks_per_batch).min(dispatch.total_tasks);
        for task_index in start..end {
            (dispatch.func)(thread_index, task_index);
        }
    }
}
