//! Fixed-size worker pool over a shared FIFO task queue.
//!
//! Tasks per frame are coarse (one per column slab), so a mutex-guarded
//! queue is cheap enough; a work-stealing deque would buy nothing here. The
//! pool offers the two primitives the solver schedules with:
//!
//! - [`ThreadPool::add_task`] / [`ThreadPool::wait_for_completion`] for
//!   hand-placed task waves with a barrier between them, and
//! - [`ThreadPool::dispatch`] for an even split of `[0, n)` across workers
//!   with the caller running the remainder inline.
//!
//! `wait_for_completion` acquire-loads the remaining-task counter that each
//! finished task release-decrements, so every write a task made is visible
//! once the wait returns.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Shared FIFO plus the count of enqueued-but-unfinished tasks.
struct TaskQueue {
    tasks: Mutex<VecDeque<Task>>,
    remaining: AtomicU32,
}

impl TaskQueue {
    fn new() -> Self {
        Self {
            tasks: Mutex::new(VecDeque::new()),
            remaining: AtomicU32::new(0),
        }
    }

    fn add_task(&self, task: Task) {
        let mut tasks = self.tasks.lock().unwrap();
        tasks.push_back(task);
        // Incremented under the lock: a worker cannot pop the task and
        // decrement before the count reflects it.
        self.remaining.fetch_add(1, Ordering::Release);
    }

    fn pop_task(&self) -> Option<Task> {
        self.tasks.lock().unwrap().pop_front()
    }

    fn work_done(&self) {
        self.remaining.fetch_sub(1, Ordering::AcqRel);
    }

    fn wait_for_completion(&self) {
        while self.remaining.load(Ordering::Acquire) > 0 {
            thread::yield_now();
        }
    }
}

/// One worker thread polling the shared queue.
struct Worker {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    fn spawn(queue: Arc<TaskQueue>) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let handle = thread::spawn(move || {
            // The flag is only observed between tasks: an in-flight task
            // always runs to completion.
            while flag.load(Ordering::Relaxed) {
                match queue.pop_task() {
                    Some(task) => {
                        task();
                        queue.work_done();
                    }
                    None => thread::yield_now(),
                }
            }
        });
        Self {
            running,
            handle: Some(handle),
        }
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            handle.join().expect("worker thread panicked");
        }
    }
}

/// Fixed set of workers sharing one task queue.
pub struct ThreadPool {
    thread_count: usize,
    queue: Arc<TaskQueue>,
    workers: Vec<Worker>,
}

impl ThreadPool {
    pub fn new(thread_count: usize) -> Self {
        assert!(thread_count > 0, "thread pool needs at least one worker");
        let queue = Arc::new(TaskQueue::new());
        let workers = (0..thread_count)
            .map(|_| Worker::spawn(Arc::clone(&queue)))
            .collect();
        Self {
            thread_count,
            queue,
            workers,
        }
    }

    #[inline]
    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Enqueue a task; never blocks. Tasks communicate through captured
    /// state, and a panic inside one is fatal to the process.
    pub fn add_task<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.add_task(Box::new(task));
    }

    /// Block until every task submitted so far has finished.
    pub fn wait_for_completion(&self) {
        self.queue.wait_for_completion();
    }

    /// Split `[0, element_count)` into one equal-size range per worker and
    /// run `callback` on each; the calling thread handles the remainder
    /// inline, then blocks until the whole dispatch has drained.
    pub fn dispatch<F>(&self, element_count: usize, callback: &F)
    where
        F: Fn(usize, usize) + Sync,
    {
        let batch_size = element_count / self.thread_count;
        if batch_size > 0 {
            for i in 0..self.thread_count {
                let start = batch_size * i;
                let end = start + batch_size;
                let task: Box<dyn FnOnce() + Send + '_> = Box::new(move || callback(start, end));
                // SAFETY: every task submitted here finishes before this
                // function returns (wait_for_completion below), so the
                // borrow of `callback` is never outlived. The transmute
                // only erases that lifetime from the queue's task type.
                let task: Task = unsafe { std::mem::transmute(task) };
                self.queue.add_task(task);
            }
        }
        let tail = batch_size * self.thread_count;
        if tail < element_count {
            callback(tail, element_count);
        }
        self.wait_for_completion();
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        // Drain whatever was submitted, then release the workers.
        self.wait_for_completion();
        for worker in &mut self.workers {
            worker.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn tasks_run_and_the_queue_drains() {
        let pool = ThreadPool::new(4);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..64 {
            let counter = Arc::clone(&counter);
            pool.add_task(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            });
        }
        pool.wait_for_completion();
        assert_eq!(counter.load(Ordering::Relaxed), 64);
    }

    #[test]
    fn dispatch_covers_every_index_exactly_once() {
        let pool = ThreadPool::new(3);
        let hits: Vec<AtomicUsize> = (0..1000).map(|_| AtomicUsize::new(0)).collect();
        pool.dispatch(1000, &|start, end| {
            for hit in &hits[start..end] {
                hit.fetch_add(1, Ordering::Relaxed);
            }
        });
        assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
    }

    #[test]
    fn dispatch_smaller_than_worker_count_runs_inline() {
        let pool = ThreadPool::new(8);
        let hits: Vec<AtomicUsize> = (0..3).map(|_| AtomicUsize::new(0)).collect();
        pool.dispatch(3, &|start, end| {
            for hit in &hits[start..end] {
                hit.fetch_add(1, Ordering::Relaxed);
            }
        });
        assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
    }

    #[test]
    fn dispatch_of_nothing_returns() {
        let pool = ThreadPool::new(2);
        pool.dispatch(0, &|_, _| panic!("no range to visit"));
    }

    #[test]
    fn waves_reuse_the_pool() {
        let pool = ThreadPool::new(2);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..10 {
            for _ in 0..8 {
                let counter = Arc::clone(&counter);
                pool.add_task(move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                });
            }
            pool.wait_for_completion();
        }
        assert_eq!(counter.load(Ordering::Relaxed), 80);
    }
}
