use serde::Deserialize;
use thread_local::*;

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crate::errors::*;

/// What the coordinator does with the remaining tasks once one task fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Run every task, then report all failures.
    #[default]
    Continue,
    /// Stop handing out tasks after the first failure. Tasks that already started
    /// still finish and are collected; the rest are reported as cancelled.
    Abort,
}

impl FromStr for FailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "continue" => Ok(FailurePolicy::Continue),
            "abort" => Ok(FailurePolicy::Abort),
            _ => Err(Error::InvalidConfig(format!(
                "unknown failure policy \"{s}\", expected \"continue\" or \"abort\""
            ))),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FailurePolicy::Continue => write!(f, "continue"),
            FailurePolicy::Abort => write!(f, "abort"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolReport {
    pub completed: usize,
    /// Indices of tasks that were never started.
    pub cancelled: Vec<usize>,
    /// Time spent inside tasks, summed over workers.
    pub busy: Duration,
}

/// A fixed number of worker threads pulling per-file tasks from a shared queue.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
    policy: FailurePolicy,
}

impl WorkerPool {
    pub fn new(workers: usize, policy: FailurePolicy) -> Self {
        assert!(workers >= 1, "Number of workers must be greater than zero");
        Self { workers, policy }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Run `task` on every item and hand each result to `collect` on the calling
    /// thread, in completion order. A panicking task becomes [`Error::Worker`].
    pub fn run<T, R, F, C>(&self, tasks: &[T], task: F, mut collect: C) -> PoolReport
    where
        T: AsRef<Path> + Sync,
        R: Send,
        F: Fn(&T) -> Result<R> + Sync,
        C: FnMut(usize, Result<R>),
    {
        let next = AtomicUsize::new(0);
        let stop = AtomicBool::new(false);
        let busy: ThreadLocal<Cell<Duration>> = ThreadLocal::new();
        let mut completed = 0;

        thread::scope(|s| {
            let (tx, rx) = mpsc::channel();

            for _ in 0..self.workers.min(tasks.len()) {
                let tx = tx.clone();
                let (next, stop, busy, task) = (&next, &stop, &busy, &task);

                s.spawn(move || loop {
                    if stop.load(Ordering::Acquire) {
                        break;
                    }
                    let i = next.fetch_add(1, Ordering::AcqRel);
                    let Some(item) = tasks.get(i) else {
                        break;
                    };

                    let start = Instant::now();
                    let res = panic::catch_unwind(AssertUnwindSafe(|| task(item)))
                        .unwrap_or_else(|p| {
                            Err(Error::Worker {
                                file: item.as_ref().to_owned(),
                                reason: panic_message(&*p),
                            })
                        });
                    let elapsed = busy.get_or(|| Cell::new(Duration::ZERO));
                    elapsed.set(elapsed.get() + start.elapsed());

                    if tx.send((i, res)).is_err() {
                        break;
                    }
                });
            }
            drop(tx);

            for (i, res) in rx {
                if res.is_err() && self.policy == FailurePolicy::Abort {
                    stop.store(true, Ordering::Release);
                }
                completed += 1;
                collect(i, res);
            }
        });

        let dispatched = next.load(Ordering::Acquire).min(tasks.len());
        PoolReport {
            completed,
            cancelled: (dispatched..tasks.len()).collect(),
            busy: busy.into_iter().map(|c| c.get()).sum(),
        }
    }
}

fn panic_message(p: &(dyn Any + Send)) -> String {
    if let Some(s) = p.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = p.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn files(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("{i}.fasta"))).collect()
    }

    #[test]
    fn test_runs_every_task() {
        let tasks = files(20);
        let mut seen = Vec::new();
        let report = WorkerPool::new(4, FailurePolicy::Continue).run(
            &tasks,
            |f| Ok(f.to_string_lossy().len()),
            |i, res| seen.push((i, res.unwrap())),
        );

        assert_eq!(report.completed, 20);
        assert!(report.cancelled.is_empty());
        seen.sort();
        assert_eq!(seen.len(), 20);
        assert!(seen.iter().enumerate().all(|(j, &(i, _))| i == j));
    }

    #[test]
    fn test_more_workers_than_tasks() {
        let report = WorkerPool::new(16, FailurePolicy::Continue).run(&files(2), |_| Ok(()), |_, _| ());
        assert_eq!(report.completed, 2);

        let report = WorkerPool::new(2, FailurePolicy::Continue).run(&files(0), |_| Ok(()), |_, _| ());
        assert_eq!(report.completed, 0);
    }

    #[test]
    fn test_continue_reports_all_failures() {
        let tasks = files(10);
        let mut failures = 0;
        let report = WorkerPool::new(3, FailurePolicy::Continue).run(
            &tasks,
            |f| {
                if f.to_string_lossy().starts_with('1') || f.to_string_lossy().starts_with('5') {
                    Err(Error::InvalidConfig("bad".to_owned()))
                } else {
                    Ok(())
                }
            },
            |_, res| failures += res.is_err() as usize,
        );

        assert_eq!(report.completed, 10);
        assert_eq!(failures, 2);
    }

    #[test]
    fn test_panic_becomes_worker_failure() {
        let tasks = files(3);
        let mut errors = Vec::new();
        WorkerPool::new(2, FailurePolicy::Continue).run(
            &tasks,
            |f| {
                if f.as_path() == Path::new("1.fasta") {
                    panic!("out of memory");
                }
                Ok(())
            },
            |_, res| {
                if let Err(e) = res {
                    errors.push(e);
                }
            },
        );

        assert_eq!(errors.len(), 1);
        match &errors[0] {
            Error::Worker { file, reason } => {
                assert_eq!(file, Path::new("1.fasta"));
                assert_eq!(reason, "out of memory");
            }
            e => panic!("unexpected error {e}"),
        }
    }

    #[test]
    fn test_abort_cancels_undispatched() {
        let tasks = files(50);
        let mut ok = 0;
        let mut failed = 0;
        // one worker makes dispatch order deterministic
        let report = WorkerPool::new(1, FailurePolicy::Abort).run(
            &tasks,
            |f| {
                if f.as_path() == Path::new("3.fasta") {
                    Err(Error::InvalidConfig("bad".to_owned()))
                } else {
                    thread::sleep(Duration::from_millis(5));
                    Ok(())
                }
            },
            |_, res| match res {
                Ok(()) => ok += 1,
                Err(_) => failed += 1,
            },
        );

        assert_eq!(failed, 1);
        assert_eq!(report.completed, ok + failed);
        assert_eq!(report.completed + report.cancelled.len(), 50);
        assert!(!report.cancelled.is_empty());
        assert!(report.cancelled.iter().all(|&i| i > 3));
    }

    #[test]
    fn test_failure_policy_parse() {
        assert_eq!("abort".parse::<FailurePolicy>().unwrap(), FailurePolicy::Abort);
        assert_eq!("Continue".parse::<FailurePolicy>().unwrap(), FailurePolicy::Continue);
        assert!("later".parse::<FailurePolicy>().is_err());
        assert_eq!(FailurePolicy::default().to_string(), "continue");
    }
}
