//! Generic parallel pipeline: `workers` threads pull from `T` numbered tasks
//! with a bounded lookahead, and a single collector delivers their results to
//! a sink in strict ascending task order regardless of completion order.
//!
//! The first error — from the per-task work closure or from the collect
//! closure — cancels further dispatch; already in-flight tasks are drained
//! (so worker threads can be joined cleanly) but none past the first error
//! are delivered to the sink.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Condvar, Mutex};
use std::thread;

use crate::cancel::CancellationToken;
use crate::config::default_buffer;
use crate::error::{Error, Result};

struct Dispatch<'a> {
    next: Mutex<usize>,
    inflight: Mutex<usize>,
    cv: Condvar,
    buffer: usize,
    total: usize,
    external: &'a CancellationToken,
    internal_stop: AtomicBool,
}

impl Dispatch<'_> {
    fn stopped(&self) -> bool {
        self.external.is_cancelled() || self.internal_stop.load(Ordering::SeqCst)
    }

    /// Claim the next task index, blocking until a lookahead slot is free.
    /// Returns `None` once every task has been claimed or the run has
    /// stopped.
    fn next_task(&self) -> Option<usize> {
        let mut next = self.next.lock().expect("dispatch mutex poisoned");
        let mut inflight = self.inflight.lock().expect("dispatch mutex poisoned");
        loop {
            if self.stopped() || *next >= self.total {
                return None;
            }
            if *inflight < self.buffer {
                *inflight += 1;
                let idx = *next;
                *next += 1;
                return Some(idx);
            }
            inflight = self.cv.wait(inflight).expect("dispatch condvar poisoned");
        }
    }

    /// Release one lookahead slot once a result has been delivered to the
    /// sink (or discarded post-cancellation), and wake a waiting dispatcher.
    fn release_slot(&self) {
        let mut inflight = self.inflight.lock().expect("dispatch mutex poisoned");
        *inflight -= 1;
        drop(inflight);
        self.cv.notify_one();
    }
}

/// Run `work` over every index of `items` using `workers` threads, and
/// deliver each result to `collect` in strict ascending task order.
///
/// `buffer` bounds how far workers may race ahead of the delivery cursor;
/// `None` selects [`crate::config::default_buffer`].
pub fn pipeline<T, V>(
    items: &[T],
    workers: usize,
    buffer: Option<usize>,
    cancel: &CancellationToken,
    work: impl Fn(usize, &T) -> Result<V> + Sync,
    mut collect: impl FnMut(usize, V) -> Result<()>,
) -> Result<()>
where
    T: Sync,
    V: Send,
{
    let total = items.len();
    if total == 0 {
        return Ok(());
    }
    let workers = workers.max(1).min(total);
    let buffer = buffer.unwrap_or_else(|| default_buffer(workers)).max(1);

    let dispatch = Dispatch {
        next: Mutex::new(0),
        inflight: Mutex::new(0),
        cv: Condvar::new(),
        buffer,
        total,
        external: cancel,
        internal_stop: AtomicBool::new(false),
    };

    let (tx, rx) = mpsc::channel::<(usize, Result<V>)>();
    let mut first_error: Option<Error> = None;

    thread::scope(|scope| {
        for _ in 0..workers {
            let tx = tx.clone();
            let dispatch = &dispatch;
            let work = &work;
            scope.spawn(move || {
                while let Some(idx) = dispatch.next_task() {
                    let result = work(idx, &items[idx]);
                    if tx.send((idx, result)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        let mut pending: BTreeMap<usize, Result<V>> = BTreeMap::new();
        let mut next_deliver = 0usize;

        for (idx, result) in rx.iter() {
            pending.insert(idx, result);
            while let Some(result) = pending.remove(&next_deliver) {
                next_deliver += 1;
                dispatch.release_slot();

                if first_error.is_some() {
                    continue;
                }
                let outcome = result.and_then(|v| collect(next_deliver - 1, v));
                if let Err(e) = outcome {
                    first_error = Some(e);
                    dispatch.internal_stop.store(true, Ordering::SeqCst);
                }
            }
        }
    });

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Convenience wrapper around [`pipeline`] for tasks with no per-item value
/// to deliver — the sink only observes ordering and errors.
pub fn for_each<T>(
    items: &[T],
    workers: usize,
    buffer: Option<usize>,
    cancel: &CancellationToken,
    work: impl Fn(usize, &T) -> Result<()> + Sync,
) -> Result<()>
where
    T: Sync,
{
    pipeline(items, workers, buffer, cancel, work, |_, ()| Ok(()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    #[test]
    fn delivers_results_in_ascending_order_despite_out_of_order_completion() {
        let items: Vec<usize> = (0..20).collect();
        let delivered = StdMutex::new(Vec::new());
        let cancel = CancellationToken::new();

        pipeline(
            &items,
            4,
            None,
            &cancel,
            |idx, _item| {
                // Reverse-skewed sleep so later tasks tend to finish first.
                thread::sleep(Duration::from_micros((20 - idx as u64) * 200));
                Ok(idx)
            },
            |idx, v| {
                assert_eq!(idx, v);
                delivered.lock().unwrap().push(v);
                Ok(())
            },
        )
        .unwrap();

        let delivered = delivered.into_inner().unwrap();
        assert_eq!(delivered, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn first_error_cancels_dispatch_of_further_tasks() {
        let items: Vec<usize> = (0..100).collect();
        let cancel = CancellationToken::new();
        let max_seen = StdMutex::new(0usize);

        let result = pipeline(
            &items,
            3,
            None,
            &cancel,
            |idx, _item| {
                *max_seen.lock().unwrap() = (*max_seen.lock().unwrap()).max(idx);
                thread::sleep(Duration::from_millis(1));
                if idx == 17 {
                    Err(Error::Transport("simulated failure at task 17".into()))
                } else {
                    Ok(())
                }
            },
            |_, ()| Ok(()),
        );

        assert!(result.is_err());
        // Dispatch should not have raced arbitrarily far past the failing task
        // given the small bounded lookahead.
        let seen = *max_seen.lock().unwrap();
        assert!(seen < 100, "pipeline dispatched all tasks despite cancellation");
    }

    #[test]
    fn empty_input_is_a_no_op() {
        let items: Vec<usize> = Vec::new();
        let cancel = CancellationToken::new();
        pipeline(&items, 4, None, &cancel, |_, _: &usize| Ok(()), |_, ()| Ok(())).unwrap();
    }
}
