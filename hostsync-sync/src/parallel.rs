//! Bounded worker pool over scoped threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam::channel;
use parking_lot::Mutex;

/// Run `task` over `items` on at most `concurrency` threads.
///
/// Items are handed out in arbitrary order. After the first error no new
/// items are started; items already running finish, and that first error
/// is returned.
pub fn try_for_each_bounded<T, E, F>(items: Vec<T>, concurrency: usize, task: F) -> Result<(), E>
where
    T: Send,
    E: Send,
    F: Fn(T) -> Result<(), E> + Sync,
{
    if items.is_empty() {
        return Ok(());
    }
    let workers = concurrency.max(1).min(items.len());

    let (tx, rx) = channel::unbounded();
    for item in items {
        // The receiver is alive until the end of this function.
        let _ = tx.send(item);
    }
    drop(tx);

    let stop = AtomicBool::new(false);
    let first_error: Mutex<Option<E>> = Mutex::new(None);

    thread::scope(|scope| {
        for _ in 0..workers {
            let rx = rx.clone();
            let task = &task;
            let stop = &stop;
            let first_error = &first_error;
            scope.spawn(move || {
                while let Ok(item) = rx.recv() {
                    if stop.load(Ordering::Relaxed) {
                        break;
                    }
                    if let Err(err) = task(item) {
                        stop.store(true, Ordering::Relaxed);
                        first_error.lock().get_or_insert(err);
                        break;
                    }
                }
            });
        }
    });

    match first_error.into_inner() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn runs_every_item() {
        let sum = AtomicUsize::new(0);
        let result: Result<(), ()> = try_for_each_bounded((1..=100).collect(), 8, |n: usize| {
            sum.fetch_add(n, Ordering::Relaxed);
            Ok(())
        });
        assert!(result.is_ok());
        assert_eq!(sum.load(Ordering::Relaxed), 5050);
    }

    #[test]
    fn never_exceeds_concurrency() {
        let active = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let result: Result<(), ()> = try_for_each_bounded((0..64).collect(), 3, |_: u32| {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(2));
            active.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        });
        assert!(result.is_ok());
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[test]
    fn returns_first_error() {
        let result = try_for_each_bounded(vec![1, 2, 3], 1, |n: i32| {
            if n == 2 {
                Err(format!("item {n}"))
            } else {
                Ok(())
            }
        });
        assert_eq!(result.unwrap_err(), "item 2");
    }

    #[test]
    fn empty_input_is_ok() {
        let result: Result<(), ()> = try_for_each_bounded(Vec::<u8>::new(), 4, |_| Err(()));
        assert!(result.is_ok());
    }
}
