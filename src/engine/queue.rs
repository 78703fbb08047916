//! Bounded blocking FIFO with cooperative close.
//!
//! Both per-region queues are instances of this type. `close` wakes every
//! blocked producer and consumer; a worker observing a closed queue exits
//! at that operation. Closure is the engine's only teardown signal — a
//! thread cannot be interrupted mid-step.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};

/// Error returned by [`BoundedQueue::try_push`]; hands the item back.
#[derive(Debug)]
pub(crate) enum TryPushError<T> {
    /// The queue is at capacity.
    Full(T),
    /// The queue has been closed.
    Closed(T),
}

/// Error returned by blocking operations on a closed queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Closed;

struct QueueInner<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Capacity-bounded, blocking, closeable FIFO.
pub(crate) struct BoundedQueue<T> {
    inner: Mutex<QueueInner<T>>,
    capacity: usize,
    not_empty: Condvar,
    not_full: Condvar,
}

impl<T> BoundedQueue<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "queue capacity must be positive");
        Self {
            inner: Mutex::new(QueueInner {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            capacity,
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    /// Pushes an item, blocking while the queue is full.
    pub(crate) fn push(&self, item: T) -> Result<(), Closed> {
        let mut inner = self.lock();
        loop {
            if inner.closed {
                return Err(Closed);
            }
            if inner.items.len() < self.capacity {
                inner.items.push_back(item);
                self.not_empty.notify_one();
                return Ok(());
            }
            inner = self.not_full.wait(inner).expect("queue lock poisoned");
        }
    }

    /// Pushes an item if there is room right now.
    pub(crate) fn try_push(&self, item: T) -> Result<(), TryPushError<T>> {
        let mut inner = self.lock();
        if inner.closed {
            return Err(TryPushError::Closed(item));
        }
        if inner.items.len() >= self.capacity {
            return Err(TryPushError::Full(item));
        }
        inner.items.push_back(item);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Pops the oldest item, blocking while the queue is empty.
    pub(crate) fn pop(&self) -> Result<T, Closed> {
        let mut inner = self.lock();
        loop {
            if let Some(item) = inner.items.pop_front() {
                self.not_full.notify_one();
                return Ok(item);
            }
            if inner.closed {
                return Err(Closed);
            }
            inner = self.not_empty.wait(inner).expect("queue lock poisoned");
        }
    }

    /// Pops the oldest item if one is ready and the queue is still open.
    ///
    /// Returns `None` on a closed queue even if items remain: teardown
    /// abandons queued content.
    pub(crate) fn try_pop(&self) -> Option<T> {
        let mut inner = self.lock();
        if inner.closed {
            return None;
        }
        let item = inner.items.pop_front();
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Closes the queue and wakes everything blocked on it.
    pub(crate) fn close(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        drop(inner);
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner<T>> {
        self.inner.lock().expect("queue lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn fifo_order() {
        let queue = BoundedQueue::new(4);
        queue.push(1).unwrap();
        queue.push(2).unwrap();
        queue.push(3).unwrap();
        assert_eq!(queue.try_pop(), Some(1));
        assert_eq!(queue.try_pop(), Some(2));
        assert_eq!(queue.try_pop(), Some(3));
        assert_eq!(queue.try_pop(), None);
    }

    #[test]
    fn try_push_full_returns_item() {
        let queue = BoundedQueue::new(1);
        queue.push(10).unwrap();
        match queue.try_push(11) {
            Err(TryPushError::Full(item)) => assert_eq!(item, 11),
            other => panic!("expected Full, got {other:?}"),
        }
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn blocking_pop_wakes_on_push() {
        let queue = Arc::new(BoundedQueue::new(2));
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop())
        };
        thread::sleep(Duration::from_millis(20));
        queue.push(99).unwrap();
        assert_eq!(consumer.join().unwrap(), Ok(99));
    }

    #[test]
    fn blocking_push_wakes_on_pop() {
        let queue = Arc::new(BoundedQueue::new(1));
        queue.push(1).unwrap();
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.push(2))
        };
        thread::sleep(Duration::from_millis(20));
        assert_eq!(queue.pop(), Ok(1));
        assert_eq!(producer.join().unwrap(), Ok(()));
        assert_eq!(queue.pop(), Ok(2));
    }

    #[test]
    fn close_wakes_blocked_consumer() {
        let queue: Arc<BoundedQueue<i32>> = Arc::new(BoundedQueue::new(1));
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop())
        };
        thread::sleep(Duration::from_millis(20));
        queue.close();
        assert_eq!(consumer.join().unwrap(), Err(Closed));
    }

    #[test]
    fn close_wakes_blocked_producer() {
        let queue = Arc::new(BoundedQueue::new(1));
        queue.push(1).unwrap();
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.push(2))
        };
        thread::sleep(Duration::from_millis(20));
        queue.close();
        assert_eq!(producer.join().unwrap(), Err(Closed));
    }

    #[test]
    fn closed_queue_abandons_content() {
        let queue = BoundedQueue::new(4);
        queue.push(1).unwrap();
        queue.close();
        assert_eq!(queue.try_pop(), None);
        assert!(matches!(queue.try_push(2), Err(TryPushError::Closed(2))));
    }
}
