//! Backend pool – hands out exclusive backend instances to concurrent
//! generations.
//!
//! Each generation borrows one instance for its full duration and returns it
//! on drop. Sizing the pool bounds generation concurrency; there is never a
//! process-wide shared backend.

use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex};

/// A fixed set of backend instances with blocking checkout.
pub struct BackendPool<B> {
    idle: Mutex<Vec<B>>,
    available: Condvar,
}

impl<B> BackendPool<B> {
    /// Build a pool from pre-constructed backend instances.
    pub fn new(backends: Vec<B>) -> Self {
        assert!(!backends.is_empty(), "a backend pool cannot be empty");
        Self {
            idle: Mutex::new(backends),
            available: Condvar::new(),
        }
    }

    /// Build a pool of `size` instances from a constructor.
    pub fn with_capacity(size: usize, mut make: impl FnMut() -> B) -> Self {
        Self::new((0..size.max(1)).map(|_| make()).collect())
    }

    /// Borrow an instance, blocking until one is idle.
    pub fn acquire(&self) -> PooledBackend<'_, B> {
        let mut idle = self.idle.lock().expect("backend pool poisoned");
        loop {
            if let Some(backend) = idle.pop() {
                return PooledBackend {
                    pool: self,
                    backend: Some(backend),
                };
            }
            idle = self.available.wait(idle).expect("backend pool poisoned");
        }
    }

    /// Number of currently idle instances.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().expect("backend pool poisoned").len()
    }

    fn release(&self, backend: B) {
        self.idle.lock().expect("backend pool poisoned").push(backend);
        self.available.notify_one();
    }
}

/// RAII handle to a borrowed backend; returns it to the pool on drop.
pub struct PooledBackend<'a, B> {
    pool: &'a BackendPool<B>,
    backend: Option<B>,
}

impl<B> Deref for PooledBackend<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        self.backend.as_ref().expect("backend already returned")
    }
}

impl<B> DerefMut for PooledBackend<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        self.backend.as_mut().expect("backend already returned")
    }
}

impl<B> Drop for PooledBackend<'_, B> {
    fn drop(&mut self) {
        if let Some(backend) = self.backend.take() {
            self.pool.release(backend);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn acquire_and_release() {
        let pool = BackendPool::new(vec![1u32, 2u32]);
        assert_eq!(pool.idle_count(), 2);
        {
            let a = pool.acquire();
            let b = pool.acquire();
            assert_eq!(pool.idle_count(), 0);
            assert_ne!(*a, *b);
        }
        assert_eq!(pool.idle_count(), 2);
    }

    #[test]
    fn blocked_acquire_resumes_after_release() {
        let pool = Arc::new(BackendPool::with_capacity(1, || 7u32));
        let guard = pool.acquire();

        let waiter = {
            let pool = Arc::clone(&pool);
            std::thread::spawn(move || *pool.acquire())
        };

        // The waiter can only finish once the guard is dropped.
        std::thread::sleep(std::time::Duration::from_millis(20));
        drop(guard);
        assert_eq!(waiter.join().unwrap(), 7);
    }

    #[test]
    fn with_capacity_never_builds_an_empty_pool() {
        let pool = BackendPool::with_capacity(0, || 0u8);
        assert_eq!(pool.idle_count(), 1);
    }
}
