#[cfg(not(feature = "loom"))]
pub(crate) use parking_lot::{Mutex, MutexGuard};

#[cfg(feature = "loom")]
pub(crate) use loom::sync::MutexGuard;

#[cfg(not(feature = "loom"))]
#[derive(Default)]
pub(crate) struct Condvar {
    inner: parking_lot::Condvar,
}

#[cfg(not(feature = "loom"))]
impl Condvar {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Releases the lock behind `guard` while blocked and re-acquires it before returning.
    pub(crate) fn wait<'a, T>(&self, mut guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        self.inner.wait(&mut guard);
        guard
    }

    pub(crate) fn notify_one(&self) {
        self.inner.notify_one();
    }

    pub(crate) fn notify_all(&self) {
        self.inner.notify_all();
    }
}

#[cfg(feature = "loom")]
pub(crate) struct Mutex<T> {
    inner: loom::sync::Mutex<T>,
}

#[cfg(feature = "loom")]
impl<T> Mutex<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            inner: loom::sync::Mutex::new(value),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock().unwrap()
    }
}

#[cfg(feature = "loom")]
pub(crate) struct Condvar {
    inner: loom::sync::Condvar,
}

#[cfg(feature = "loom")]
impl Condvar {
    pub(crate) fn new() -> Self {
        Self {
            inner: loom::sync::Condvar::new(),
        }
    }

    pub(crate) fn wait<'a, T>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        self.inner.wait(guard).unwrap()
    }

    pub(crate) fn notify_one(&self) {
        self.inner.notify_one();
    }

    pub(crate) fn notify_all(&self) {
        self.inner.notify_all();
    }
}
