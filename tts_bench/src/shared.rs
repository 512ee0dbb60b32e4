use std::sync::{Arc, Mutex, MutexGuard};

use tts_core::StreamingEngine;

/// One engine instance shared by every worker of a session.
///
/// Only the holder of the guard returned by [`SharedEngine::lock`] may open or
/// consume a stream. The guard is released when dropped, on every exit path.
pub struct SharedEngine<E> {
    inner: Arc<Mutex<E>>,
    sample_rate: u32,
}

impl<E> Clone for SharedEngine<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            sample_rate: self.sample_rate,
        }
    }
}

impl<E: StreamingEngine> SharedEngine<E> {
    pub fn new(engine: E) -> Self {
        let sample_rate = engine.sample_rate();
        Self {
            inner: Arc::new(Mutex::new(engine)),
            sample_rate,
        }
    }

    /// Cached at construction, readable without taking the lock.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Block until the engine is free.
    pub fn lock(&self) -> anyhow::Result<MutexGuard<'_, E>> {
        // Poisoned only if a previous holder panicked mid-stream
        self.inner.lock().map_err(|_| {
            anyhow::anyhow!("Engine lock poisoned - a previous request panicked while streaming")
        })
    }
}
