// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Background loading with a single timeout.
//!
//! Work runs on its own thread and reports back over a channel. The
//! caller polls once per UI frame; once the deadline passes the load
//! reports a timeout and is not waited on again. Each load carries a
//! generation so a result for a superseded request can be recognised and
//! dropped.

use crate::error::{MediaError, MediaResult};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::time::{Duration, Instant};

/// Outcome of a non-blocking check.
#[derive(Debug)]
pub enum LoadPoll<T> {
    Pending,
    Ready(MediaResult<T>),
}

/// Handle to work running on a background thread.
#[derive(Debug)]
pub struct PendingLoad<T> {
    receiver: Receiver<MediaResult<T>>,
    generation: u64,
    deadline: Instant,
    timeout: Duration,
}

impl<T: Send + 'static> PendingLoad<T> {
    /// Run `work` on a new thread.
    pub fn spawn<F>(generation: u64, timeout: Duration, work: F) -> Self
    where
        F: FnOnce() -> MediaResult<T> + Send + 'static,
    {
        let (sender, receiver) = channel();
        std::thread::spawn(move || {
            let _ = sender.send(work());
        });
        Self {
            receiver,
            generation,
            deadline: Instant::now() + timeout,
            timeout,
        }
    }
}

impl<T> PendingLoad<T> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Check for a result without blocking.
    pub fn poll(&self) -> LoadPoll<T> {
        match self.receiver.try_recv() {
            Ok(result) => LoadPoll::Ready(result),
            Err(TryRecvError::Disconnected) => LoadPoll::Ready(Err(MediaError::Disconnected)),
            Err(TryRecvError::Empty) if Instant::now() >= self.deadline => {
                log::warn!("Load {} timed out after {:?}", self.generation, self.timeout);
                LoadPoll::Ready(Err(MediaError::TimedOut(self.timeout)))
            }
            Err(TryRecvError::Empty) => LoadPoll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll_until_ready<T>(load: &PendingLoad<T>) -> MediaResult<T> {
        loop {
            match load.poll() {
                LoadPoll::Pending => std::thread::sleep(Duration::from_millis(1)),
                LoadPoll::Ready(result) => break result,
            }
        }
    }

    #[test]
    fn test_poll_returns_result() {
        let load = PendingLoad::spawn(1, Duration::from_secs(5), || Ok(42));
        assert_eq!(load.generation(), 1);
        assert_eq!(poll_until_ready(&load).unwrap(), 42);
    }

    #[test]
    fn test_poll_reports_errors() {
        let load: PendingLoad<u8> = PendingLoad::spawn(3, Duration::from_secs(5), || Err(MediaError::Empty));
        assert!(matches!(poll_until_ready(&load), Err(MediaError::Empty)));
    }

    #[test]
    fn test_poll_times_out() {
        let load: PendingLoad<()> = PendingLoad::spawn(4, Duration::ZERO, || {
            std::thread::sleep(Duration::from_millis(200));
            Ok(())
        });
        assert!(matches!(load.poll(), LoadPoll::Ready(Err(MediaError::TimedOut(_)))));
    }
}
