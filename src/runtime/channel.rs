//! Unbounded signal channels connecting sources, drivers and consumers.

use crate::clock::Clock;
use crate::error::SendError;
use crate::signal::Signal;
use crate::window::Timestamped;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Create a signal channel. Sending never waits.
pub fn channel<T, E>() -> (SignalSender<T, E>, SignalReceiver<T, E>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SignalSender { tx }, SignalReceiver { rx })
}

/// Producer side of a signal channel.
#[derive(Debug)]
pub struct SignalSender<T, E> {
    tx: mpsc::UnboundedSender<Signal<T, E>>,
}

impl<T, E> Clone for SignalSender<T, E> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone() }
    }
}

impl<T, E> SignalSender<T, E> {
    pub fn send(&self, signal: Signal<T, E>) -> Result<(), SendError> {
        self.tx.send(signal).map_err(|_| SendError)
    }

    pub fn next(&self, value: T) -> Result<(), SendError> {
        self.send(Signal::Next(value))
    }

    pub fn complete(&self) -> Result<(), SendError> {
        self.send(Signal::Completed)
    }

    pub fn fail(&self, err: E) -> Result<(), SendError> {
        self.send(Signal::Failed(err))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side of a signal channel.
#[derive(Debug)]
pub struct SignalReceiver<T, E> {
    rx: mpsc::UnboundedReceiver<Signal<T, E>>,
}

impl<T, E> SignalReceiver<T, E> {
    /// Next signal, or `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<Signal<T, E>> {
        self.rx.recv().await
    }

    /// A signal already queued, without waiting.
    pub fn try_recv(&mut self) -> Option<Signal<T, E>> {
        self.rx.try_recv().ok()
    }

    /// Read until a terminal signal (included) or until the senders are gone.
    pub async fn collect(mut self) -> Vec<Signal<T, E>> {
        let mut out = Vec::new();
        while let Some(signal) = self.rx.recv().await {
            let terminal = signal.is_terminal();
            out.push(signal);
            if terminal {
                break;
            }
        }
        out
    }
}

/// Sender that stamps each value with its arrival time.
///
/// The timestamp is read when [`next`](Self::next) is called, so arrival
/// order and arrival time are fixed at ingress whatever the scheduling of
/// the consuming task.
pub struct TimestampingSender<T, E> {
    inner: SignalSender<Timestamped<T>, E>,
    clock: Arc<dyn Clock>,
}

impl<T, E> Clone for TimestampingSender<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<T, E> TimestampingSender<T, E> {
    pub fn new(inner: SignalSender<Timestamped<T>, E>, clock: Arc<dyn Clock>) -> Self {
        Self { inner, clock }
    }

    pub fn next(&self, value: T) -> Result<(), SendError> {
        let ts = self.clock.now_ms();
        self.inner.next(Timestamped::new(ts, value))
    }

    pub fn complete(&self) -> Result<(), SendError> {
        self.inner.complete()
    }

    pub fn fail(&self, err: E) -> Result<(), SendError> {
        self.inner.fail(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::time::Duration;

    #[tokio::test]
    async fn collect_stops_at_terminal_signal() {
        let (tx, rx) = channel::<u32, String>();
        tx.next(1).unwrap();
        tx.fail("boom".into()).unwrap();
        tx.next(2).unwrap();
        assert_eq!(rx.collect().await, vec![Signal::Next(1), Signal::Failed("boom".into())]);
    }

    #[tokio::test]
    async fn send_after_receiver_dropped_fails() {
        let (tx, rx) = channel::<u32, ()>();
        drop(rx);
        assert!(tx.is_closed());
        assert_eq!(tx.next(1), Err(SendError));
    }

    #[test]
    fn try_recv_does_not_wait() {
        let (tx, mut rx) = channel::<u32, ()>();
        assert_eq!(rx.try_recv(), None);
        tx.next(7).unwrap();
        assert_eq!(rx.try_recv(), Some(Signal::Next(7)));
        assert_eq!(rx.try_recv(), None);
    }

    #[tokio::test]
    async fn timestamps_are_taken_at_send() {
        let clock = Arc::new(ManualClock::new());
        let (tx, mut rx) = channel::<Timestamped<&str>, ()>();
        let tx = TimestampingSender::new(tx, clock.clone());
        tx.next("a").unwrap();
        clock.advance(Duration::from_millis(250));
        tx.next("b").unwrap();
        assert_eq!(rx.recv().await, Some(Signal::Next(Timestamped::new(0, "a"))));
        assert_eq!(rx.recv().await, Some(Signal::Next(Timestamped::new(250, "b"))));
    }
}
