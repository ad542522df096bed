use super::channel::{channel, SignalReceiver, SignalSender};
use crate::flood::FloodFilter;
use crate::signal::Signal;
use crate::window::Timestamped;
use tokio::task::JoinHandle;
use tracing::debug;

/// Running flood filter task and its output.
///
/// Dropping the handle stops the task.
#[derive(Debug)]
pub struct FilterHandle<T, E> {
    output: SignalReceiver<T, E>,
    task: JoinHandle<()>,
}

impl<T, E> FilterHandle<T, E> {
    pub async fn recv(&mut self) -> Option<Signal<T, E>> {
        self.output.recv().await
    }

    /// Forwarded values up to and including the terminal signal.
    pub async fn collect(mut self) -> Vec<Signal<T, E>> {
        let output = std::mem::replace(&mut self.output, channel().1);
        output.collect().await
    }

    /// Abort the task; its source is dropped the next time the runtime
    /// polls it.
    pub fn stop(&self) {
        self.task.abort();
    }

    /// Stop the task and return once its source is dropped.
    pub async fn shutdown(mut self) {
        self.task.abort();
        if let Err(err) = (&mut self.task).await {
            if !err.is_cancelled() {
                debug!(%err, "flood filter task ended abnormally");
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<T, E> Drop for FilterHandle<T, E> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Run `filter` over pre-stamped arrivals on its own task.
///
/// Use a [`TimestampingSender`](super::TimestampingSender) on the source side
/// so arrivals are stamped when they are produced.
pub fn spawn_flood_filter<T, E>(
    filter: FloodFilter<T>,
    source: SignalReceiver<Timestamped<T>, E>,
) -> FilterHandle<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    let (tx, output) = channel();
    let task = tokio::spawn(run(filter, source, tx));
    FilterHandle { output, task }
}

async fn run<T, E>(
    mut filter: FloodFilter<T>,
    mut source: SignalReceiver<Timestamped<T>, E>,
    out: SignalSender<T, E>,
) {
    while !filter.is_terminated() {
        let signal = source.recv().await.unwrap_or_else(|| {
            debug!("source dropped without a terminal signal, completing");
            Signal::Completed
        });
        if let Some(emitted) = filter.handle(signal) {
            if out.send(emitted).is_err() {
                debug!("filter consumer gone, stopping");
                return;
            }
        }
    }
}
