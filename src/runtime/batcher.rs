use super::channel::{channel, SignalReceiver, SignalSender};
use super::ticker::TickSource;
use crate::batch::{Batch, BatchBuffer};
use crate::signal::Signal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Running batcher task and its output.
///
/// Dropping the handle stops the task.
#[derive(Debug)]
pub struct BatcherHandle<T, E> {
    output: SignalReceiver<Batch<T>, E>,
    task: JoinHandle<()>,
}

impl<T, E> BatcherHandle<T, E> {
    /// Next batch or terminal signal; `None` once the task has finished.
    pub async fn recv(&mut self) -> Option<Signal<Batch<T>, E>> {
        self.output.recv().await
    }

    /// Stop processing input. Pending events are lost.
    ///
    /// The task is aborted at once; the runtime drops its ticker and source
    /// the next time it polls the task. Use [`shutdown`](Self::shutdown) to
    /// wait for that release.
    pub fn stop(&self) {
        self.task.abort();
    }

    /// Stop the task and return once its ticker and source are dropped.
    pub async fn shutdown(mut self) {
        self.task.abort();
        if let Err(err) = (&mut self.task).await {
            if !err.is_cancelled() {
                debug!(%err, "batcher task ended abnormally");
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<T, E> Drop for BatcherHandle<T, E> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Drive `buffer` from `source`, `ticker` and `manual` on one task.
///
/// All three inputs are serialized through a single biased `select!`, so
/// events already queued are applied before a tick or manual request seen in
/// the same wake-up. Closing `manual` only disables the manual trigger;
/// dropping every source sender counts as completion.
pub fn spawn_batcher<T, E, K>(
    buffer: BatchBuffer<T>,
    source: SignalReceiver<T, E>,
    ticker: K,
    manual: mpsc::UnboundedReceiver<()>,
) -> BatcherHandle<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
    K: TickSource + 'static,
{
    let (tx, output) = channel();
    let task = tokio::spawn(run(buffer, source, ticker, manual, tx));
    BatcherHandle { output, task }
}

async fn run<T, E, K>(
    mut buffer: BatchBuffer<T>,
    mut source: SignalReceiver<T, E>,
    mut ticker: K,
    mut manual: mpsc::UnboundedReceiver<()>,
    out: SignalSender<Batch<T>, E>,
) where
    K: TickSource,
{
    let mut ticking = true;
    let mut manual_open = true;

    loop {
        tokio::select! {
            biased;

            signal = source.recv() => {
                let signal = signal.unwrap_or_else(|| {
                    debug!("source dropped without a terminal signal, completing");
                    Signal::Completed
                });
                let terminal = signal.is_terminal();
                for emitted in buffer.handle(signal) {
                    if out.send(emitted).is_err() {
                        debug!("batch consumer gone, stopping");
                        return;
                    }
                }
                if terminal {
                    return;
                }
            }

            alive = ticker.tick(), if ticking => {
                if !alive {
                    debug!("tick source exhausted");
                    ticking = false;
                    continue;
                }
                if let Some(batch) = buffer.on_tick() {
                    if out.next(batch).is_err() {
                        return;
                    }
                }
            }

            request = manual.recv(), if manual_open => match request {
                Some(()) => {
                    if let Some(batch) = buffer.on_manual() {
                        if out.next(batch).is_err() {
                            return;
                        }
                    }
                }
                None => {
                    debug!("manual flush source closed");
                    manual_open = false;
                }
            },
        }
    }
}
