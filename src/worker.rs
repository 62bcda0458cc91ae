//! The serial background queue that `render_next` dispatches onto.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::decoder::{Engine, RenderOutcome};
use crate::ApngResult;

pub(crate) enum Job {
  Advance,
  Quit,
}

/// One worker thread processing render jobs strictly in order.
///
/// The engine lock is what serializes the reader, the canvas, and the cache;
/// the single thread is what keeps completions in request order.
pub(crate) struct RenderWorker {
  jobs: Sender<Job>,
  pub(crate) outcomes: Receiver<RenderOutcome>,
  handle: Option<JoinHandle<()>>,
}
impl RenderWorker {
  pub(crate) fn spawn(engine: Arc<Mutex<Engine>>) -> ApngResult<Self> {
    let (jobs, job_rx) = channel::<Job>();
    let (outcome_tx, outcomes) = channel::<RenderOutcome>();
    let handle = std::thread::Builder::new().name("anipng-render".into()).spawn(move || {
      while let Ok(Job::Advance) = job_rx.recv() {
        let outcome = {
          let mut engine = engine.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
          engine.advance()
        };
        if outcome_tx.send(outcome).is_err() {
          // receiver side is gone, nothing left to render for.
          break;
        }
      }
    })?;
    Ok(Self { jobs, outcomes, handle: Some(handle) })
  }

  /// Enqueues one advance-and-render job.
  pub(crate) fn enqueue_advance(&self) {
    // a send can only fail if the thread is gone, and then the outcome
    // channel reports the problem to the poller anyway.
    let _ = self.jobs.send(Job::Advance);
  }
}
impl Drop for RenderWorker {
  fn drop(&mut self) {
    let _ = self.jobs.send(Job::Quit);
    if let Some(handle) = self.handle.take() {
      let _ = handle.join();
    }
  }
}
