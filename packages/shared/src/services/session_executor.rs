use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::{self, error::SendError, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error};

use crate::models::session::SessionId;

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;
type Queues = Arc<Mutex<HashMap<SessionId, UnboundedSender<Job>>>>;

tokio::task_local! {
    static CURRENT_SESSION: SessionId;
}

/// Session whose executor is running the current task, if any.
pub fn current_session() -> Option<SessionId> {
    CURRENT_SESSION.try_with(|id| *id).ok()
}

/// Runs work for one session strictly in submission order, while work for
/// different sessions runs concurrently.
///
/// Each session gets a worker task on its first job. The worker exits once
/// its queue is drained, and the next job starts a fresh one.
#[derive(Clone, Default)]
pub struct SessionExecutor {
    queues: Queues,
}

impl SessionExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invoke<F>(&self, session_id: SessionId, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut queues = lock(&self.queues);
        let job: Job = Box::pin(job);

        // the worker may have been cancelled with the runtime
        let job = match queues.get(&session_id) {
            Some(sender) => match sender.send(job) {
                Ok(()) => return,
                Err(SendError(job)) => job,
            },
            None => job,
        };

        let (sender, receiver) = mpsc::unbounded_channel();
        if sender.send(job).is_err() {
            return;
        }
        queues.insert(session_id, sender);
        tokio::spawn(run_worker(self.queues.clone(), session_id, receiver));
    }

    /// Number of sessions with a live worker.
    pub fn active_sessions(&self) -> usize {
        lock(&self.queues).len()
    }
}

fn lock(queues: &Queues) -> MutexGuard<'_, HashMap<SessionId, UnboundedSender<Job>>> {
    queues.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn run_worker(queues: Queues, session_id: SessionId, mut receiver: UnboundedReceiver<Job>) {
    loop {
        let job = match receiver.try_recv() {
            Ok(job) => job,
            Err(_) => {
                // senders only push while holding this lock, so an empty queue
                // seen here stays empty until the entry is gone
                let mut guard = lock(&queues);
                match receiver.try_recv() {
                    Ok(job) => job,
                    Err(_) => {
                        guard.remove(&session_id);
                        debug!("Session worker idle: session_id={}", session_id);
                        return;
                    }
                }
            }
        };

        if let Err(e) = tokio::spawn(CURRENT_SESSION.scope(session_id, job)).await {
            error!("Session job failed: session_id={}, error={}", session_id, e);
        }
    }
}
