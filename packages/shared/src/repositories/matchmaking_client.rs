use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::match_type::MatchType;
use crate::models::matchmaking::{FormingGroup, PlayerEntry};
use crate::services::match_policy::{admit, check_complete, Admission, MatchState};

#[cfg(test)]
use mockall::automock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Success { match_id: Uuid },
    Cancelled,
    AlreadyRequested,
    Timeout,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Success,
    NoRequest,
    Error,
}

/// Matchmaking queue. `start` resolves when the request reaches a terminal
/// state; completed groups are handed to a [`MatchCompletionHandler`] by the
/// queue itself.
///
/// The request must be queued by the time the `start` future first returns
/// `Pending`, so that a `cancel` issued afterwards finds it.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MatchmakingClient: Send + Sync {
    async fn start(&self, match_type: MatchType, player: PlayerEntry) -> MatchOutcome;
    async fn cancel(&self, match_type: MatchType, account_id: &str) -> CancelOutcome;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait MatchCompletionHandler: Send + Sync {
    async fn on_match_complete(&self, group: FormingGroup);
}

#[derive(Default)]
struct QueueState {
    groups: HashMap<MatchType, Vec<FormingGroup>>,
    waiters: HashMap<String, oneshot::Sender<MatchOutcome>>,
}

impl QueueState {
    /// Takes `account_id` out of whichever group holds it, dropping the group
    /// if it ends up empty.
    fn withdraw(&mut self, account_id: &str) -> Option<oneshot::Sender<MatchOutcome>> {
        let waiter = self.waiters.remove(account_id)?;
        for groups in self.groups.values_mut() {
            if let Some(index) = groups.iter().position(|g| g.contains(account_id)) {
                groups[index].remove_player(account_id);
                if groups[index].players.is_empty() {
                    groups.remove(index);
                }
                break;
            }
        }
        Some(waiter)
    }
}

/// Queue kept in process memory. Players are offered to the groups of their
/// match type in creation order; a new group is opened when none admits them.
pub struct InProcessMatchmaker {
    state: Mutex<QueueState>,
    completion_handler: Arc<dyn MatchCompletionHandler + Send + Sync>,
    timeout: Option<Duration>,
}

impl InProcessMatchmaker {
    pub fn new(
        completion_handler: Arc<dyn MatchCompletionHandler + Send + Sync>,
        timeout: Option<Duration>,
    ) -> Self {
        InProcessMatchmaker {
            state: Mutex::new(QueueState::default()),
            completion_handler,
            timeout,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues the player and returns the group it completed, if any.
    fn enqueue(
        &self,
        match_type: MatchType,
        player: PlayerEntry,
        waiter: oneshot::Sender<MatchOutcome>,
    ) -> Result<Option<FormingGroup>, oneshot::Sender<MatchOutcome>> {
        let mut guard = self.lock();
        let state = &mut *guard;

        if state.waiters.contains_key(&player.account_id) {
            return Err(waiter);
        }

        let now = Utc::now();
        let groups = state.groups.entry(match_type).or_default();
        let mut admitted_to = None;
        for (index, group) in groups.iter_mut().enumerate() {
            group.refresh_elapsed(now);
            if let Admission::Accept(team) = admit(&player, group) {
                debug!(
                    "Admitted to group: account_id={}, match_id={}, team={:?}",
                    player.account_id, group.match_id, team
                );
                admitted_to = Some(index);
                break;
            }
        }

        let index = match admitted_to {
            Some(index) => index,
            None => {
                let mut group = FormingGroup::new(match_type);
                admit(&player, &mut group);
                debug!(
                    "Opened group: account_id={}, match_id={}",
                    player.account_id, group.match_id
                );
                groups.push(group);
                groups.len() - 1
            }
        };

        let account_id = player.account_id.clone();
        groups[index].players.push(player);
        state.waiters.insert(account_id, waiter);

        if check_complete(&groups[index]) == MatchState::NeedsMorePlayers {
            return Ok(None);
        }

        let group = groups.remove(index);
        for account_id in group.account_ids() {
            if let Some(waiter) = state.waiters.remove(&account_id) {
                let _ = waiter.send(MatchOutcome::Success {
                    match_id: group.match_id,
                });
            }
        }
        Ok(Some(group))
    }
}

#[async_trait]
impl MatchmakingClient for InProcessMatchmaker {
    async fn start(&self, match_type: MatchType, player: PlayerEntry) -> MatchOutcome {
        let account_id = player.account_id.clone();
        let (waiter, mut receiver) = oneshot::channel();

        match self.enqueue(match_type, player, waiter) {
            Err(_) => {
                warn!("Matchmaking already requested: account_id={}", account_id);
                return MatchOutcome::AlreadyRequested;
            }
            Ok(Some(group)) => {
                info!(
                    "Match complete: match_id={}, match_type={}, players={}",
                    group.match_id,
                    group.match_type,
                    group.players.len()
                );
                let handler = self.completion_handler.clone();
                tokio::spawn(async move { handler.on_match_complete(group).await });
            }
            Ok(None) => {}
        }

        let Some(limit) = self.timeout else {
            return receiver.await.unwrap_or(MatchOutcome::Error);
        };

        match tokio::time::timeout(limit, &mut receiver).await {
            Ok(outcome) => outcome.unwrap_or(MatchOutcome::Error),
            Err(_) => {
                if self.lock().withdraw(&account_id).is_some() {
                    info!("Matchmaking timed out: account_id={}", account_id);
                    return MatchOutcome::Timeout;
                }
                // resolved while the timer fired
                receiver.await.unwrap_or(MatchOutcome::Error)
            }
        }
    }

    async fn cancel(&self, match_type: MatchType, account_id: &str) -> CancelOutcome {
        let Some(waiter) = self.lock().withdraw(account_id) else {
            debug!(
                "Nothing to cancel: account_id={}, match_type={}",
                account_id, match_type
            );
            return CancelOutcome::NoRequest;
        };

        let _ = waiter.send(MatchOutcome::Cancelled);
        info!(
            "Matchmaking cancelled: account_id={}, match_type={}",
            account_id, match_type
        );
        CancelOutcome::Success
    }
}
