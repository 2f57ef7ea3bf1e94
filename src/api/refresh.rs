//! Access token renewal
//!
//! When a request comes back with a 4xx-class envelope, exactly one refresh
//! call goes out. Requests that fail the same way while it is in flight are
//! parked in arrival order and replayed with the new token once it lands, or
//! rejected together if it does not.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tokio::sync::oneshot;

use super::envelope::Rejection;
use super::error::ApiError;
use super::transport::{dispatch, ApiRequest, HttpBackend};
use crate::auth::{CredentialStore, Navigator, LOGIN_ROUTE};

/// A request parked until the in-flight renewal settles.
struct PendingRequest {
    request: ApiRequest,
    reply: oneshot::Sender<Result<Value, ApiError>>,
}

#[derive(Default)]
struct RefreshState {
    renewing: bool,
    pending: VecDeque<PendingRequest>,
}

fn lock(state: &Mutex<RefreshState>) -> MutexGuard<'_, RefreshState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// Held by the task performing the renewal. Returns the state to idle when
/// finished, or when dropped early, in which case parked requests are
/// released with an error.
struct RenewalGuard {
    state: Arc<Mutex<RefreshState>>,
    finished: bool,
}

impl RenewalGuard {
    /// Go idle and hand back everything that queued up meanwhile.
    fn finish(&mut self) -> VecDeque<PendingRequest> {
        self.finished = true;
        let mut state = lock(&self.state);
        state.renewing = false;
        std::mem::take(&mut state.pending)
    }
}

impl Drop for RenewalGuard {
    fn drop(&mut self) {
        if !self.finished {
            let abandoned = self.finish();
            tracing::warn!(
                "Token refresh abandoned, releasing {} queued request(s)",
                abandoned.len()
            );
        }
    }
}

enum Admission {
    /// Caller performs the renewal
    Leader(RenewalGuard),
    /// Caller waits for the renewal already in flight
    Queued(oneshot::Receiver<Result<Value, ApiError>>),
}

/// Single-flight token renewal shared by every clone of the client.
#[derive(Clone)]
pub struct RefreshCoordinator {
    backend: Arc<dyn HttpBackend>,
    credentials: CredentialStore,
    navigator: Arc<dyn Navigator>,
    state: Arc<Mutex<RefreshState>>,
    max_pending: usize,
}

impl RefreshCoordinator {
    pub fn new(
        backend: Arc<dyn HttpBackend>,
        credentials: CredentialStore,
        navigator: Arc<dyn Navigator>,
        max_pending: usize,
    ) -> Self {
        Self {
            backend,
            credentials,
            navigator,
            state: Arc::new(Mutex::new(RefreshState::default())),
            max_pending,
        }
    }

    /// Settle a request whose envelope came back with `success: false`.
    ///
    /// Expiry-class rejections of requests not yet retried are absorbed: the
    /// caller sees the outcome of the replay instead. Everything else is
    /// returned as a business error.
    pub async fn handle_rejection(
        &self,
        mut request: ApiRequest,
        rejection: Rejection,
    ) -> Result<Value, ApiError> {
        if !rejection.is_expiry() || request.retried {
            return Err(reject(&request, rejection));
        }
        request.retried = true;

        match self.admit(&request)? {
            Admission::Queued(reply) => reply.await.unwrap_or_else(|_| {
                Err(ApiError::RefreshFailed(
                    "token refresh was abandoned".to_string(),
                ))
            }),
            Admission::Leader(guard) => self.renew(guard, request).await,
        }
    }

    /// Check-and-set of the renewing flag, or enqueue behind it.
    fn admit(&self, request: &ApiRequest) -> Result<Admission, ApiError> {
        let mut state = lock(&self.state);
        if !state.renewing {
            state.renewing = true;
            return Ok(Admission::Leader(RenewalGuard {
                state: self.state.clone(),
                finished: false,
            }));
        }

        if state.pending.len() >= self.max_pending {
            tracing::warn!(
                "Rejecting {} {}: {} requests already waiting for token refresh",
                request.method,
                request.path,
                state.pending.len()
            );
            return Err(ApiError::QueueFull(self.max_pending));
        }

        let (reply, receiver) = oneshot::channel();
        state.pending.push_back(PendingRequest {
            request: request.clone(),
            reply,
        });
        tracing::debug!(
            "{} {} waiting for token refresh ({} queued)",
            request.method,
            request.path,
            state.pending.len()
        );
        Ok(Admission::Queued(receiver))
    }

    async fn renew(
        &self,
        mut guard: RenewalGuard,
        request: ApiRequest,
    ) -> Result<Value, ApiError> {
        tracing::info!("Access token rejected, refreshing...");

        let token = match self.backend.refresh().await {
            Ok(token) => token,
            Err(e) => {
                tracing::error!("Token refresh failed: {}", e);
                self.credentials.clear();
                let failure = ApiError::RefreshFailed(e.to_string());
                for parked in guard.finish() {
                    let _ = parked.reply.send(Err(failure.clone()));
                }
                self.navigator.redirect(LOGIN_ROUTE);
                return Err(failure);
            }
        };

        self.credentials.set(&token);
        self.credentials
            .set_session_cookies(self.backend.session_cookies());

        let parked = guard.finish();
        tracing::info!("Token refreshed, replaying {} queued request(s)", parked.len());

        // The triggering request goes first, then the queue in arrival order.
        let (reply, own) = oneshot::channel();
        let mut replays = Vec::with_capacity(parked.len() + 1);
        replays.push(PendingRequest { request, reply });
        replays.extend(parked);

        let coordinator = self.clone();
        tokio::spawn(async move {
            coordinator.replay_all(replays, &token).await;
        });

        own.await
            .unwrap_or_else(|_| Err(ApiError::RefreshFailed("replay was cancelled".to_string())))
    }

    /// Dispatch every replay from one task. `join_all` polls its futures in
    /// order, so requests leave in the order given. Each waiter is answered
    /// as soon as its own response arrives.
    async fn replay_all(&self, replays: Vec<PendingRequest>, token: &str) {
        let replays = replays
            .into_iter()
            .map(move |PendingRequest { request, reply }| async move {
                let result = self.replay(&request, token).await;
                // The waiter may have given up; nothing to do then.
                let _ = reply.send(result);
            });
        futures::future::join_all(replays).await;
    }

    /// Resend with an explicit token. Any rejection here is final.
    async fn replay(&self, request: &ApiRequest, token: &str) -> Result<Value, ApiError> {
        dispatch(self.backend.as_ref(), request, Some(token))
            .await?
            .into_result()
            .map_err(|rejection| reject(request, rejection))
    }

    #[cfg(test)]
    pub(crate) fn pending_len(&self) -> usize {
        lock(&self.state).pending.len()
    }

    #[cfg(test)]
    pub(crate) fn is_renewing(&self) -> bool {
        lock(&self.state).renewing
    }
}

fn reject(request: &ApiRequest, rejection: Rejection) -> ApiError {
    tracing::warn!(
        "API business error for {} {}: code {} ({})",
        request.method,
        request.path,
        rejection.code,
        rejection.message.as_deref().unwrap_or("no detail")
    );
    rejection.into()
}
