use super::{credentials::*, error::*, request::*};

use {
    serde_json::json,
    std::sync::{atomic::*, *},
    tokio::sync::Mutex,
    tower::*,
};

//
// RefreshCoordinator
//

/// Credential refresh coordinator.
///
/// Guarantees at-most-one-concurrent refresh: the first caller to observe an
/// authorization failure performs the refresh network call, and every caller
/// that arrives while it is in flight queues behind it and adopts its outcome
/// instead of triggering a second call.
///
/// The state machine is `IDLE → REFRESHING → IDLE`; holding the internal mutex
/// *is* the `REFRESHING` state, and the queued callers are the tasks awaiting
/// the lock. An epoch counter readable without the lock lets callers detect
/// that a refresh settled between their failed attempt and their turn at the
/// lock.
///
/// The coordinator owns its own transport handle so that the refresh request
/// bypasses the authorization middleware: it authenticates with the refresh
/// token in its body, not with a bearer header.
///
/// Each coordinator is an independent instance; nothing is process-global, so
/// tests can create as many as they like without leakage.
///
/// Failure semantics:
///
/// * Refresh rejection (a non-success response, or a success response without a
///   credential pair in its body) is **fatal** for the session: the store is
///   cleared, and this caller and every queued caller fail with
///   [Unauthenticated](ClientError::Unauthenticated).
///
/// * A transport-level failure on the refresh call is transient: epoch and
///   store stay untouched, the error propagates through the caller's normal
///   error path, and the next authorization failure will retry the refresh.
pub struct RefreshCoordinator<TransportT, StoreT> {
    store: StoreT,
    refresh_path: Arc<str>,
    epoch: AtomicU64,
    state: Mutex<RefreshState<TransportT>>,
}

struct RefreshState<TransportT> {
    transport: TransportT,
    epoch: u64,
}

impl<TransportT, StoreT> RefreshCoordinator<TransportT, StoreT>
where
    TransportT: Service<ApiRequest, Response = ApiResponse, Error = TransportError>,
    StoreT: CredentialStore,
{
    /// Constructor.
    pub fn new(transport: TransportT, store: StoreT, refresh_path: Arc<str>) -> Self {
        Self {
            store,
            refresh_path,
            epoch: AtomicU64::default(),
            state: Mutex::new(RefreshState { transport, epoch: 0 }),
        }
    }

    /// The current epoch.
    ///
    /// Capture this *before* the request attempt whose failure might lead to
    /// [ensure_fresh](Self::ensure_fresh); it is how the coordinator tells a
    /// stale failure from a fresh one.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Ensure that the stored credentials are fresher than the ones observed at
    /// `observed_epoch`.
    ///
    /// Refreshes at most once per epoch; see the type documentation for the
    /// queuing and failure semantics.
    pub async fn ensure_fresh(&self, observed_epoch: u64) -> Result<(), ClientError> {
        let mut state = self.state.lock().await;

        if state.epoch != observed_epoch {
            // A refresh settled while we were waiting for the lock; adopt its
            // outcome
            return match self.store.get() {
                Some(_) => Ok(()),
                None => Err(ClientError::Unauthenticated),
            };
        }

        let Some(credentials) = self.store.get() else {
            return Err(ClientError::Unauthenticated);
        };

        tracing::debug!("refreshing");

        let request = ApiRequest::post(self.refresh_path.as_ref())
            .with_body(json!({"refreshToken": credentials.refresh_token}));

        let response = state.transport.ready().await?.call(request).await?;

        if response.is_success()
            && let Some(credentials) = Credentials::from_json(&response.body)
        {
            self.store.set(credentials);
            state.epoch += 1;
            self.epoch.store(state.epoch, Ordering::Release);

            tracing::debug!("refreshed");
            Ok(())
        } else {
            tracing::debug!("refresh rejected ({})", response.status);

            self.store.clear();
            state.epoch += 1;
            self.epoch.store(state.epoch, Ordering::Release);

            Err(ClientError::Unauthenticated)
        }
    }
}
