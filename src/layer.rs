use super::{credentials::*, error::*, refresh::*, request::*, service::*};

use {std::sync::*, tower::*};

//
// AuthnLayer
//

/// Authenticated request pipeline layer.
///
/// This layer configures and installs an [AuthnService] around a transport: any
/// [Service]\<[ApiRequest]\> returning [ApiResponse] or [TransportError].
///
/// For more information and usage examples see the
/// [home page](https://github.com/tliron/tower-query-client).
///
/// Request handling
/// ================
///
/// Here we'll go over the complete processing flow in detail:
///
/// 1. Capture the [RefreshCoordinator] epoch, then attach the current access
///    token from the [CredentialStore] (if there is one) as a bearer
///    `Authorization` header.
///
/// 2. Call the transport. Any response other than 401 (Unauthorized), success
///    or failure, is returned to the caller as is. This layer never retries
///    validation errors (4xx) or server errors (5xx), and it never retries
///    transport-level failures.
///
/// 3. On 401 with no stored credentials there is nothing to refresh with, so the
///    caller gets a terminal
///    [Unauthenticated](ClientError::Unauthenticated) error.
///
/// 4. On 401 with credentials, ask the coordinator to
///    [ensure_fresh](RefreshCoordinator::ensure_fresh) credentials. Exactly one
///    refresh network call runs no matter how many requests fail concurrently;
///    the rest queue and adopt its outcome. A rejected refresh clears the store
///    and fails every queued caller: the session is over and feature code
///    should redirect to login.
///
/// 5. Re-attach the (now current) token and retry the original request exactly
///    once. A second 401 is terminal: retrying further could loop forever
///    against a misbehaving backend.
///
/// Usage notes
/// ===========
///
/// 1. The coordinator is created by this layer and shared by all clones of the
///    installed service, so the at-most-one-refresh guarantee spans every user
///    of one stack. Two separately-built stacks have independent coordinators.
///
/// 2. The refresh request (`POST` to the configured refresh path, with
///    `{"refreshToken": …}` as its body) goes through the *inner* transport
///    directly: it must not carry the dead bearer token, and it must not
///    recurse into this layer.
///
/// 3. The store is read at call time, never cached: a login or logout between
///    two requests is picked up by the next request.
#[derive(Clone)]
pub struct AuthnLayer<StoreT> {
    store: StoreT,
    refresh_path: Arc<str>,
}

impl<StoreT> AuthnLayer<StoreT>
where
    StoreT: CredentialStore,
{
    /// Constructor.
    pub fn new(store: StoreT, refresh_path: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            refresh_path: refresh_path.into(),
        }
    }
}

impl<InnerServiceT, StoreT> Layer<InnerServiceT> for AuthnLayer<StoreT>
where
    InnerServiceT: Service<ApiRequest, Response = ApiResponse, Error = TransportError> + Clone,
    StoreT: CredentialStore,
{
    type Service = AuthnService<InnerServiceT, StoreT>;

    fn layer(&self, inner_service: InnerServiceT) -> Self::Service {
        let coordinator = Arc::new(RefreshCoordinator::new(
            inner_service.clone(),
            self.store.clone(),
            self.refresh_path.clone(),
        ));
        AuthnService::new(inner_service, self.store.clone(), coordinator)
    }
}
