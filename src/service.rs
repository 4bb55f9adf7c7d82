use super::{credentials::*, error::*, refresh::*, request::*};

use {
    http::StatusCode,
    std::{mem, pin::*, sync::*, task::*},
    tower::*,
};

//
// AuthnService
//

/// Authenticated request pipeline service.
///
/// You will often be using [AuthnLayer](super::AuthnLayer) rather than this
/// service directly, thus this service's functionality is documented there.
pub struct AuthnService<InnerServiceT, StoreT> {
    inner_service: InnerServiceT,
    store: StoreT,
    coordinator: Arc<RefreshCoordinator<InnerServiceT, StoreT>>,
}

impl<InnerServiceT, StoreT> AuthnService<InnerServiceT, StoreT>
where
    InnerServiceT: Service<ApiRequest, Response = ApiResponse, Error = TransportError>,
    StoreT: CredentialStore,
{
    /// Constructor.
    pub fn new(
        inner_service: InnerServiceT,
        store: StoreT,
        coordinator: Arc<RefreshCoordinator<InnerServiceT, StoreT>>,
    ) -> Self {
        Self {
            inner_service,
            store,
            coordinator,
        }
    }

    // Clone while keeping `inner_service`.
    //
    // See: https://docs.rs/tower/latest/tower/trait.Service.html#be-careful-when-cloning-inner-services
    fn clone_and_keep_inner_service(&mut self) -> Self
    where
        InnerServiceT: Clone,
    {
        let mut clone = self.clone();
        clone.inner_service = mem::replace(&mut self.inner_service, clone.inner_service);
        clone
    }

    // Handle request.
    async fn handle(mut self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        // The epoch must be captured before the attempt, otherwise a refresh
        // that settles mid-flight would be indistinguishable from no refresh
        let observed_epoch = self.coordinator.epoch();
        let credentials = self.store.get();

        let mut attempt = request.clone();
        if let Some(credentials) = &credentials {
            attempt = attempt.with_bearer(&credentials.access_token);
        }

        let response = self.inner_service.ready().await?.call(attempt).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        if credentials.is_none() {
            // Nothing to refresh with
            return Err(ClientError::Unauthenticated);
        }

        tracing::debug!("unauthorized: {}", request);
        self.coordinator.ensure_fresh(observed_epoch).await?;

        let credentials = self.store.get().ok_or(ClientError::Unauthenticated)?;
        let retry = request.with_bearer(&credentials.access_token);

        tracing::debug!("retrying: {}", retry);
        let response = self.inner_service.ready().await?.call(retry).await?;

        // A second rejection with fresh credentials is terminal
        if response.status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthenticated);
        }

        Ok(response)
    }
}

impl<InnerServiceT, StoreT> Clone for AuthnService<InnerServiceT, StoreT>
where
    InnerServiceT: Clone,
    StoreT: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner_service: self.inner_service.clone(),
            store: self.store.clone(),
            coordinator: self.coordinator.clone(),
        }
    }
}

impl<InnerServiceT, StoreT> Service<ApiRequest> for AuthnService<InnerServiceT, StoreT>
where
    InnerServiceT: 'static + Service<ApiRequest, Response = ApiResponse, Error = TransportError> + Clone + Send,
    InnerServiceT::Future: Send,
    StoreT: CredentialStore,
{
    type Response = ApiResponse;
    type Error = ClientError;
    type Future = Pin<Box<dyn Future<Output = Result<ApiResponse, ClientError>> + Send>>;

    fn poll_ready(&mut self, context: &mut Context) -> Poll<Result<(), Self::Error>> {
        self.inner_service
            .poll_ready(context)
            .map_err(|error| error.into())
    }

    fn call(&mut self, request: ApiRequest) -> Self::Future {
        // We unfortunately must clone the `&mut self` because it cannot be sent to
        // the future as is; this is standard practice in Tower due to its design

        let cloned_self = self.clone_and_keep_inner_service();
        Box::pin(cloned_self.handle(request))
    }
}
