//! Role-based gating for routes behind the session middleware.

use axum::{
    Router,
    extract::{Request, State},
    middleware::{Next, from_fn_with_state},
    response::Response,
};

use crate::{
    config::DenialStatus,
    error::{AppError, Result},
    middleware_layer::session::Identity,
    models::role::{Role, RoleSet},
};

/// Admits requests whose [`Identity`] holds one of a fixed set of roles.
///
/// The gate never touches the stores; it only reads the identity that
/// [`require_session`](crate::middleware_layer::session::require_session)
/// attached. Mount it inside that middleware.
#[derive(Debug, Clone, Copy)]
pub struct RoleGate {
    allowed: RoleSet,
    denial: DenialStatus,
}

impl RoleGate {
    /// A gate admitting exactly `roles`. No roles admits nobody.
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed: roles.into_iter().collect(),
            denial: DenialStatus::default(),
        }
    }

    /// Sets the status used to report a denial.
    pub fn with_denial(mut self, denial: DenialStatus) -> Self {
        self.denial = denial;
        self
    }

    pub fn allowed(&self) -> RoleSet {
        self.allowed
    }

    /// Decides one request.
    pub fn check(&self, identity: &Identity) -> Result<()> {
        if self.allowed.contains(identity.role) {
            return Ok(());
        }

        tracing::warn!(
            "🚫 User {} with role {} denied; route requires {}",
            identity.user_id,
            identity.role,
            self.allowed
        );

        match self.denial {
            DenialStatus::Forbidden => Err(AppError::Forbidden),
            DenialStatus::NotFound => Err(AppError::NotFound("No access".to_string())),
        }
    }

    /// Wraps every route already on `router` with this gate.
    ///
    /// Layer the session middleware onto the result afterwards so it runs
    /// first.
    pub fn guard<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.route_layer(from_fn_with_state(self, enforce))
    }
}

async fn enforce(State(gate): State<RoleGate>, request: Request, next: Next) -> Result<Response> {
    let identity = Identity::from_extensions(request.extensions()).ok_or_else(|| {
        tracing::error!("❌ Role gate reached without a resolved identity");
        AppError::Internal("role gate mounted without session middleware".to_string())
    })?;

    gate.check(&identity)?;

    Ok(next.run(request).await)
}
