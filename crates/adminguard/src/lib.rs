//! Single-dependency entry point for adminguard.
//!
//! `core` holds the transport-agnostic admission, audit and resource types;
//! `gateway` holds the axum service built on them. `prelude` collects the
//! names an embedding application usually needs to wire its own providers.

pub mod core {
    pub use adminguard_core::*;
}

pub mod gateway {
    pub use adminguard_gateway::*;
}

pub mod prelude {
    pub use adminguard_core::capability::{Capability, Permission};
    pub use adminguard_core::license::License;
    pub use adminguard_core::principal::Principal;
    pub use adminguard_core::{AdminGuardError, Result};
    pub use adminguard_gateway::app_state::{AppParts, AppState};
    pub use adminguard_gateway::providers::{
        CloudCustomerDirectory, FeatureFlagProvider, IpFilterStore, LicenseProvider,
        NotificationSender, OAuthConnectionStore, PermissionProvider, SessionResolver,
        UserDirectory,
    };
    pub use adminguard_gateway::router::build_router;
}
