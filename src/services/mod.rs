//! Backend capability clients.
//!
//! # Data Flow
//! ```text
//! route handler
//!     → facade (AuthService, ClubService, ...)
//!     → capability trait (AuthStudent, ClubLeader, ...)
//!     → ServiceClient::invoke("<Capability>.<Method>", request)
//! ```
//!
//! # Design Decisions
//! - One facade per logical service, holding one trait object per capability
//! - Every capability is its own trait so tests can substitute any one of them
//! - The facade is built once at startup and shared read-only

use std::sync::Arc;

use crate::rpc::ServiceClient;

/// Declares a capability trait plus its RPC-backed implementation.
///
/// Each method maps to the endpoint `<prefix>.<Name>` on the backend.
macro_rules! capability {
    (
        $(#[$meta:meta])*
        pub trait $name:ident, client $client:ident, prefix $prefix:literal {
            $( fn $method:ident => $endpoint:literal; )+
        }
    ) => {
        $(#[$meta])*
        #[async_trait::async_trait]
        pub trait $name: Send + Sync {
            $(
                async fn $method(
                    &self,
                    request: $crate::rpc::RpcRequest,
                ) -> $crate::error::GatewayResult<serde_json::Value>;
            )+
        }

        #[doc = concat!("[`", stringify!($name), "`] over a load-balanced service client.")]
        #[derive(Debug, Clone)]
        pub struct $client {
            inner: std::sync::Arc<$crate::rpc::ServiceClient>,
        }

        impl $client {
            pub fn new(inner: std::sync::Arc<$crate::rpc::ServiceClient>) -> Self {
                Self { inner }
            }
        }

        #[async_trait::async_trait]
        impl $name for $client {
            $(
                async fn $method(
                    &self,
                    request: $crate::rpc::RpcRequest,
                ) -> $crate::error::GatewayResult<serde_json::Value> {
                    self.inner.invoke(concat!($prefix, ".", $endpoint), request).await
                }
            )+
        }
    };
}

pub mod announcement;
pub mod auth;
pub mod club;
pub mod open_api;
pub mod outing;
pub mod schedule;

pub use announcement::AnnouncementService;
pub use auth::AuthService;
pub use club::ClubService;
pub use open_api::{LocalSearch, NaverLocalSearch};
pub use outing::OutingService;
pub use schedule::ScheduleService;

/// Every backend the route table can reach.
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub club: ClubService,
    pub outing: OutingService,
    pub schedule: ScheduleService,
    pub announcement: AnnouncementService,
    pub open_api: Arc<dyn LocalSearch>,
}

impl Services {
    /// Build every facade from its service client.
    pub fn connect(clients: ServiceClients, open_api: Arc<dyn LocalSearch>) -> Self {
        Self {
            auth: AuthService::connect(clients.auth),
            club: ClubService::connect(clients.club),
            outing: OutingService::connect(clients.outing),
            schedule: ScheduleService::connect(clients.schedule),
            announcement: AnnouncementService::connect(clients.announcement),
            open_api,
        }
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}

/// One load-balanced client per logical service.
#[derive(Debug, Clone)]
pub struct ServiceClients {
    pub auth: Arc<ServiceClient>,
    pub club: Arc<ServiceClient>,
    pub outing: Arc<ServiceClient>,
    pub schedule: Arc<ServiceClient>,
    pub announcement: Arc<ServiceClient>,
}
