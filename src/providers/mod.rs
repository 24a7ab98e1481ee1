//! Trait seams to the host application.
//!
//! Everything the engine cannot decide on its own (wall-clock time,
//! identifier generation, the issuer identity, registered scopes, resources
//! and clients, user claims, session termination) comes in through the
//! traits in this module. Each seam ships with an in-memory implementation
//! suitable for embedding and for tests.

pub mod claims;
pub mod clients;
pub mod clock;
pub mod identifiers;
pub mod issuer;
pub mod resources;
pub mod scopes;
pub mod sessions;

pub use claims::{SessionClaimsProvider, UserClaimsProvider};
pub use clients::{ClientInfoProvider, InMemoryClientRegistry};
pub use clock::{Clock, ManualClock, SystemClock};
pub use identifiers::{IdGenerator, UuidIdGenerator};
pub use issuer::{IssuerProvider, StaticIssuer};
pub use resources::{InMemoryResourceManager, ResourceDefinition, ResourceManager};
pub use scopes::{InMemoryScopeManager, ScopeDefinition, ScopeManager};
pub use sessions::{AuthSessionService, NoopSessionService};
