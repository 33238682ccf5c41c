pub mod accounts;
pub mod discovery;
pub mod refresh_coordinator;
pub mod token_issuer;
pub mod token_verifier;

pub use discovery::DiscoveryPublisher;
pub use refresh_coordinator::{RefreshCoordinator, TokenPair};
pub use token_issuer::TokenIssuer;
pub use token_verifier::TokenVerifier;
