pub mod bulk;
pub mod fingerprint;
pub mod generate;
pub mod group;
pub mod prune;
pub mod reconcile;
pub mod session;
pub mod signature;
pub mod validate;

pub use bulk::*;
pub use fingerprint::*;
pub use generate::*;
pub use group::*;
pub use prune::*;
pub use reconcile::*;
pub use session::*;
pub use signature::*;
pub use validate::*;
