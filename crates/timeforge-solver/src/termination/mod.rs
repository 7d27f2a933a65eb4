//! Termination conditions for the search.
//!
//! Terminations are checked between fringe pops; a terminated search
//! retracts back to the root and reports no solution.

mod composite;
mod external;
mod node_count;
mod time;

use std::fmt::Debug;

use crate::scope::SearchScope;

pub use composite::OrTermination;
pub use external::ExternalTermination;
pub use node_count::NodeCountTermination;
pub use time::TimeTermination;

/// A limit on the search, checked before each fringe pop.
pub trait Termination: Send + Debug {
    /// True once the search must give up.
    fn is_terminated(&self, scope: &SearchScope) -> bool;
}

impl<T: Termination + ?Sized> Termination for Box<T> {
    fn is_terminated(&self, scope: &SearchScope) -> bool {
        (**self).is_terminated(scope)
    }
}
