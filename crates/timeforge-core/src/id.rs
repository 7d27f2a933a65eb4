//! Handle newtypes and the injected id generator.
//!
//! Decisions, relations, flaws, solutions and search nodes are addressed by
//! integer handles drawn from an [`IdGenerator`]. Components, values and
//! rules are indexed positionally inside the plan domain.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

macro_rules! handle {
    ($(#[$doc:meta])* $name:ident($inner:ty), $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub $inner);

        impl $name {
            /// Returns the raw handle value.
            #[inline]
            pub fn index(self) -> $inner {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

handle!(
    /// Handle of a decision in the plan database arena.
    DecisionId(u64),
    "d"
);
handle!(
    /// Handle of a relation in the plan database arena.
    RelationId(u64),
    "r"
);
handle!(
    /// Handle of a detected flaw.
    FlawId(u64),
    "f"
);
handle!(
    /// Handle of a flaw solution.
    SolutionId(u64),
    "s"
);
handle!(
    /// Handle of a search space node.
    NodeId(u64),
    "n"
);
handle!(
    /// Position of a component inside the plan domain.
    ComponentId(usize),
    "c"
);
handle!(
    /// Position of a value inside its component.
    ValueId(usize),
    "v"
);
handle!(
    /// Position of a synchronization rule inside the plan domain.
    RuleId(usize),
    "sync"
);

/// Thread-safe monotonic id generator.
///
/// Cloning shares the underlying counter, so every collaborator handed a
/// clone draws from the same sequence. Independent planners own
/// independent generators and never collide.
///
/// # Example
///
/// ```
/// use timeforge_core::IdGenerator;
///
/// let ids = IdGenerator::starting_at(10);
/// let shared = ids.clone();
/// assert_eq!(ids.next_id(), 10);
/// assert_eq!(shared.next_id(), 11);
/// ```
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next: Arc<AtomicU64>,
}

impl IdGenerator {
    /// Creates a generator starting at zero.
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Creates a generator whose first id is `first`.
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: Arc::new(AtomicU64::new(first)),
        }
    }

    /// Draws the next raw id.
    #[inline]
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    pub fn next_decision(&self) -> DecisionId {
        DecisionId(self.next_id())
    }

    pub fn next_relation(&self) -> RelationId {
        RelationId(self.next_id())
    }

    pub fn next_flaw(&self) -> FlawId {
        FlawId(self.next_id())
    }

    pub fn next_solution(&self) -> SolutionId {
        SolutionId(self.next_id())
    }

    pub fn next_node(&self) -> NodeId {
        NodeId(self.next_id())
    }

    /// Returns the id the next call will yield, without consuming it.
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
