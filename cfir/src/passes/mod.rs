//! Graph-simplification passes (component F). Each pass is a standalone function over
//! `&mut Function`; none of them require or establish SSA form except where noted, mirroring the
//! teacher's own simplify passes that each operate on one local shape independently rather than
//! through a single monolithic optimizer object.

mod combine_blocks;
mod propagate_through_copies;
mod remove_unreachable;
mod remove_useless_copies;

pub use combine_blocks::combine_blocks;
pub use propagate_through_copies::propagate_through_copies;
pub use remove_unreachable::remove_unreachable;
pub use remove_useless_copies::remove_useless_copies;
