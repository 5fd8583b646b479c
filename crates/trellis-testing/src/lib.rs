//! Testing utilities and harness for trellis

pub mod applier;
pub mod harness;
pub mod reporter;
pub mod widgets;

pub use applier::{Mutation, MutationLog, RecordingApplier, TestPrimitive};
pub use harness::TestTree;
pub use reporter::CollectingReporter;
pub use widgets::*;

pub mod prelude {
    pub use crate::applier::*;
    pub use crate::harness::*;
    pub use crate::reporter::*;
    pub use crate::widgets::*;
}
