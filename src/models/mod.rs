pub mod block;
pub mod document;
pub mod loaders;
pub mod ordering;
pub mod suite;

pub use block::{
    Action, ActionBlock, BlockId, BlockKind, ContentType, DbCredentials, ElementTarget,
    LocatorStrategy, NavDirection, Position, Predicate, RetrieveSpec,
};
pub use document::ScriptDocument;
pub use loaders::{load_script_file, load_suite_file};
pub use ordering::{ExecutionPlan, PlannedStep, SnapRule, SnapTieBreak};
pub use suite::Suite;
