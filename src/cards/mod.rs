//! Cards and the set-legality oracle.
//!
//! Cards are plain ids (`CardId`); everything the engine knows about their
//! faces comes from a `SetOracle`.

pub mod oracle;

pub use oracle::{FeatureOracle, Features, SetOracle};
