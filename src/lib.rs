pub mod charts;
pub mod content;
pub mod logging;
pub mod migrate;
pub mod snapshot;
