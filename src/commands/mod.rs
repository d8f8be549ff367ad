//! Command implementations
//!
//! Each module backs one or more CLI subcommands.

pub mod evaluate;
pub mod graph;
pub mod monitor;
pub mod pipeline;
pub mod query;
pub mod setup;

pub use evaluate::{evaluate as evaluate_run, regression_test as regression_test_run};
pub use monitor::run as monitor_run;
pub use setup::{build_generator, build_retriever, open_graph};
