//! Domain models for Credgate.

mod attempt;
mod payment;
mod plan;
mod webhook_log;

pub use attempt::*;
pub use payment::*;
pub use plan::*;
pub use webhook_log::*;
