/// PPV flow driver: the fixed conversational script run against the seller
/// bot, expressed as an ordered list of step descriptors executed by a
/// generic abort-on-first-failure driver.

pub mod download;
pub mod driver;
pub mod error;
pub mod steps;

pub use driver::{Exchange, FlowOutcome, FlowTimeouts, run_flow};
pub use error::{FlowError, StepError};
pub use steps::{FlowStep, StepAction, sell_script};
