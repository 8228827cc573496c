//! Assistant core
//!
//! Mode state, command interpretation, the simulated alert and the controller
//! that runs the scan loop.

mod alert;
mod command;
mod controller;
mod display;
mod mode;

pub use alert::{ALERT_SENDER, AlertLog, AlertTrigger, PLACEHOLDER_LOCATION, simulate_alert};
pub use command::{Command, interpret};
pub use controller::{Action, Collaborators, Controller, ControllerHandle};
pub use display::{DisplayState, Severity, Status};
pub use mode::{Mode, ModeState};
