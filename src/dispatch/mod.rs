//! Command Dispatch Module
//!
//! Operational commands (power, lock, patch, USB, software/service/process
//! lifecycle) sent to the backend for eventual execution by the device
//! agent. Acknowledgement is not completion.

pub mod command;
pub mod dispatcher;
pub mod guard;


pub use command::{
    Ack, Action, Command, CommandPayload, CommandState, KillMode, Target, USB_DURATIONS_MINUTES,
};
pub use dispatcher::CommandDispatcher;
pub use guard::{InFlightRegistry, InFlightToken};
