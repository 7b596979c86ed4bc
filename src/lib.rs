//! Fleet Console
//!
//! Device policy classification and command dispatch engine for a central
//! fleet management console.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        FLEET CONSOLE                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌──────────────┐   ┌────────────────────┐  │
//! │  │  policy    │   │  dispatch    │   │  view              │  │
//! │  │  (store,   │   │  (commands,  │   │  (device state,    │  │
//! │  │  classify) │   │  in-flight)  │   │  search filters)   │  │
//! │  └─────┬──────┘   └──────┬───────┘   └─────────┬──────────┘  │
//! │        └─────────────────┼─────────────────────┘             │
//! │                          ▼                                   │
//! │              ┌───────────────────────┐    ┌──────────────┐   │
//! │              │  api (Transport seam) │◄───│  sync tasks  │   │
//! │              └───────────┬───────────┘    └──────────────┘   │
//! └──────────────────────────┼───────────────────────────────────┘
//!                            ▼
//!                   dashboard backend ──► device agents
//! ```
//!
//! The backend only ever *queues* commands; agents apply them on their next
//! run. Nothing in this crate reports a command as completed.

pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod policy;
pub mod sync;
pub mod view;

pub use api::{ConsoleClient, HttpTransport, Transport};
pub use config::Config;
pub use dispatch::{Ack, Action, Command, CommandDispatcher, KillMode, Target};
pub use error::{ConsoleError, ConsoleResult, DispatchError, ErrorKind};
pub use policy::{classify, Classification, PolicySet, PolicyStore};
pub use view::DeviceView;
