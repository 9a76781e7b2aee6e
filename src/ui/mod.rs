//! Headless view state. Each controller is a plain value; requests are
//! issued as `Pending*` tickets and their results applied with `complete_*`.

pub mod epoch;
pub mod gallery;
pub mod generator;
pub mod page;
pub mod session;
pub mod viewer;

pub use epoch::{Sequencer, Ticket};
pub use gallery::{CardView, DeleteOutcome, Gallery, PendingDelete};
pub use generator::{GenerationOutcome, GeneratorPanel, PanelState, PendingGeneration, Visibility};
pub use page::{LoadOutcome, PageController, PendingLoad};
pub use session::Session;
pub use viewer::{DetailViewer, Download, Key};
