pub mod controller;
pub mod page;
pub mod state;

pub use controller::{TriggerViewController, ViewAction, ViewError};
pub use page::{render, PageView, Tab, TriggerPage};
pub use state::{Phase, Snapshot, ViewState, NETWORK_ERROR_MESSAGE};
