//! # ARMORY
//!
//! Game-side integration of the ARMORY shop engine.
//!
//! ## Modules
//!
//! - `economy`: in-memory virtual balance backend
//! - `events`: shop event bus, pre-commit hook and presentation adapters
//!
//! The engine itself lives in `armory_shop` and is re-exported as [`shop`].

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod economy;
pub mod events;

pub use armory_shop as shop;

pub use economy::InMemoryEconomy;
pub use events::{EventBus, EventHook, EventPresenter, EventReceiver, EventSender, ShopEvent};
