//! # Events Module
//!
//! Progress reporting for the import engine.
//!
//! The engine never prints. It emits [`Event`]s through an [`EventSender`];
//! the CLI turns them into a progress bar, tests collect them and assert.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Import(ImportEvent::Progress(p)) = event {
//!             println!("processed: {} / {}", p.processed, p.total);
//!         }
//!     }
//! });
//!
//! importer.run_with_events(&sender, &CancellationToken::new())?;
//! ```

mod channel;
mod types;

pub use channel::{EventChannel, EventReceiver, EventSender, null_sender};
pub use types::*;
