pub mod countdown_event;

pub use countdown_event::{CountdownEvent, SignalOnDrop};
