//! loom-daemon: the realtime scheduler that turns play-map patterns
//! into scheduled OSC traffic.
//!
//! A single tick/clock task owns the `Tempo` and the play map; any
//! number of other tasks (the control-port listener, an embedding CLI
//! or REPL) submit `Action`s through a queue that is drained at the
//! top of every tick (spec.md §5). `Stream` is the entry point for an
//! embedding program; the `loom-daemon` binary wires it to the OSC
//! control port and a set of configured playback targets.

pub mod control_listener;
pub mod dispatch;
pub mod error;
pub mod playmap;
pub mod stream;
pub mod target;

pub use dispatch::{Action, Dispatcher};
pub use error::DaemonError;
pub use playmap::PlayMap;
pub use stream::Stream;
pub use target::Target;
