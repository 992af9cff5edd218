//! Controller layer: UI events and command orchestration for the desktop shell.

pub mod events;
pub mod orchestration;
