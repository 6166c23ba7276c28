#![allow(dead_code)]

mod generate;
mod sources;

pub use generate::{rms, sine};
pub use sources::{CountingSource, ScriptedSource};
