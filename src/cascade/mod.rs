mod controller;
mod state;
#[cfg(test)]
mod tests;

pub use controller::CascadeController;
pub use state::{CascadePhase, CascadeSelection, Epoch, LevelState, LevelStatus, Placement, StepOutcome};
