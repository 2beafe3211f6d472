pub mod defects;
pub mod etd;
pub mod ics;
pub mod nonlinear;
pub mod simulation_object;
pub mod spectral;
pub mod utils;

pub use defects::VortexNode;
pub use simulation_object::{SimulationObject, SimulationParameters};
pub use utils::error::RuntimeError;
