#![forbid(unsafe_code)]

mod rendering;
mod scenario;

pub use rendering::{init_tracing, render_shapes_to_png, render_system_to_png, RenderConfig};
pub use scenario::{load_scenario, Scenario};
