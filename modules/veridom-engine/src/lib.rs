pub mod checks;
pub mod explorer;
pub mod interact;
pub mod report;
pub mod scripts;
pub mod shim;
pub mod surface;

pub use explorer::{explore, ExploreOptions};
pub use report::{EngineReports, Screenshot, UNAVAILABLE};
pub use surface::{RenderSurface, SurfaceProvider, WebDriverSurface, WebDriverSurfaceProvider};
