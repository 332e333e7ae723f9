pub mod bounds;
pub mod point;
pub mod settings;

pub use bounds::{find_coordinate_boundaries, Bounds};
pub use point::{PointRecord, RawRecord, UtmZone};
pub use settings::{ProcessingSettings, ScriptSetting};
