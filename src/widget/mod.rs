pub mod lifecycle;
pub mod poller;
pub mod surface;
pub mod synchronizer;

pub use lifecycle::{Widget, WidgetBuilder};
pub use surface::{ModeSync, SurfaceSnapshot};
pub use synchronizer::StateSynchronizer;
