//! Virtualized list scrolling
//!
//! `ScrollSurface` is the live list; `VirtualizedScrollDriver` makes its full
//! membership visible and hands rendered rows to an `ItemSink`.

pub mod driver;
pub mod expected;
pub mod surface;

pub use driver::{ItemSink, ScrollOutcome, SinkFlow, Termination, VirtualizedScrollDriver};
pub use expected::parse_expected_total;
pub use surface::{
    ListSelectors, LoadMore, ScrollAction, ScrollMetrics, ScrollSurface, SurfaceError,
};
