//! Domain types for CloudLab

pub mod bar;
pub mod position;
pub mod series;
pub mod signal;
pub mod timeframe;
pub mod trade;

pub use bar::{Bar, BarError};
pub use position::Position;
pub use series::PriceSeries;
pub use signal::{PatternId, Side, Signal};
pub use timeframe::{Timeframe, TimeframeError};
pub use trade::{ExitReason, Trade};
