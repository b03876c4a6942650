pub mod codec;
pub mod conflict;
pub mod grid;
pub mod planner;
pub mod render;
pub mod schedule;
pub mod time_parser;

pub use crate::domain::model::{Conflict, PlacedClass, SectionRecord, TimeInterval, Weekday};
pub use crate::domain::ports::{ConfigProvider, ScheduleObserver, SectionCatalog, Storage};
pub use crate::utils::error::Result;
