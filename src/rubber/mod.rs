//! Spring-displacement ("rubber scroll") engine
//!
//! - `spring`: kick-driven critically damped spring and the rubber mapping
//! - `bus`: kick event channel between regions and listeners
//! - `nav`: per-section regions and threshold-driven section navigation

pub mod bus;
pub mod nav;
pub mod spring;

pub use bus::{KickBus, KickEvent, KickListener, SharedListener, Subscription};
pub use nav::{DEFAULT_SECTIONS, NavRequest, RubberRegion, SectionNavigator};
pub use spring::{RubberSpring, SpringPhase, rubber};
