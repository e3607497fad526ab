//! Mock servers for integration testing
//!
//! These mock servers simulate the kiosk's collaborators (the remote display
//! browser and the dashboard web service) so playback and enrolment can be
//! tested end to end without real hardware.
#![allow(dead_code, unused_imports)]

pub mod dashboard;
pub mod display;

pub use dashboard::MockDashboard;
pub use display::MockDisplay;
