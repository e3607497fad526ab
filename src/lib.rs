//! Kiosk Control - playlist controller for a remote kiosk display
//!
//! Walks a playlist of web pages and tells a remote browser process which one
//! to show, over a line-oriented TCP protocol.
//!
//! This library provides:
//! - Playlist scheduling with timed pages and loops
//! - Remote display client
//! - Dashboard enrolment and playlist fetching
//! - HTTP control surface (play, stop, reload, status)

pub mod api;
pub mod app;
pub mod config;
pub mod control;
pub mod device;
pub mod display;
pub mod playlist;
pub mod source;
