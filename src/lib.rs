//! MBMP - a GStreamer playbin front end
//!
//! The library holds the playback coordinator: a controller that steers a
//! playbin pipeline, a bus poller that turns pipeline messages into
//! notifications, and the stream analysis feeding the stream-info view.

pub mod engine;
pub mod player;
pub mod utils;
