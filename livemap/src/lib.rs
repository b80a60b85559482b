#![warn(
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    missing_debug_implementations,
    unreachable_pub
)]

//! Unofficial client for the Waze live map georss feed.

pub mod georss;
