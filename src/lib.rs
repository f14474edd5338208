//! Voice-command desktop control: mouse grids, clipboard slots, and
//! helper-process messaging
//!
//! The library side carries everything testable — phrase parsing, grid
//! geometry, session lifecycle, dispatch — behind trait seams for the two
//! OS surfaces (overlay windows, pointer synthesis). The binary in
//! `main.rs` wires the real backends and feeds phrases from stdin.

pub mod clipboard;
pub mod config;
pub mod dispatch;
pub mod element;
pub mod grid;
pub mod overlay;
pub mod phrase;
pub mod pointer;
pub mod wait;
