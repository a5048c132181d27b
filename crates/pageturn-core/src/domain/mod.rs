//! Domain entities for PageTurn.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers.  The innermost
//! layer is called the **domain** (or "entities" layer).  Domain code:
//!
//! - Contains the core business rules of the application.
//! - Has **no** imports from OS APIs, MIDI drivers, network libraries, or UI
//!   frameworks.
//! - Can be compiled and tested on any platform without any external setup.
//!
//! Here the rules are small but load-bearing: how a zero-based MIDI program
//! becomes a one-based page, and which MIDI input the server should listen to
//! when several are plugged in.

/// Device-name matching and the startup selection policy.
pub mod device;

/// One-based page numbers and the program-to-page offset.
pub mod page;
