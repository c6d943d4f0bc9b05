//! Domain entities for the xpoint bridge.
//!
//! This module contains pure business logic with no infrastructure
//! dependencies: no sockets, no tasks, no timers.
//!
//! - [`input`] – what an input is and how panel buttons address it.
//! - [`labels`] – the last-known name of every hub input.
//! - [`routing`] – which input currently feeds the monitored output.

pub mod input;
pub mod labels;
pub mod routing;
