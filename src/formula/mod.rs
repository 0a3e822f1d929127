#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The closed-form 2-SAT evaluator, kept deliberately separate from the
//! enumeration engine so each can check the other.

pub mod closed_form;
