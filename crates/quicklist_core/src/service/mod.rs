//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate snapshot persistence into the task-list use case.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod task_list;
