//! Global allocator for the command-line binary.
//!
//! Streaming transforms allocate and free many short-lived chunk buffers;
//! mimalloc handles that pattern better than the system allocator.

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;
