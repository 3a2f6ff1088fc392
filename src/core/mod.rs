/*!
 * Core Module
 * Synchronization primitives and their tuning constants
 */

pub mod limits;
pub mod sync;
