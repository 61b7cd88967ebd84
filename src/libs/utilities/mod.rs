// Shared low-level primitives.

// Archive type detection and extraction.
pub mod compression;
// Tilde expansion and executable discovery.
pub mod path_helpers;
