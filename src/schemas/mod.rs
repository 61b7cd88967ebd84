// Data model for the bootstrap pipeline.

// One repository job: URL, derived local path, state machine position.
pub mod job;
// Download request consumed by the download/verify/extract pipeline.
pub mod download;
// Technology classification results.
pub mod technology;
