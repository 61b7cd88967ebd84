// Command layer: the top-level run flow invoked from main.

// The bootstrap run: proxy setup, git pre-flight, per-repository pipeline,
// summary.
pub mod bootstrap;
