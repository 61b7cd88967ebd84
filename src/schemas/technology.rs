use std::fmt;

/// Supported technology stacks a repository can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Technology {
    JavaSpringBoot,
    JavaMaven,
    JavaGradle,
    Python,
    NodeJs,
    Unknown,
}

impl Technology {
    /// Human-readable label used in logs and the run summary.
    pub fn label(&self) -> &'static str {
        match self {
            Technology::JavaSpringBoot => "Java (Spring Boot)",
            Technology::JavaMaven => "Java (Maven)",
            Technology::JavaGradle => "Java (Gradle)",
            Technology::Python => "Python",
            Technology::NodeJs => "Node.js",
            Technology::Unknown => "unknown",
        }
    }

    /// All three Java flavors share one toolchain (JDK + build tool), and
    /// therefore one installer.
    pub fn is_java(&self) -> bool {
        matches!(
            self,
            Technology::JavaSpringBoot | Technology::JavaMaven | Technology::JavaGradle
        )
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Build tool driving a Java project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildTool {
    Maven,
    Gradle,
    Unknown,
}

impl fmt::Display for BuildTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuildTool::Maven => "Maven",
            BuildTool::Gradle => "Gradle",
            BuildTool::Unknown => "unknown",
        })
    }
}

/// Immutable result of technology detection.
///
/// Invariant: an `Unknown` kind never carries a build tool; the constructor
/// enforces this regardless of what the caller passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TechnologyProfile {
    kind: Technology,
    build_tool: Option<BuildTool>,
}

impl TechnologyProfile {
    pub fn new(kind: Technology) -> Self {
        TechnologyProfile {
            kind,
            build_tool: None,
        }
    }

    pub fn with_build_tool(kind: Technology, build_tool: BuildTool) -> Self {
        let build_tool = if kind == Technology::Unknown {
            None
        } else {
            Some(build_tool)
        };
        TechnologyProfile { kind, build_tool }
    }

    pub fn kind(&self) -> Technology {
        self.kind
    }

    pub fn build_tool(&self) -> Option<BuildTool> {
        self.build_tool
    }
}

impl fmt::Display for TechnologyProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.build_tool {
            Some(tool) => write!(f, "{} [{}]", self.kind, tool),
            None => write!(f, "{}", self.kind),
        }
    }
}
