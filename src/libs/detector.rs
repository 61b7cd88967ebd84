// Technology detection: a pure function over the repository's root file
// listing plus, for the Spring Boot check, file contents.
//
// Decision order is most-specific-first: Spring Boot before plain Maven or
// Gradle, Java before Python before Node.js. Anything the pipeline cannot
// read (permissions, I/O errors) degrades to "no files found" so detection
// returns Unknown instead of failing the job outright.

use std::fs;
use std::path::Path;

use colored::Colorize;

use crate::schemas::technology::{BuildTool, Technology, TechnologyProfile};
use crate::{log_debug, log_info, log_warn};

/// Marker files whose content decides the Spring Boot question.
const SPRING_CANDIDATE_FILES: &[&str] = &["pom.xml", "build.gradle", "build.gradle.kts", "gradlew"];
/// Case-insensitive content indicators for Spring projects.
const SPRING_INDICATORS: &[&str] = &["spring-boot", "springframework", "org.springframework"];

const GRADLE_MARKER_FILES: &[&str] = &[
    "build.gradle",
    "build.gradle.kts",
    "gradlew",
    "gradlew.bat",
    "settings.gradle",
    "settings.gradle.kts",
];

const PYTHON_MARKER_FILES: &[&str] = &[
    "requirements.txt",
    "setup.py",
    "pyproject.toml",
    "Pipfile",
    "setup.cfg",
];

const NODE_MARKER_FILES: &[&str] = &[
    "package.json",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
];

/// Classifies a checked-out repository into a technology profile.
pub fn detect(repo_path: &Path) -> TechnologyProfile {
    if !repo_path.exists() {
        log_warn!(
            "[Detect] Repository path does not exist: {}",
            repo_path.display()
        );
        return TechnologyProfile::new(Technology::Unknown);
    }

    let files = root_files(repo_path);
    log_debug!("[Detect] Files in repository root: {:?}", files);

    let kind = if is_spring_boot_project(repo_path, &files) {
        Technology::JavaSpringBoot
    } else if files.iter().any(|f| f == "pom.xml") {
        Technology::JavaMaven
    } else if contains_any(&files, GRADLE_MARKER_FILES) {
        Technology::JavaGradle
    } else if contains_any(&files, PYTHON_MARKER_FILES) {
        Technology::Python
    } else if contains_any(&files, NODE_MARKER_FILES) {
        Technology::NodeJs
    } else {
        log_warn!(
            "[Detect] No recognizable project files in {}",
            repo_path.display()
        );
        return TechnologyProfile::new(Technology::Unknown);
    };

    let profile = if kind.is_java() {
        TechnologyProfile::with_build_tool(kind, detect_build_tool(repo_path))
    } else {
        TechnologyProfile::new(kind)
    };
    log_info!("[Detect] Detected: {}", profile.to_string().bright_blue());
    profile
}

/// Determines the build tool of a Java repository. Gradle wins when both
/// marker sets are present, mirroring how mixed repositories are actually
/// built.
pub fn detect_build_tool(repo_path: &Path) -> BuildTool {
    let files = root_files(repo_path);

    if contains_any(&files, GRADLE_MARKER_FILES) {
        log_debug!("[Detect] Build tool: Gradle");
        return BuildTool::Gradle;
    }
    if files.iter().any(|f| f == "pom.xml") {
        log_debug!("[Detect] Build tool: Maven");
        return BuildTool::Maven;
    }
    BuildTool::Unknown
}

/// Names of regular files in the repository root. Read errors degrade to an
/// empty listing.
fn root_files(repo_path: &Path) -> Vec<String> {
    match fs::read_dir(repo_path) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect(),
        Err(err) => {
            log_warn!(
                "[Detect] Could not read {}: {}",
                repo_path.display(),
                err
            );
            Vec::new()
        }
    }
}

fn contains_any(files: &[String], markers: &[&str]) -> bool {
    files.iter().any(|f| markers.contains(&f.as_str()))
}

fn is_spring_boot_project(repo_path: &Path, files: &[String]) -> bool {
    SPRING_CANDIDATE_FILES
        .iter()
        .filter(|candidate| files.iter().any(|f| f == *candidate))
        .any(|candidate| file_contains_indicator(&repo_path.join(candidate), SPRING_INDICATORS))
}

/// Case-insensitive substring search over a marker file. Unreadable files
/// count as "no indicator".
fn file_contains_indicator(path: &Path, indicators: &[&str]) -> bool {
    match fs::read_to_string(path) {
        Ok(content) => {
            let lowered = content.to_lowercase();
            indicators.iter().any(|needle| lowered.contains(needle))
        }
        Err(err) => {
            log_debug!("[Detect] Could not read {}: {}", path.display(), err);
            false
        }
    }
}
