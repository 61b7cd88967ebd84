// Installer for Java projects: JDK plus Maven or Gradle.
//
// The JDK version is read from the project's own build files and mapped onto
// a downloadable release, falling back to the default when the project asks
// for something the mirror tables do not carry. Maven is installed on demand
// for pom.xml projects; Gradle projects are expected to ship their wrapper.

use std::fs;
use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::constants::{
    BUILD_TIMEOUT, DEFAULT_JAVA_VERSION, MAVEN_VERSION, PROBE_TIMEOUT, jdk_download_url,
    maven_mirror_urls,
};
use crate::errors::{BootstrapError, Result};
use crate::installers::toolchain::{ToolchainRequest, ensure_toolchain};
use crate::installers::{Installer, InstallerContext};
use crate::libs::env_manager::{EnvironmentManager, PersistentEnvironmentSink, ShellRcSink};
use crate::libs::proxy::proxy_host_and_port;
use crate::libs::utilities::path_helpers::{find_executable, which};
use crate::{log_debug, log_info, log_success, log_warn};

const DEFAULT_MAVEN_SETTINGS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<settings xmlns="http://maven.apache.org/SETTINGS/1.0.0"
          xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
          xsi:schemaLocation="http://maven.apache.org/SETTINGS/1.0.0
          http://maven.apache.org/xsd/settings-1.0.0.xsd">
  <localRepository>${user.home}/.m2/repository</localRepository>
</settings>
"#;

const SPRING_APPLICATION_PROPERTIES: &str = "# Application configuration\nserver.port=8080\n";

pub struct JavaInstaller {
    ctx: InstallerContext,
    project: PathBuf,
    env: EnvironmentManager,
    sink: Box<dyn PersistentEnvironmentSink>,
}

impl JavaInstaller {
    pub fn new(ctx: &InstallerContext, project: &Path) -> Self {
        JavaInstaller {
            ctx: ctx.clone(),
            project: project.to_path_buf(),
            env: EnvironmentManager::new(project),
            sink: Box::new(ShellRcSink::from_environment()),
        }
    }

    fn has_pom(&self) -> bool {
        self.project.join("pom.xml").exists()
    }

    fn has_gradle_build(&self) -> bool {
        self.project.join("build.gradle").exists()
            || self.project.join("build.gradle.kts").exists()
    }

    fn install_maven(&self) -> Result<()> {
        let request = ToolchainRequest {
            tool_name: "maven".to_string(),
            version: MAVEN_VERSION.to_string(),
            urls: maven_mirror_urls().iter().map(|u| u.to_string()).collect(),
            expected_checksum: None,
            install_dir_name: "maven".to_string(),
            home_var: "MAVEN_HOME".to_string(),
            bin_subdir: Some("bin".to_string()),
        };
        ensure_toolchain(&self.ctx, &request, Some(&self.env), self.sink.as_ref())?;
        Ok(())
    }

    fn is_maven_installed(&self) -> bool {
        self.ctx
            .runner
            .run(&["mvn", "-version"], None, PROBE_TIMEOUT, &[])
            .0
            || self.find_maven_executable().is_some()
    }

    /// Locates the Maven launcher: the installation directory first (most
    /// reliable right after an install), then PATH.
    fn find_maven_executable(&self) -> Option<PathBuf> {
        let maven_home = self.ctx.tools_dir.join("maven");
        find_executable(&maven_home, "mvn").or_else(|| which("mvn"))
    }

    /// Creates `~/.m2`, the local repository directory, and a default
    /// `settings.xml` when none exists.
    fn ensure_maven_directories(&self) -> Result<()> {
        let m2 = maven_user_home();
        fs::create_dir_all(m2.join("repository"))?;

        let settings = m2.join("settings.xml");
        if !settings.exists() {
            fs::write(&settings, DEFAULT_MAVEN_SETTINGS)?;
            log_success!("Created Maven settings.xml: {}", settings.display());
        }
        Ok(())
    }

    /// Rewrites `settings.xml` with a proxies block pointing at the
    /// configured proxy.
    fn configure_maven_proxy(&self, proxy_url: &str) -> Result<()> {
        let m2 = maven_user_home();
        fs::create_dir_all(&m2)?;
        let (host, port) = proxy_host_and_port(proxy_url);
        fs::write(m2.join("settings.xml"), maven_proxy_settings(&host, &port))?;
        log_success!("Maven proxy configured in settings.xml");
        Ok(())
    }

    /// `mvn clean install -DskipTests` in the project. Failure is reported
    /// to the caller, which treats it as a warning.
    fn run_maven_install(&self) -> bool {
        let Some(mvn) = self.find_maven_executable() else {
            log_warn!("[Java] mvn not found in the install directory or on PATH");
            return false;
        };
        let mvn = mvn.to_string_lossy().to_string();
        log_info!("[Java] Running: {} clean install -DskipTests", "mvn".bold());

        let (ok, output) = self.ctx.runner.run(
            &[&mvn, "clean", "install", "-DskipTests"],
            Some(&self.project),
            BUILD_TIMEOUT,
            &self.ctx.proxy.subprocess_env(),
        );
        if ok {
            log_success!("Maven dependencies installed");
        } else {
            log_warn!("[Java] Maven install failed: {}", truncate(&output, 500));
        }
        ok
    }

    /// `gradlew build -x test` (or plain `gradle` when no wrapper is
    /// committed). Failure is a warning, same as Maven.
    fn run_gradle_build(&self) -> bool {
        let wrapper = self.project.join("gradlew");
        let gradle_cmd = if wrapper.exists() {
            wrapper.to_string_lossy().to_string()
        } else {
            "gradle".to_string()
        };
        log_info!("[Java] Running: {} build -x test", gradle_cmd.bold());

        let (ok, output) = self.ctx.runner.run(
            &[&gradle_cmd, "build", "-x", "test"],
            Some(&self.project),
            BUILD_TIMEOUT,
            &self.ctx.proxy.subprocess_env(),
        );
        if ok {
            log_success!("Gradle dependencies installed");
        } else {
            log_warn!("[Java] Gradle build failed: {}", truncate(&output, 500));
        }
        ok
    }

    /// Lists the jars a successful build left behind so the user knows the
    /// project is runnable.
    fn report_build_artifacts(&self) {
        for libs_dir in [self.project.join("target"), self.project.join("build/libs")] {
            let Ok(entries) = fs::read_dir(&libs_dir) else {
                continue;
            };
            let jars: Vec<PathBuf> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "jar"))
                .collect();
            if jars.is_empty() {
                continue;
            }
            log_success!("Build artifacts in {}:", libs_dir.display());
            for jar in &jars {
                if let Some(name) = jar.file_name() {
                    log_info!("  - {}", name.to_string_lossy().green());
                }
            }
        }
    }
}

impl Installer for JavaInstaller {
    fn tool_label(&self) -> &'static str {
        "java"
    }

    /// Java version the project pins, from `pom.xml` properties
    /// (`java.version`, `maven.compiler.source`) or `build.gradle`
    /// (`sourceCompatibility`).
    fn detect_version(&self) -> Option<String> {
        if let Ok(pom) = fs::read_to_string(self.project.join("pom.xml")) {
            if let Some(version) = pom_property(&pom, "java.version")
                .or_else(|| pom_property(&pom, "maven.compiler.source"))
            {
                return Some(version);
            }
        }
        if let Ok(gradle) = fs::read_to_string(self.project.join("build.gradle")) {
            if let Some(version) = gradle_source_compatibility(&gradle) {
                return Some(version);
            }
        }
        None
    }

    fn is_installed(&self) -> bool {
        self.ctx
            .runner
            .run(&["java", "-version"], None, PROBE_TIMEOUT, &[])
            .0
    }

    fn install(&self) -> Result<()> {
        let requested = self
            .detect_version()
            .unwrap_or_else(|| DEFAULT_JAVA_VERSION.to_string());
        // Projects pin all sorts of versions; install the default when the
        // exact one is not mirrored.
        let version = if jdk_download_url(&requested).is_some() {
            requested
        } else {
            if requested != DEFAULT_JAVA_VERSION {
                log_warn!(
                    "[Java] No download for JDK {}, installing {} instead",
                    requested.yellow(),
                    DEFAULT_JAVA_VERSION
                );
            }
            DEFAULT_JAVA_VERSION.to_string()
        };
        let url = jdk_download_url(&version).ok_or_else(|| BootstrapError::Configuration {
            component: "java".to_string(),
            reason: format!("no download URL for JDK {}", version),
        })?;

        let request = ToolchainRequest {
            tool_name: "jdk".to_string(),
            version: version.clone(),
            urls: vec![url.to_string()],
            expected_checksum: None,
            install_dir_name: format!("jdk-{}", version),
            home_var: "JAVA_HOME".to_string(),
            bin_subdir: Some("bin".to_string()),
        };
        let jdk = ensure_toolchain(&self.ctx, &request, Some(&self.env), self.sink.as_ref())?;
        log_debug!(
            "[Java] JDK {} active at {}",
            jdk.version,
            jdk.home().display()
        );

        if self.has_pom() {
            self.install_maven()?;
        }
        Ok(())
    }

    fn configure(&self) -> Result<()> {
        log_info!("[Java] Configuring project at {}", self.project.display());

        let mut maven_available = false;
        if self.has_pom() {
            if self.is_maven_installed() {
                maven_available = true;
            } else {
                log_info!("[Java] Maven not found, installing...");
                match self.install_maven() {
                    Ok(()) => maven_available = true,
                    Err(err) => {
                        log_warn!("[Java] Maven install failed, skipping dependency prefetch");
                        log_warn!("[Java] {}", err);
                    }
                }
            }

            if maven_available {
                self.ensure_maven_directories()?;
                if let Some(proxy_url) = self.ctx.proxy.http() {
                    self.configure_maven_proxy(proxy_url)?;
                }
            }

            // Spring Boot projects expect a resources scaffold to exist.
            let app_props = self
                .project
                .join("src/main/resources/application.properties");
            if !app_props.exists() {
                self.env.write_config_file(
                    "application.properties",
                    SPRING_APPLICATION_PROPERTIES,
                    Some("src/main/resources"),
                )?;
            }
        }

        // Dependency prefetch is best effort: the repository stays usable
        // even when the build is flaky in this environment.
        let mut built = false;
        if self.has_pom() && maven_available {
            built |= self.run_maven_install();
        }
        if self.has_gradle_build() {
            built |= self.run_gradle_build();
        }
        if built {
            self.report_build_artifacts();
        }

        Ok(())
    }
}

fn maven_user_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".m2")
}

fn maven_proxy_settings(host: &str, port: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<settings xmlns="http://maven.apache.org/SETTINGS/1.0.0"
          xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
          xsi:schemaLocation="http://maven.apache.org/SETTINGS/1.0.0
          http://maven.apache.org/xsd/settings-1.0.0.xsd">
  <localRepository>${{user.home}}/.m2/repository</localRepository>
  <proxies>
    <proxy>
      <id>http-proxy</id>
      <active>true</active>
      <protocol>http</protocol>
      <host>{host}</host>
      <port>{port}</port>
    </proxy>
  </proxies>
</settings>
"#
    )
}

/// Value of `<name>...</name>` inside the pom's properties, found by plain
/// tag scanning. Good enough for the two well-known property tags; a full
/// XML parse buys nothing here.
fn pom_property(content: &str, name: &str) -> Option<String> {
    let open = format!("<{}>", name);
    let close = format!("</{}>", name);
    let start = content.find(&open)? + open.len();
    let end = content[start..].find(&close)? + start;
    let value = content[start..end].trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Value of a `sourceCompatibility = '17'` style assignment in build.gradle.
fn gradle_source_compatibility(content: &str) -> Option<String> {
    for line in content.lines() {
        if !line.contains("sourceCompatibility") {
            continue;
        }
        let Some((_, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches(['\'', '"']);
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }
    None
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
