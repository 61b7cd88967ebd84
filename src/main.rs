mod commands;
mod constants;
mod errors;
mod installers;
mod libs;
mod logger;
mod schemas;

use clap::Parser;
use colored::Colorize;

use commands::bootstrap::{self, BootstrapOptions};

/// Clone repositories, detect their stacks, and stand up the toolchains they
/// need to build.
#[derive(Parser)]
#[command(name = "repo-bootstrap", version)]
#[command(about = "Bootstrap development environments from source repositories", long_about = None)]
struct Cli {
    /// HTTP proxy URL (e.g. http://proxy.corp.example:8080)
    #[arg(long, env = "HTTP_PROXY")]
    http_proxy: Option<String>,

    /// HTTPS proxy URL (e.g. http://proxy.corp.example:8080)
    #[arg(long, env = "HTTPS_PROXY")]
    https_proxy: Option<String>,

    /// Overwrite existing clone directories without prompting
    #[arg(long)]
    force: bool,

    /// Git user.name to configure when git has none
    #[arg(long, requires = "git_email")]
    git_user: Option<String>,

    /// Git user.email to configure when git has none
    #[arg(long, requires = "git_user")]
    git_email: Option<String>,

    /// Directory receiving cloned projects (default: ~/bootstrap-projects)
    #[arg(long, value_name = "PATH")]
    projects_dir: Option<String>,

    /// Directory receiving installed toolchains (default: ~/.repo-bootstrap/tools)
    #[arg(long, value_name = "PATH")]
    tools_dir: Option<String>,

    /// Turn debugging information on
    #[arg(short, long)]
    debug: bool,

    /// Repository URLs to bootstrap, processed in order
    #[arg(required = true, value_name = "REPO_URL")]
    repositories: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    logger::init(cli.debug);

    let options = BootstrapOptions {
        http_proxy: cli.http_proxy,
        https_proxy: cli.https_proxy,
        force: cli.force,
        git_user: cli.git_user,
        git_email: cli.git_email,
        projects_dir: cli.projects_dir,
        tools_dir: cli.tools_dir,
        repositories: cli.repositories,
    };

    match bootstrap::run(options) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            crate::log_error!("{:#}", err);
            std::process::exit(1);
        }
    }
}
