/// Command Line Interface for lizbox
use crate::bootstrap::Bootstrapper;
use crate::launcher::Launcher;
use crate::types::{ContainerConfig, Invocation, Result};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lizbox", version)]
#[command(about = "Run a command inside a minimal Linux container", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a command in a new container
    Run {
        /// JSON configuration file; flags take precedence over it
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Use a cgroup of its own for this launch and remove it afterwards
        #[arg(long)]
        unique_cgroup: bool,

        #[command(flatten)]
        container: ContainerArgs,
    },

    /// Container side of `run`, started inside the new namespaces
    #[command(hide = true)]
    Child {
        #[command(flatten)]
        container: ContainerArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ContainerArgs {
    /// Hostname inside the container [default: container]
    #[arg(long)]
    pub hostname: Option<String>,

    /// Directory that becomes the container root [default: /]
    #[arg(long)]
    pub rootfs: Option<PathBuf>,

    /// Mount point of the cgroup v2 hierarchy [default: /sys/fs/cgroup]
    #[arg(long)]
    pub cgroup_root: Option<PathBuf>,

    /// Name of the cgroup the container joins [default: liz]
    #[arg(long)]
    pub cgroup_name: Option<String>,

    /// Maximum number of processes in the container [default: 20]
    #[arg(long)]
    pub pids_max: Option<u32>,

    /// Kill the command after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Command and arguments to execute
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<String>,
}

impl ContainerArgs {
    /// Apply explicit flags on top of `config` and capture the command
    pub fn resolve(self, mut config: ContainerConfig) -> Result<(ContainerConfig, Invocation)> {
        if let Some(hostname) = self.hostname {
            config.hostname = hostname;
        }
        if let Some(rootfs) = self.rootfs {
            config.rootfs = rootfs;
        }
        if let Some(root) = self.cgroup_root {
            config.cgroup.root = root;
        }
        if let Some(name) = self.cgroup_name {
            config.cgroup.name = name;
        }
        if let Some(pids_max) = self.pids_max {
            config.cgroup.pids_max = pids_max;
        }
        if self.timeout.is_some() {
            config.timeout_secs = self.timeout;
        }

        let invocation = Invocation::from_tokens(self.command)?;
        Ok((config, invocation))
    }
}

pub fn run(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Commands::Run {
            config,
            unique_cgroup,
            container,
        } => {
            let base = match config {
                Some(path) => ContainerConfig::load(&path)?,
                None => ContainerConfig::default(),
            };
            let (config, invocation) = container.resolve(base)?;
            perform_security_checks(&config);

            let mut launcher = Launcher::new(config, invocation);
            if unique_cgroup {
                launcher = launcher.with_unique_cgroup();
            }
            launcher.launch().context("failed to launch container")
        }

        Commands::Child { container } => {
            let (config, invocation) = container.resolve(ContainerConfig::default())?;
            Bootstrapper::new(config, invocation)
                .run()
                .context("container setup failed")
        }
    }
}

/// Warn early about missing privileges or kernel features; the failing
/// syscall later is still what aborts the launch
fn perform_security_checks(config: &ContainerConfig) {
    if !nix::unistd::geteuid().is_root() {
        log::warn!("lizbox needs root for namespaces, chroot, mounts and cgroups");
    }
    if !crate::namespace::is_supported() {
        log::warn!("namespace isolation not supported on this system");
    }
    if !crate::cgroup::cgroups_available(&config.cgroup.root) {
        log::warn!(
            "no cgroup v2 hierarchy at {}",
            config.cgroup.root.display()
        );
    }
}
