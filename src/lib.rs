//! lizbox: a minimal Linux process container
//! Runs a command in new UTS, PID, mount and network namespaces, behind a
//! chroot, with a private /proc and a cgroup v2 process limit

pub mod bootstrap;
pub mod cgroup;
pub mod cli;
pub mod executor;
pub mod filesystem;
pub mod launcher;
pub mod namespace;
pub mod types;
