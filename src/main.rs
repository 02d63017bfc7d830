/// lizbox: a minimal Linux process container
///
/// `run` re-executes this binary as `child` inside new UTS, PID, mount and
/// network namespaces. The child joins the cgroup, sets the hostname,
/// changes root, mounts /proc and then runs the command.
///
/// # Usage
/// ```bash
/// sudo lizbox run /bin/sh
/// sudo lizbox run --pids-max 50 --timeout 10 ps aux
/// ```
use clap::error::ErrorKind;
use clap::Parser;
use lizbox::cli::{self, Cli};
use lizbox::types::SETUP_FAILURE_EXIT_CODE;

fn main() {
    // Logs go to stderr so the command's stdout stays untouched
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            std::process::exit(SETUP_FAILURE_EXIT_CODE);
        }
    };

    match cli::run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(SETUP_FAILURE_EXIT_CODE);
        }
    }
}
