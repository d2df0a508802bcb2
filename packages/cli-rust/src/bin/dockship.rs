//! dockship - deploy a Git repository to a remote host as a Docker container

fn main() -> std::process::ExitCode {
    dockship::run()
}
