use std::process::{Command, Stdio};

/// Launches external programs without waiting on them.
pub trait Spawner {
    fn spawn(&mut self, program: &str, args: &[String]);
}

/// Runs programs with `std::process::Command`. Children are never waited on;
/// `main` sets `SIGCHLD` to `SIG_IGN` so the kernel reaps them.
#[derive(Default)]
pub struct CommandSpawner;

impl Spawner for CommandSpawner {
    fn spawn(&mut self, program: &str, args: &[String]) {
        match Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .spawn()
        {
            Ok(child) => log::info!("Spawned {} (pid {})", program, child.id()),
            Err(e) => log::warn!("Failed to spawn {}: {}", program, e),
        }
    }
}

/// Makes exited children disappear without a `wait` call.
pub fn reap_children_automatically() {
    unsafe {
        libc::signal(libc::SIGCHLD, libc::SIG_IGN);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_does_not_panic() {
        let mut spawner = CommandSpawner;
        spawner.spawn("/nonexistent/stackwm-test-binary", &[]);
    }
}
