use std::path::{Path, PathBuf};
use std::process::Command;

/// Find an executable by name on PATH, falling back to the usual system dirs
pub fn find_tool(name: &str) -> Option<PathBuf> {
    let from_path = std::env::var_os("PATH").and_then(|paths| {
        std::env::split_paths(&paths)
            .map(|dir| dir.join(name))
            .find(|full_path| full_path.is_file())
    });

    from_path.or_else(|| {
        ["/usr/bin", "/bin", "/usr/local/bin"]
            .iter()
            .map(|dir| Path::new(dir).join(name))
            .find(|p| p.is_file())
    })
}

/// Outcome of running an optional helper tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRun {
    Succeeded,
    Missing,
    Failed(String),
}

/// Run `name` with `args` if it is installed, waiting for it to finish
pub fn run_optional(name: &str, args: &[&str]) -> ToolRun {
    let Some(tool) = find_tool(name) else {
        log::debug!("{} not installed, skipping", name);
        return ToolRun::Missing;
    };

    log::debug!("Running {} {}", tool.display(), args.join(" "));
    match Command::new(&tool).args(args).output() {
        Ok(output) if output.status.success() => ToolRun::Succeeded,
        Ok(output) => ToolRun::Failed(format!(
            "{} exited with {}: {}",
            name,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )),
        Err(e) => ToolRun::Failed(format!("Failed to run {}: {}", name, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tools_are_reported_not_run() {
        assert_eq!(
            run_optional("klipbored-no-such-tool-anywhere", &[]),
            ToolRun::Missing
        );
        assert!(find_tool("klipbored-no-such-tool-anywhere").is_none());
    }
}
