use crate::config::{InstallPaths, LifecycleConfig};
use crate::deregister::{deregister, Deregistration};
use crate::register::register;
use crate::store::ConfigStore;
use crate::tools::{run_optional, ToolRun};
use anyhow::{Context, Result};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Done,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: String,
    pub outcome: StepOutcome,
    /// Removal of installed files; only these decide the exit status
    pub destructive: bool,
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            StepOutcome::Done => write!(f, "{}: done", self.step),
            StepOutcome::Skipped(reason) => write!(f, "{}: skipped ({})", self.step, reason),
            StepOutcome::Failed(reason) => write!(f, "{}: FAILED ({})", self.step, reason),
        }
    }
}

#[derive(Debug, Default)]
pub struct Report {
    pub steps: Vec<StepReport>,
    pub deregistration: Option<Deregistration>,
}

impl Report {
    /// True unless a file removal step failed
    pub fn succeeded(&self) -> bool {
        !self
            .steps
            .iter()
            .any(|s| s.destructive && matches!(s.outcome, StepOutcome::Failed(_)))
    }

    fn record(&mut self, step: &str, destructive: bool, outcome: StepOutcome) {
        let report = StepReport {
            step: step.to_string(),
            outcome,
            destructive,
        };
        match report.outcome {
            StepOutcome::Failed(_) => log::warn!("{}", report),
            _ => log::info!("{}", report),
        }
        self.steps.push(report);
    }

    fn record_result(&mut self, step: &str, result: Result<()>) {
        let outcome = match result {
            Ok(()) => StepOutcome::Done,
            Err(e) => StepOutcome::Failed(format!("{:#}", e)),
        };
        self.record(step, false, outcome);
    }
}

#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    pub binary: Option<PathBuf>,
    pub icon: Option<PathBuf>,
    pub binding: Option<String>,
    pub autostart: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UninstallOptions {
    pub keep_package: bool,
}

/// Runs the install and uninstall sequences step by step.
///
/// No step aborts the sequence; each result is recorded in the [`Report`].
pub struct Harness<'a, S> {
    config: &'a LifecycleConfig,
    paths: InstallPaths,
    /// `None` when no settings store is reachable
    store: Option<S>,
    dry_run: bool,
    refresh_caches: bool,
}

impl<'a, S: ConfigStore> Harness<'a, S> {
    pub fn new(config: &'a LifecycleConfig, paths: InstallPaths, store: Option<S>) -> Self {
        Self {
            config,
            paths,
            store,
            dry_run: false,
            refresh_caches: true,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn refresh_caches(mut self, refresh: bool) -> Self {
        self.refresh_caches = refresh;
        self
    }

    pub fn install(&mut self, options: &InstallOptions) -> Report {
        let mut report = Report::default();
        let binding = options
            .binding
            .clone()
            .unwrap_or_else(|| self.config.keybinding.binding.clone());

        let store_outcome = match self.store {
            Some(_) => StepOutcome::Done,
            None => StepOutcome::Skipped("gsettings not available, keybinding steps skipped".to_string()),
        };
        report.record("check dependencies", false, store_outcome);

        let dirs = [
            self.paths.binary.parent().map(Path::to_path_buf),
            Some(self.paths.applications_dir.clone()),
            self.paths.icon.parent().map(Path::to_path_buf),
            Some(self.paths.config_dir.clone()),
        ];
        let result = dirs
            .iter()
            .flatten()
            .try_for_each(|dir| self.create_dir(dir));
        report.record_result("create directories", result);

        match &options.binary {
            Some(source) => {
                let result = self.copy_file(source, &self.paths.binary, true);
                report.record_result("install binary", result);
            }
            None => report.record("install binary", false, StepOutcome::Skipped("no binary given".to_string())),
        }

        match &options.icon {
            Some(source) => {
                let result = self.copy_file(source, &self.paths.icon, false);
                report.record_result("install icon", result);
            }
            None => report.record("install icon", false, StepOutcome::Skipped("no icon given".to_string())),
        }

        let entry = self.desktop_entry();
        let result = self.write_file(&self.paths.desktop_entry, &entry);
        report.record_result("write desktop entry", result);

        if options.autostart {
            let result = self
                .create_dir_for(&self.paths.autostart_entry)
                .and_then(|()| self.write_file(&self.paths.autostart_entry, &entry));
            report.record_result("enable autostart", result);
        }

        let result = self.write_file(&self.paths.keybinding_file(), &binding);
        report.record_result("save keybinding choice", result);

        let command = self.paths.binary.to_string_lossy().into_owned();
        let outcome = match self.store.as_mut() {
            Some(store) => match register(store, &self.config.keybinding, &command, &binding) {
                Ok(registration) => {
                    log::info!("Registered {} at {}", binding, registration.slot);
                    StepOutcome::Done
                }
                Err(e) => StepOutcome::Failed(e.to_string()),
            },
            None => StepOutcome::Skipped("gsettings not available".to_string()),
        };
        report.record("register keybinding", false, outcome);

        self.refresh(&mut report);
        report
    }

    pub fn uninstall(&mut self, options: &UninstallOptions) -> Report {
        let mut report = Report::default();

        let outcome = match self.store.as_mut() {
            Some(store) => {
                let result = deregister(store, &self.config.keybinding);
                let outcome = match &result {
                    Deregistration::Removed { slots } => {
                        log::info!("Removed {} custom keybinding slot(s)", slots.len());
                        StepOutcome::Done
                    }
                    Deregistration::NotFound => StepOutcome::Skipped("nothing registered".to_string()),
                };
                report.deregistration = Some(result);
                outcome
            }
            None => {
                report.deregistration = Some(Deregistration::NotFound);
                StepOutcome::Skipped("gsettings not available".to_string())
            }
        };
        report.record("remove keybinding", false, outcome);

        let config_dir = self.paths.config_dir.clone();
        report.record("remove user configuration", true, self.remove_path(&config_dir));

        let files = [
            ("remove binary", self.paths.binary.clone()),
            ("remove icon", self.paths.icon.clone()),
            ("remove desktop entry", self.paths.desktop_entry.clone()),
            ("remove autostart entry", self.paths.autostart_entry.clone()),
        ];
        for (step, path) in files {
            report.record(step, true, self.remove_path(&path));
        }

        self.refresh(&mut report);

        if options.keep_package {
            report.record("remove system package", false, StepOutcome::Skipped("kept on request".to_string()));
        } else {
            let outcome = self.remove_package();
            report.record("remove system package", false, outcome);
        }

        report
    }

    fn desktop_entry(&self) -> String {
        let desktop = &self.config.desktop;
        format!(
            "[Desktop Entry]\n\
             Type=Application\n\
             Name={name}\n\
             Comment=Clipboard history\n\
             Exec={exec}\n\
             Icon={app_id}\n\
             Terminal=false\n\
             Categories=Utility;\n\
             StartupWMClass={app_id}\n",
            name = desktop.display_name,
            exec = self.paths.binary.display(),
            app_id = desktop.app_id,
        )
    }

    fn refresh(&self, report: &mut Report) {
        if !self.refresh_caches {
            report.record("refresh caches", false, StepOutcome::Skipped("disabled".to_string()));
            return;
        }
        if self.dry_run {
            report.record("refresh caches", false, StepOutcome::Skipped("dry run".to_string()));
            return;
        }

        let icon_dir = self.paths.icon_theme_dir.to_string_lossy().into_owned();
        let apps_dir = self.paths.applications_dir.to_string_lossy().into_owned();
        let tools = [
            ("refresh icon cache", "gtk-update-icon-cache", vec!["-f", "-t", icon_dir.as_str()]),
            ("refresh desktop database", "update-desktop-database", vec![apps_dir.as_str()]),
        ];
        for (step, tool, args) in tools {
            let outcome = match run_optional(tool, &args) {
                ToolRun::Succeeded => StepOutcome::Done,
                ToolRun::Missing => StepOutcome::Skipped(format!("{} not installed", tool)),
                ToolRun::Failed(reason) => StepOutcome::Failed(reason),
            };
            report.record(step, false, outcome);
        }
    }

    fn remove_package(&self) -> StepOutcome {
        let package = &self.config.desktop.package;
        let installed = match std::process::Command::new("dpkg-query")
            .args(["-W", "-f=${Status}", package.as_str()])
            .output()
        {
            Ok(output) => {
                output.status.success()
                    && String::from_utf8_lossy(&output.stdout).contains("install ok installed")
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return StepOutcome::Skipped("dpkg-query not installed".to_string());
            }
            Err(e) => return StepOutcome::Failed(format!("Failed to run dpkg-query: {}", e)),
        };

        if !installed {
            return StepOutcome::Skipped(format!("package {} not installed", package));
        }
        if self.dry_run {
            log::info!("[dry-run] would remove package {}", package);
            return StepOutcome::Skipped("dry run".to_string());
        }

        match run_optional("sudo", &["dpkg", "-r", package]) {
            ToolRun::Succeeded => StepOutcome::Done,
            ToolRun::Missing => StepOutcome::Skipped("sudo not installed".to_string()),
            ToolRun::Failed(reason) => StepOutcome::Failed(reason),
        }
    }

    fn remove_path(&self, path: &Path) -> StepOutcome {
        let metadata = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return StepOutcome::Skipped(format!("{:?} not present", path));
            }
            Err(e) => return StepOutcome::Failed(format!("Failed to inspect {:?}: {}", path, e)),
        };

        if self.dry_run {
            log::info!("[dry-run] would remove {:?}", path);
            return StepOutcome::Done;
        }

        let result = if metadata.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        match result {
            Ok(()) => StepOutcome::Done,
            Err(e) if e.kind() == ErrorKind::NotFound => StepOutcome::Skipped(format!("{:?} not present", path)),
            Err(e) => StepOutcome::Failed(format!("Failed to remove {:?}: {}", path, e)),
        }
    }

    fn create_dir(&self, dir: &Path) -> Result<()> {
        if self.dry_run {
            log::info!("[dry-run] would create {:?}", dir);
            return Ok(());
        }
        fs::create_dir_all(dir).with_context(|| format!("Failed to create directory: {:?}", dir))
    }

    fn create_dir_for(&self, file: &Path) -> Result<()> {
        match file.parent() {
            Some(dir) => self.create_dir(dir),
            None => Ok(()),
        }
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        if self.dry_run {
            log::info!("[dry-run] would write {:?}", path);
            return Ok(());
        }
        fs::write(path, content).with_context(|| format!("Failed to write file: {:?}", path))
    }

    fn copy_file(&self, source: &Path, target: &Path, executable: bool) -> Result<()> {
        if self.dry_run {
            log::info!("[dry-run] would copy {:?} to {:?}", source, target);
            return Ok(());
        }
        fs::copy(source, target)
            .with_context(|| format!("Failed to copy {:?} to {:?}", source, target))?;

        #[cfg(unix)]
        if executable {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(target, fs::Permissions::from_mode(0o755))
                .with_context(|| format!("Failed to set permissions on {:?}", target))?;
        }
        #[cfg(not(unix))]
        let _ = executable;

        Ok(())
    }
}
