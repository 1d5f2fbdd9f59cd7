use std::path::{Path, PathBuf};

use hoist_platform::PlatformId;
use log::info;
use thiserror::Error;

/// Proof that the installer process was launched; the host should exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallStarted {
    pub path: PathBuf,
}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("downloaded update not found at {}", path.display())]
    MissingFile { path: PathBuf },
    #[error("failed to mark {} as executable: {source}", path.display())]
    Permissions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to launch {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("installing updates is not supported on this platform")]
    Unsupported,
}

/// Process boundary used by the installer dispatch.
pub trait Launcher: Send + Sync {
    /// Run `path` directly as a new process.
    ///
    /// # Errors
    /// Returns the OS error when the process cannot be started.
    fn spawn(&self, path: &Path) -> std::io::Result<()>;

    /// Hand `path` to the OS "open" action.
    ///
    /// # Errors
    /// Returns the OS error when the open action cannot be started.
    fn open(&self, path: &Path) -> std::io::Result<()>;
}

pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn spawn(&self, path: &Path) -> std::io::Result<()> {
        std::process::Command::new(path).spawn().map(|_child| ())
    }

    fn open(&self, path: &Path) -> std::io::Result<()> {
        open::that_detached(path)
    }
}

/// Launch a downloaded update the way `platform` expects.
///
/// Windows runs the file as an installer, macOS opens it (disk image or
/// package), Linux marks it executable and runs it.
///
/// # Errors
/// Returns an error when the file is missing, its permissions cannot be set,
/// the process cannot be launched, or the platform is unknown.
pub fn install_update(
    path: &Path,
    platform: Option<PlatformId>,
    launcher: &dyn Launcher,
) -> Result<InstallStarted, InstallError> {
    if !path.is_file() {
        return Err(InstallError::MissingFile {
            path: path.to_path_buf(),
        });
    }

    let spawn_error = |source| InstallError::Spawn {
        path: path.to_path_buf(),
        source,
    };

    match platform.ok_or(InstallError::Unsupported)? {
        PlatformId::Windows => {
            info!("Launching installer: {}", path.display());
            launcher.spawn(path).map_err(spawn_error)?;
        }
        PlatformId::Macos => {
            info!("Opening update package: {}", path.display());
            launcher.open(path).map_err(spawn_error)?;
        }
        PlatformId::Linux => {
            make_executable(path)?;
            info!("Launching update: {}", path.display());
            launcher.spawn(path).map_err(spawn_error)?;
        }
    }

    Ok(InstallStarted {
        path: path.to_path_buf(),
    })
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), InstallError> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).map_err(|source| {
        InstallError::Permissions {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), InstallError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use hoist_platform::PlatformId;

    use super::{InstallError, Launcher, install_update};

    #[derive(Default)]
    struct RecordingLauncher {
        calls: Mutex<Vec<(&'static str, PathBuf)>>,
        fail: bool,
    }

    impl RecordingLauncher {
        fn record(&self, kind: &'static str, path: &Path) -> std::io::Result<()> {
            self.calls
                .lock()
                .expect("launcher lock should not be poisoned")
                .push((kind, path.to_path_buf()));
            if self.fail {
                Err(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "blocked",
                ))
            } else {
                Ok(())
            }
        }

        fn calls(&self) -> Vec<(&'static str, PathBuf)> {
            self.calls
                .lock()
                .expect("launcher lock should not be poisoned")
                .clone()
        }
    }

    impl Launcher for RecordingLauncher {
        fn spawn(&self, path: &Path) -> std::io::Result<()> {
            self.record("spawn", path)
        }

        fn open(&self, path: &Path) -> std::io::Result<()> {
            self.record("open", path)
        }
    }

    fn payload(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"#!/bin/sh\n").expect("payload should be written");
        path
    }

    #[test]
    fn windows_spawns_installer_directly() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = payload(&dir, "hoist-setup.exe");
        let launcher = RecordingLauncher::default();

        let started = install_update(&path, Some(PlatformId::Windows), &launcher)
            .expect("install should start");

        assert_eq!(started.path, path);
        assert_eq!(launcher.calls(), vec![("spawn", path)]);
    }

    #[test]
    fn macos_uses_open_action() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = payload(&dir, "hoist-mac.dmg");
        let launcher = RecordingLauncher::default();

        install_update(&path, Some(PlatformId::Macos), &launcher).expect("install should start");

        assert_eq!(launcher.calls(), vec![("open", path)]);
    }

    #[cfg(unix)]
    #[test]
    fn linux_marks_file_executable_before_spawning() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = payload(&dir, "hoist-linux.AppImage");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644))
            .expect("permissions should be set");
        let launcher = RecordingLauncher::default();

        install_update(&path, Some(PlatformId::Linux), &launcher).expect("install should start");

        let mode = std::fs::metadata(&path)
            .expect("payload metadata should be readable")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
        assert_eq!(launcher.calls(), vec![("spawn", path)]);
    }

    #[test]
    fn spawn_failure_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = payload(&dir, "hoist-setup.exe");
        let launcher = RecordingLauncher {
            fail: true,
            ..RecordingLauncher::default()
        };

        let error = install_update(&path, Some(PlatformId::Windows), &launcher)
            .expect_err("spawn failure should be reported");

        assert!(matches!(error, InstallError::Spawn { ref path, .. } if path.ends_with("hoist-setup.exe")));
        assert!(error.to_string().contains("hoist-setup.exe"));
    }

    #[test]
    fn missing_file_is_rejected_before_launch() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let launcher = RecordingLauncher::default();

        let error = install_update(
            &dir.path().join("gone.exe"),
            Some(PlatformId::Windows),
            &launcher,
        )
        .expect_err("missing file should fail");

        assert!(matches!(error, InstallError::MissingFile { .. }));
        assert!(launcher.calls().is_empty());
    }

    #[test]
    fn unknown_platform_is_unsupported() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = payload(&dir, "hoist.bin");
        let launcher = RecordingLauncher::default();

        assert!(matches!(
            install_update(&path, None, &launcher),
            Err(InstallError::Unsupported)
        ));
        assert!(launcher.calls().is_empty());
    }
}
