//! `bee script:make`: write a boilerplate script.

use std::io::Write;
use std::path::{Path, PathBuf};

use askama::Template;

use crate::error::{BeeError, Result};

/// Extension given to generated scripts.
pub const SCRIPT_EXTENSION: &str = "sh";

#[derive(Template)]
#[template(path = "script.sh", escape = "none")]
struct ScriptTemplate<'a> {
    script_name: &'a str,
}

/// Path the script for `name` is written to: any extension on `name` is
/// replaced with `.sh`, and relative names land under `cwd`.
pub fn script_path(cwd: &Path, name: &Path) -> Result<PathBuf> {
    let stem = name
        .file_stem()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| BeeError::Validation("Must provide a script name! EX: bee script:make myNewScript".into()))?;
    let file_name = format!("{}.{}", stem.to_string_lossy(), SCRIPT_EXTENSION);
    Ok(cwd.join(name.with_file_name(file_name)))
}

pub fn render(script_name: &str) -> Result<String> {
    ScriptTemplate { script_name }
        .render()
        .map_err(|e| BeeError::Validation(format!("failed to render script template: {}", e)))
}

/// Create the script. Refuses to overwrite an existing file.
pub fn make(cwd: &Path, name: &Path) -> Result<PathBuf> {
    let path = script_path(cwd, name)?;
    let script_name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let body = render(&script_name)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => {
                BeeError::Validation(format!("{} already exists", path.display()))
            }
            _ => BeeError::Io(e),
        })?;
    file.write_all(body.as_bytes())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    }

    tracing::info!(path = %path.display(), "script created");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_path_replaces_extension() {
        let cwd = Path::new("/work");
        assert_eq!(
            script_path(cwd, Path::new("newScript.js")).unwrap(),
            PathBuf::from("/work/newScript.sh")
        );
        assert_eq!(
            script_path(cwd, Path::new("app/scripts/newScript")).unwrap(),
            PathBuf::from("/work/app/scripts/newScript.sh")
        );
    }

    #[test]
    fn test_script_path_requires_a_name() {
        assert!(script_path(Path::new("/work"), Path::new("")).is_err());
    }

    #[test]
    fn test_render_fills_in_name() {
        let body = render("dataFix").unwrap();
        assert!(body.starts_with("#!/usr/bin/env bash"));
        assert!(body.contains("USAGE=\"dataFix [--run]\""));
        assert!(body.contains("Make your script idempotent!"));
    }

    #[test]
    fn test_make_writes_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = make(dir.path(), Path::new("scripts/cleanup")).unwrap();
        assert_eq!(path, dir.path().join("scripts/cleanup.sh"));
        assert!(std::fs::read_to_string(&path).unwrap().contains("cleanup"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }

        assert!(matches!(
            make(dir.path(), Path::new("scripts/cleanup.sh")),
            Err(BeeError::Validation(_))
        ));
    }
}
