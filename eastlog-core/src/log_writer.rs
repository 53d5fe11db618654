use std::{
    fs::{self, DirBuilder, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use colored::Colorize;

use crate::{
    error::{LogError, Result},
    utils::Level,
};

pub trait LogWriter {
    /// Writes one rendered line and returns the number of bytes written.
    fn regular(&mut self, line: &str, level: Level) -> Result<usize>;
}

/// Creates `dir` (and its parents) when missing and checks it can be written.
///
/// A concurrent creation of the same directory is not an error.
pub fn ensure_directory(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o755);
        }
        match builder.create(dir) {
            Ok(()) => log::debug!(target: "eastlog", "created log directory {}", dir.display()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => {}
            Err(source) => {
                return Err(LogError::Storage {
                    path: dir.to_path_buf(),
                    source,
                });
            }
        }
    }
    let metadata = fs::metadata(dir).map_err(|source| LogError::Storage {
        path: dir.to_path_buf(),
        source,
    })?;
    if metadata.permissions().readonly() {
        return Err(LogError::NotWritable {
            path: dir.to_path_buf(),
        });
    }
    Ok(())
}

/// A log file opened in append mode. Never truncated.
pub struct LogFile {
    path: PathBuf,
    file: File,
}

impl LogFile {
    /// Opens `path` for appending, creating its directory first.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        ensure_directory(&dir)?;
        let file = match File::options().create(true).append(true).open(&path) {
            Ok(file) => file,
            Err(source) => return Err(LogError::Write { path, source }),
        };
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogWriter for LogFile {
    fn regular(&mut self, line: &str, _level: Level) -> Result<usize> {
        // one write per line so concurrent appenders do not interleave
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        self.file
            .write_all(buf.as_bytes())
            .map_err(|source| LogError::Write {
                path: self.path.clone(),
                source,
            })?;
        Ok(buf.len())
    }
}

/// Echoes lines to stdout, coloured by level.
#[derive(Default, Debug)]
pub struct LogStdout;

impl LogWriter for LogStdout {
    fn regular(&mut self, line: &str, level: Level) -> Result<usize> {
        let colored = match level {
            Level::Error => line.red(),
            Level::Warning => line.yellow(),
            Level::Info => line.green(),
            Level::Debug => line.blue(),
            Level::Verbose => line.purple(),
        };
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{colored}")
            .and_then(|()| stdout.flush())
            .map_err(|source| LogError::Write {
                path: PathBuf::from("<stdout>"),
                source,
            })?;
        Ok(line.len() + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir(name: &str) -> PathBuf {
        let dir = PathBuf::from(format!("/tmp/eastlog_test_{name}"));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_log_file_appends() {
        let dir = test_dir("log_file_appends");
        let path = dir.join("web").join("app.log");
        let mut log_file = LogFile::open(&path).unwrap();
        assert_eq!(log_file.path(), path.as_path());
        assert_eq!(log_file.regular("Hello, world!", Level::Info).unwrap(), 14);
        assert_eq!(log_file.regular("rust is awesome !", Level::Error).unwrap(), 18);
        drop(log_file);

        // reopening appends instead of truncating
        let mut log_file = LogFile::open(&path).unwrap();
        log_file.regular("test", Level::Debug).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Hello, world!\nrust is awesome !\ntest\n"
        );
    }

    #[test]
    fn test_ensure_directory_is_idempotent() {
        let dir = test_dir("ensure_idempotent").join("a").join("b");
        ensure_directory(&dir).unwrap();
        assert!(dir.is_dir());
        ensure_directory(&dir).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_created_directory_mode() {
        use std::os::unix::fs::PermissionsExt;
        let dir = test_dir("directory_mode").join("web");
        ensure_directory(&dir).unwrap();
        let mode = fs::metadata(&dir).unwrap().permissions().mode();
        // umask may clear bits but never adds them
        assert_eq!(mode & 0o777 & !0o755, 0);
        assert_ne!(mode & 0o200, 0);
    }

    #[test]
    fn test_ensure_directory_under_a_file_fails() {
        let dir = test_dir("under_file");
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("plain");
        File::create(&file).unwrap();
        let err = ensure_directory(&file.join("web")).unwrap_err();
        assert!(matches!(err, LogError::Storage { .. }), "{err:?}");
        let err = ensure_directory(&file).unwrap_err();
        assert!(matches!(err, LogError::Storage { .. }), "{err:?}");
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_directory_is_not_writable() {
        use std::os::unix::fs::PermissionsExt;
        let dir = test_dir("read_only");
        fs::create_dir_all(&dir).unwrap();
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o555)).unwrap();
        let result = LogFile::open(dir.join("app.log"));
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();
        match result {
            Err(LogError::NotWritable { path }) => assert_eq!(path, dir),
            Err(other) => panic!("unexpected error {other:?}"),
            Ok(_) => panic!("read-only directory accepted"),
        }
        assert!(!dir.join("app.log").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_file_is_a_write_error() {
        use std::os::unix::fs::PermissionsExt;
        let dir = test_dir("read_only_file");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("app.log");
        fs::write(&path, "").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o444)).unwrap();
        let result = LogFile::open(&path);
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        if nix::unistd::geteuid().is_root() {
            // root ignores permission bits
            assert!(result.is_ok());
            return;
        }
        match result {
            Err(LogError::Write { path: failed, source }) => {
                assert_eq!(failed, path);
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            Err(other) => panic!("unexpected error {other:?}"),
            Ok(_) => panic!("read-only file accepted"),
        }
    }

    #[test]
    fn test_concurrent_appends_keep_lines_whole() {
        let dir = test_dir("concurrent_appends");
        let path = dir.join("app.log");
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let path = path.clone();
                std::thread::spawn(move || {
                    for j in 0..50 {
                        let mut file = LogFile::open(&path).unwrap();
                        let line = format!("thread {i} line {j:03} {}", "x".repeat(64));
                        file.regular(&line, Level::Info).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 400);
        let tail = "x".repeat(64);
        assert!(
            lines
                .iter()
                .all(|line| line.starts_with("thread ") && line.ends_with(&tail))
        );
    }

    #[test]
    fn test_log_stdout() {
        let mut log_stdout = LogStdout;
        for level in Level::ALL {
            assert_eq!(log_stdout.regular("lorem ipsum", level).unwrap(), 12);
        }
    }
}
