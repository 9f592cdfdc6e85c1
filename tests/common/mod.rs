#![allow(dead_code)]

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::{LazyLock, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};
use std::{env, fs};

use assert_fs::TempDir;
use filetime::FileTime;
use git2::{Repository, Signature, Time};
use walkdir::WalkDir;

/// Global mutex to ensure only one test manipulates HOME at a time.
static HOME_MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Variables that would redirect uv-hold away from the sandbox.
const HOST_VARS: &[&str] = &["UV_CACHE_DIR", "UV_HOLD_CACHE_DIR", "UV_HOLD_BASE_PATH"];

/// RAII guard that redirects HOME to a temporary directory and hides the
/// host's cache overrides.
///
/// While the guard is alive, default paths such as `~/.cache/uv` and the log
/// files resolve inside the sandbox, so tests never touch the developer's
/// real cache or logs.
pub struct TempHomeGuard {
    _lock: MutexGuard<'static, ()>,
    temp_home: TempDir,
    prev_home: Option<OsString>,
    prev_vars: Vec<(&'static str, Option<OsString>)>,
}

impl TempHomeGuard {
    pub fn new() -> Self {
        let lock = HOME_MUTEX
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let temp_home = TempDir::new().expect("failed to create temporary HOME");
        let prev_home = env::var_os("HOME");
        let prev_vars = HOST_VARS
            .iter()
            .map(|name| (*name, env::var_os(name)))
            .collect();

        // SAFETY: we hold HOME_MUTEX, ensuring no other thread mutates the
        // environment while we redirect HOME for the test.
        unsafe {
            env::set_var("HOME", temp_home.path());
            for name in HOST_VARS {
                env::remove_var(name);
            }
        }

        Self {
            _lock: lock,
            temp_home,
            prev_home,
            prev_vars,
        }
    }

    pub fn home(&self) -> &Path {
        self.temp_home.path()
    }
}

impl Drop for TempHomeGuard {
    fn drop(&mut self) {
        // SAFETY: guarded by HOME_MUTEX; we restore the environment to its
        // previous state before releasing the lock.
        unsafe {
            match self.prev_home.as_ref() {
                Some(prev) => env::set_var("HOME", prev),
                None => env::remove_var("HOME"),
            }
            for (name, prev) in &self.prev_vars {
                match prev {
                    Some(value) => env::set_var(name, value),
                    None => env::remove_var(name),
                }
            }
        }
    }
}

/// A sandbox holding a fake uv cache and a tree of Python projects.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("cache")).unwrap();
        fs::create_dir_all(dir.path().join("code")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn cache(&self) -> PathBuf {
        self.root().join("cache")
    }

    pub fn code(&self) -> PathBuf {
        self.root().join("code")
    }

    pub fn cleanup_log(&self) -> PathBuf {
        self.root().join("cleanup-log.json")
    }

    pub fn monitor_log(&self) -> PathBuf {
        self.root().join("monitor-log.json")
    }

    /// Write `len` bytes into `cache/<subdir>/<name>`.
    pub fn cache_file(&self, subdir: &str, name: &str, len: usize) {
        write_file(&self.cache().join(subdir).join(name), len);
    }

    /// Create `code/<project>` with `sources` Python files and return it.
    pub fn project(&self, project: &str, sources: usize) -> PathBuf {
        let dir = self.code().join(project);
        fs::create_dir_all(&dir).unwrap();
        for i in 0..sources {
            fs::write(dir.join(format!("module_{i}.py")), "print('hi')\n").unwrap();
        }
        dir
    }

    /// Install a package of `len` bytes into the project's `.venv`.
    pub fn install(&self, project: &Path, package: &str, len: usize) -> PathBuf {
        let env = project.join(".venv");
        let site_packages = env.join("lib/python3.12/site-packages");
        write_file(&site_packages.join(package).join("__init__.py"), len);
        write_file(
            &site_packages
                .join(format!("{package}-1.0.dist-info"))
                .join("METADATA"),
            10,
        );
        env
    }

    /// Make a project a Git repository with one commit.
    pub fn commit_all(&self, project: &Path) {
        let repo = Repository::init(project).unwrap();
        let signature = Signature::new("Dev", "dev@example.com", &Time::new(1_700_000_000, 0)).unwrap();
        let tree_id = {
            let mut index = repo.index().unwrap();
            index
                .add_all(["*.py"], git2::IndexAddOption::DEFAULT, None)
                .unwrap();
            index.write().unwrap();
            index.write_tree().unwrap()
        };
        let tree = repo.find_tree(tree_id).unwrap();
        repo.commit(Some("HEAD"), &signature, &signature, "initial", &tree, &[])
            .unwrap();
    }

    /// Set every mtime under `path` to `days` ago.
    pub fn age(&self, path: &Path, days: u64) {
        let then = FileTime::from_system_time(
            SystemTime::now() - Duration::from_secs(days * 24 * 60 * 60),
        );
        for entry in WalkDir::new(path).contents_first(true) {
            let entry = entry.unwrap();
            filetime::set_symlink_file_times(entry.path(), then, then).unwrap();
        }
    }

    /// Run the uv-hold binary against this workspace.
    ///
    /// Sandbox environments are tiny, so nothing is ignored for its size.
    pub fn run(&self, home: &Path, args: &[&str]) -> Output {
        let mut command = Command::new(env!("CARGO_BIN_EXE_uv-hold"));
        command
            .arg("--cache-dir")
            .arg(self.cache())
            .arg("--base-path")
            .arg(self.code())
            .arg("--cleanup-log")
            .arg(self.cleanup_log())
            .arg("--monitor-log")
            .arg(self.monitor_log())
            .arg("--apparent-size")
            .arg("--ignore-below")
            .arg("0")
            .args(args)
            .current_dir(self.root())
            .env("HOME", home);
        for name in HOST_VARS {
            command.env_remove(name);
        }
        command.output().expect("failed to run uv-hold")
    }
}

fn write_file(path: &Path, len: usize) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, vec![b'x'; len]).unwrap();
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
