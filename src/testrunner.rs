use std::fs::{create_dir_all, remove_dir_all, rename, File};
use std::io::{self, Write};
use std::path::Path;

use colored::*;
use thiserror::Error;

use crate::test::testcase::TestCase;
use crate::test::TestingError;
use crate::variables::VariableMap;

#[derive(Debug, Error)]
pub enum TestrunnerError {
    #[error("Smoke dir {0} does not exist")]
    SmokeDirNotFound(String),
    #[error("Test {0} not found")]
    TestNotFound(String),
    #[error(transparent)]
    TestingError(#[from] TestingError),
    #[error(transparent)]
    IoError(#[from] io::Error),
}

#[derive(Debug, Default)]
pub struct TestrunnerOptions {
    pub smoke_dir: String,
    pub output: Option<String>,
    pub keep_work_dir: bool,
    /// True when the work directory was named by the caller (via `--work-dir`
    /// or a `WORK_DIR` override); such a directory is never auto-removed.
    pub explicit_work_dir: bool,
}

/// Discovers test case directories and drives them sequentially.
pub struct Testrunner {
    options: TestrunnerOptions,
    variables: VariableMap,
}

impl Testrunner {
    pub fn new(options: TestrunnerOptions, variables: VariableMap) -> Self {
        Testrunner { options, variables }
    }

    /// Immediate subdirectories of the smoke root holding a `command` file,
    /// sorted by name for deterministic ordering.
    pub fn discover_tests(&self) -> Result<Vec<TestCase>, TestrunnerError> {
        let smoke_dir = Path::new(&self.options.smoke_dir);
        if !smoke_dir.is_dir() {
            return Err(TestrunnerError::SmokeDirNotFound(self.options.smoke_dir.clone()));
        }
        let mut tests: Vec<TestCase> = smoke_dir
            .read_dir()?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| TestCase::is_valid(path))
            .map(TestCase::new)
            .collect();
        tests.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(tests)
    }

    pub fn list_tests(&self) -> Result<(), TestrunnerError> {
        for test in self.discover_tests()? {
            println!("{}", test.name());
        }
        Ok(())
    }

    /// Runs all discovered tests, or just the named one. Per-test failures
    /// are printed and counted but never affect the result; the process exit
    /// status stays 0 on a completed run regardless of the summary.
    pub fn run_tests(&self, filter: Option<&str>) -> Result<(), TestrunnerError> {
        let mut tests = self.discover_tests()?;
        if let Some(name) = filter {
            tests.retain(|test| test.name() == name);
            if tests.is_empty() {
                // A selected directory without a command file still runs, so
                // it reports "No command file" instead of vanishing.
                let path = Path::new(&self.options.smoke_dir).join(name);
                if path.is_dir() {
                    tests.push(TestCase::new(path));
                } else {
                    return Err(TestrunnerError::TestNotFound(name.to_owned()));
                }
            }
        }

        create_dir_all(self.variables.work_dir())?;
        let mut log = self.open_log_sink()?;
        let verbose = self.options.output.is_some();

        let mut passed = 0;
        let mut failed = 0;
        for test in &tests {
            println!("Running test: {}", test.name());
            let outcome = test.run(&self.variables, log.as_mut(), verbose)?;
            if outcome.passed {
                println!("{}", "PASS".green());
                passed += 1;
            } else {
                println!("{}", format!("FAIL: {}", outcome.reason).red());
                failed += 1;
            }
        }
        println!("\nSummary: {} passed, {} failed", passed, failed);

        if !self.options.explicit_work_dir && !self.options.keep_work_dir {
            remove_dir_all(self.variables.work_dir())?;
        }
        Ok(())
    }

    /// An existing log file is moved aside to a `.bak` sibling before a fresh
    /// one is opened; without `--output` all log writes are discarded.
    fn open_log_sink(&self) -> Result<Box<dyn Write>, TestrunnerError> {
        match &self.options.output {
            Some(path) => {
                if Path::new(path).exists() {
                    rename(path, format!("{}.bak", path))?;
                }
                Ok(Box::new(File::create(path)?))
            }
            None => Ok(Box::new(io::sink())),
        }
    }
}
