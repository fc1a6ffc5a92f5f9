use std::collections::BTreeMap;
use std::env;
use std::process;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

/// Program under test; `PROGRAM_PATH` is derived from it and the target dir.
const PROGRAM: &str = "wxrust";
const TARGET: &str = "debug";
const CREDENTIALS: &str = "credentials.txt";

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{\{([^}]+)\}\}").unwrap();
}

#[derive(Debug, Error)]
#[error("Unknown variable: {0}")]
pub struct UnknownVariable(pub String);

/// Resolved substitution variables, frozen before any test runs.
#[derive(Debug)]
pub struct VariableMap {
    vars: BTreeMap<String, String>,
}

/// Two-pass construction: built-in defaults first, then CLI overrides,
/// which may overwrite any key including the built-ins.
pub struct VariableMapBuilder {
    vars: BTreeMap<String, String>,
}

impl VariableMapBuilder {
    pub fn new(target_dir: &str, smoke_dir: &str, work_dir: Option<&str>) -> Self {
        let project_name = env::current_dir()
            .ok()
            .and_then(|dir| dir.file_name().map(|name| name.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "unknown".to_owned());
        let pid = process::id();
        let work_dir = match work_dir {
            Some(dir) => dir.to_owned(),
            None => env::temp_dir()
                .join(format!("{}-{}", project_name, pid))
                .to_string_lossy()
                .into_owned(),
        };

        let mut vars = BTreeMap::new();
        vars.insert("PROJECT_NAME".to_owned(), project_name);
        vars.insert("PID".to_owned(), pid.to_string());
        vars.insert("TARGET_DIR".to_owned(), target_dir.to_owned());
        vars.insert("TARGET".to_owned(), TARGET.to_owned());
        vars.insert("PROGRAM".to_owned(), PROGRAM.to_owned());
        vars.insert("SMOKE_DIR".to_owned(), smoke_dir.to_owned());
        vars.insert("CREDENTIALS".to_owned(), CREDENTIALS.to_owned());
        vars.insert("WORK_DIR".to_owned(), work_dir);
        vars.insert("PROGRAM_PATH".to_owned(), format!("{}/{}/{}", target_dir, TARGET, PROGRAM));
        VariableMapBuilder { vars }
    }

    /// Keys are not validated, any string is accepted.
    pub fn set(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_owned(), value.to_owned());
    }

    pub fn build(self) -> VariableMap {
        VariableMap { vars: self.vars }
    }
}

impl VariableMap {
    pub fn builder(target_dir: &str, smoke_dir: &str, work_dir: Option<&str>) -> VariableMapBuilder {
        VariableMapBuilder::new(target_dir, smoke_dir, work_dir)
    }

    pub fn work_dir(&self) -> &str {
        self.vars.get("WORK_DIR").map(String::as_str).unwrap_or("")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Replaces every `{{VAR}}` placeholder with its mapped value, once per
    /// distinct variable. The result is not re-scanned recursively; after all
    /// known substitutions are applied, any remaining `{{...}}` whose name is
    /// not a key fails the substitution.
    pub fn substitute(&self, text: &str) -> Result<String, UnknownVariable> {
        let mut text = text.to_owned();
        for (key, value) in &self.vars {
            text = text.replace(&format!("{{{{{}}}}}", key), value);
        }
        for capture in PLACEHOLDER.captures_iter(&text) {
            let name = &capture[1];
            if !self.vars.contains_key(name) {
                return Err(UnknownVariable(name.to_owned()));
            }
        }
        Ok(text)
    }
}
