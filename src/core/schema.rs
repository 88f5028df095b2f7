//! Resource entry validation
//!
//! Each resource table entry is checked by an explicit validation function
//! before it is deserialized into its typed descriptor. Validators collect
//! every problem they find instead of stopping at the first one.

use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;

/// A single schema violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted path of the offending field (e.g. `usb.vid`)
    pub field: String,
    /// What is wrong with it
    pub reason: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' {}", self.field, self.reason)
    }
}

/// Field presence rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    Required,
    Optional,
}

/// Expected JSON type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    String,
    Object,
    StringArray,
    StringMap,
}

/// Checks the fields of one JSON object against a field list.
struct ObjectChecker<'a> {
    obj: &'a Map<String, Value>,
    prefix: &'a str,
    known: Vec<&'static str>,
    violations: Vec<Violation>,
}

impl<'a> ObjectChecker<'a> {
    fn new(obj: &'a Map<String, Value>, prefix: &'a str) -> Self {
        Self {
            obj,
            prefix,
            known: Vec::new(),
            violations: Vec::new(),
        }
    }

    fn path(&self, field: &str) -> String {
        if self.prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{field}", self.prefix)
        }
    }

    fn field(&mut self, name: &'static str, presence: Presence, kind: Kind) -> Option<&'a Value> {
        self.known.push(name);
        let Some(value) = self.obj.get(name) else {
            if presence == Presence::Required {
                let path = self.path(name);
                self.violations.push(Violation::new(path, "is required"));
            }
            return None;
        };
        let ok = match kind {
            Kind::String => value.is_string(),
            Kind::Object => value.is_object(),
            Kind::StringArray => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            Kind::StringMap => value
                .as_object()
                .is_some_and(|map| map.values().all(Value::is_string)),
        };
        if ok {
            Some(value)
        } else {
            let expected = match kind {
                Kind::String => "must be a string",
                Kind::Object => "must be an object",
                Kind::StringArray => "must be a list of strings",
                Kind::StringMap => "must map names to strings",
            };
            let path = self.path(name);
            self.violations.push(Violation::new(path, expected));
            None
        }
    }

    fn finish(mut self) -> Vec<Violation> {
        for key in self.obj.keys() {
            if !self.known.contains(&key.as_str()) {
                let path = self.path(key);
                self.violations.push(Violation::new(path, "is not a known field"));
            }
        }
        self.violations
    }
}

fn as_object<'a>(entry: &'a Value, violations: &mut Vec<Violation>) -> Option<&'a Map<String, Value>> {
    let obj = entry.as_object();
    if obj.is_none() {
        violations.push(Violation::new("", "entry must be an object"));
    }
    obj
}

/// Validate a `platforms.jsonc` entry
pub fn validate_platform(entry: &Value) -> Vec<Violation> {
    let mut violations = Vec::new();
    let Some(obj) = as_object(entry, &mut violations) else {
        return violations;
    };
    let mut checker = ObjectChecker::new(obj, "");
    checker.field("description", Presence::Required, Kind::String);
    checker.finish()
}

/// Validate a `packages.jsonc` entry
pub fn validate_package(entry: &Value) -> Vec<Violation> {
    let mut violations = Vec::new();
    let Some(obj) = as_object(entry, &mut violations) else {
        return violations;
    };
    let mut checker = ObjectChecker::new(obj, "");
    checker.field("description", Presence::Required, Kind::String);
    checker.field("restricted-to-platforms", Presence::Optional, Kind::StringArray);
    let repository = checker.field("repository", Presence::Required, Kind::Object);
    let release = checker.field("release", Presence::Required, Kind::Object);
    let env = checker.field("env", Presence::Optional, Kind::Object);
    violations.extend(checker.finish());

    if let Some(obj) = repository.and_then(Value::as_object) {
        let mut checker = ObjectChecker::new(obj, "repository");
        checker.field("organization", Presence::Required, Kind::String);
        checker.field("name", Presence::Required, Kind::String);
        violations.extend(checker.finish());
    }

    if let Some(obj) = release.and_then(Value::as_object) {
        let mut checker = ObjectChecker::new(obj, "release");
        let requirement = checker.field("requirement", Presence::Required, Kind::String);
        checker.field("file-name", Presence::Required, Kind::String);
        checker.field("uncompressed-name", Presence::Optional, Kind::String);
        violations.extend(checker.finish());
        if let Some(req) = requirement.and_then(Value::as_str) {
            if let Err(e) = semver::VersionReq::parse(req) {
                violations.push(Violation::new(
                    "release.requirement",
                    format!("is not a valid version requirement: {e}"),
                ));
            }
        }
    }

    if let Some(obj) = env.and_then(Value::as_object) {
        let mut checker = ObjectChecker::new(obj, "env");
        checker.field("path", Presence::Optional, Kind::StringArray);
        checker.field("vars", Presence::Optional, Kind::StringMap);
        violations.extend(checker.finish());
    }

    violations
}

fn is_usb_id(s: &str) -> bool {
    s.len() == 4 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Validate a `boards.jsonc` entry
pub fn validate_board(entry: &Value) -> Vec<Violation> {
    let mut violations = Vec::new();
    let Some(obj) = as_object(entry, &mut violations) else {
        return violations;
    };
    let mut checker = ObjectChecker::new(obj, "");
    checker.field("description", Presence::Required, Kind::String);
    checker.field("legacy-name", Presence::Optional, Kind::String);
    checker.field("fpga-id", Presence::Required, Kind::String);
    let programmer = checker.field("programmer", Presence::Required, Kind::Object);
    let usb = checker.field("usb", Presence::Optional, Kind::Object);
    violations.extend(checker.finish());

    if let Some(obj) = programmer.and_then(Value::as_object) {
        let mut checker = ObjectChecker::new(obj, "programmer");
        checker.field("id", Presence::Required, Kind::String);
        violations.extend(checker.finish());
    }

    if let Some(obj) = usb.and_then(Value::as_object) {
        let mut checker = ObjectChecker::new(obj, "usb");
        let vid = checker.field("vid", Presence::Required, Kind::String);
        let pid = checker.field("pid", Presence::Required, Kind::String);
        let regex = checker.field("product-regex", Presence::Optional, Kind::String);
        violations.extend(checker.finish());

        for (name, value) in [("usb.vid", vid), ("usb.pid", pid)] {
            if let Some(id) = value.and_then(Value::as_str) {
                if !is_usb_id(id) {
                    violations.push(Violation::new(name, "must be 4 hex digits"));
                }
            }
        }
        if let Some(pattern) = regex.and_then(Value::as_str) {
            if let Err(e) = Regex::new(pattern) {
                violations.push(Violation::new(
                    "usb.product-regex",
                    format!("is not a valid regex: {e}"),
                ));
            }
        }
    }

    violations
}

/// Validate an `fpgas.jsonc` entry
///
/// `pack` is required for ice40 and ecp5 parts, `speed` for ecp5 parts.
pub fn validate_fpga(entry: &Value) -> Vec<Violation> {
    let mut violations = Vec::new();
    let Some(obj) = as_object(entry, &mut violations) else {
        return violations;
    };
    let arch = obj.get("arch").and_then(Value::as_str);
    let (pack, speed) = match arch {
        Some("ice40") => (Presence::Required, Presence::Optional),
        Some("ecp5") => (Presence::Required, Presence::Required),
        _ => (Presence::Optional, Presence::Optional),
    };

    let mut checker = ObjectChecker::new(obj, "");
    checker.field("description", Presence::Optional, Kind::String);
    checker.field("part-num", Presence::Required, Kind::String);
    checker.field("arch", Presence::Required, Kind::String);
    checker.field("size", Presence::Required, Kind::String);
    checker.field("type", Presence::Required, Kind::String);
    checker.field("pack", pack, Kind::String);
    checker.field("speed", speed, Kind::String);
    checker.field("idcode", Presence::Optional, Kind::String);
    violations.extend(checker.finish());

    if let Some(arch) = arch {
        if !matches!(arch, "ice40" | "ecp5" | "gowin") {
            violations.push(Violation::new(
                "arch",
                format!("'{arch}' is not one of ice40, ecp5, gowin"),
            ));
        }
    }

    violations
}

/// Validate a `programmers.jsonc` entry
pub fn validate_programmer(entry: &Value) -> Vec<Violation> {
    let mut violations = Vec::new();
    let Some(obj) = as_object(entry, &mut violations) else {
        return violations;
    };
    let mut checker = ObjectChecker::new(obj, "");
    checker.field("description", Presence::Optional, Kind::String);
    checker.field("command", Presence::Required, Kind::String);
    checker.field("args", Presence::Required, Kind::String);
    checker.finish()
}
