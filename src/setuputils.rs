//! Legacy `setup.py` generation from `pyproject.toml`.
//!
//! Wheels described only by `pyproject.toml` don't install with old versions
//! of pip, so a `setup.py` carrying the same metadata is shipped alongside.

use crate::fileutils::save_text_file;
use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use toml::{Table, Value};

/// Homepage urls in order of precedence
const SETUP_URL_LIST: [&str; 3] = ["Homepage", "Documentation", "Source"];

/// `[project]` keys copied to `setup.py`, with their `setup()` names.
const PROJECT_KEYWORDS: [(&str, &str); 10] = [
    ("name", "name"),
    ("version", "version"),
    ("description", "description"),
    ("author", "author"),
    ("author_email", "author_email"),
    ("license", "license"),
    ("requires-python", "python_requires"),
    ("dependencies", "install_requires"),
    ("classifiers", "classifiers"),
    ("keywords", "keywords"),
];

const SETUPTOOLS_KEYWORDS: [(&str, &str); 2] = [("platforms", "platforms"), ("zip-safe", "zip_safe")];

/// Append a `"key": value,` dict entry.
///
/// Strings are quoted, booleans use Python spelling and arrays become one
/// line per element indented by `indent2`.
fn output_entry(lines: &mut Vec<String>, key: &str, data: &Value, indent: usize, indent2: usize) {
    let tabs = " ".repeat(indent);
    match data {
        Value::String(s) => lines.push(format!("{}\"{}\": \"{}\",", tabs, key, s)),
        Value::Boolean(b) => lines.push(format!(
            "{}\"{}\": {},",
            tabs,
            key,
            if *b { "True" } else { "False" }
        )),
        Value::Integer(i) => lines.push(format!("{}\"{}\": {},", tabs, key, i)),
        Value::Float(f) => lines.push(format!("{}\"{}\": {},", tabs, key, f)),
        Value::Array(items) => {
            lines.push(format!("{}\"{}\": [", tabs, key));
            let tabs2 = " ".repeat(indent2);
            for item in items {
                let text = match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                lines.push(format!("{}\"{}\",", tabs2, text));
            }
            lines.push(format!("{}],", tabs));
        }
        // license = { text = "MIT" }
        Value::Table(table) => {
            if let Some(Value::String(text)) = table.get("text") {
                lines.push(format!("{}\"{}\": \"{}\",", tabs, key, text));
            }
        }
        Value::Datetime(d) => lines.push(format!("{}\"{}\": \"{}\",", tabs, key, d)),
    }
}

fn process_entries(lines: &mut Vec<String>, table: Option<&Table>, keywords: &[(&str, &str)]) {
    let Some(table) = table else {
        return;
    };
    for (key, setup_key) in keywords {
        if let Some(data) = table.get(*key) {
            output_entry(lines, setup_key, data, 4, 8);
        }
    }
}

/// Value of a `NAME = "literal"` assignment in Python source.
pub fn find_python_assignment(source: &str, name: &str) -> Option<String> {
    let pattern = format!(
        r#"(?m)^{}\s*=\s*(?:"([^"]*)"|'([^']*)')"#,
        regex::escape(name)
    );
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(source)?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str().to_string())
}

/// Candidate source files for a dotted module name.
fn module_files(base_dir: &Path, module: &str) -> Vec<PathBuf> {
    let relative: PathBuf = module.split('.').collect();
    let mut result = Vec::new();
    for root in [base_dir.to_path_buf(), base_dir.join("src")] {
        let path = root.join(&relative);
        result.push(path.with_extension("py"));
        result.push(path.join("__init__.py"));
    }
    result
}

/// Resolve `attr = "package.module.NAME"` by reading the module source.
fn resolve_attr(base_dir: &Path, attr: &str) -> Option<String> {
    let mut parts: Vec<&str> = attr.trim().split('.').collect();
    let name = parts.pop()?;
    let module = if parts.is_empty() {
        "__init__".to_string()
    } else {
        parts.join(".")
    };
    module_files(base_dir, &module)
        .iter()
        .filter_map(|path| std::fs::read_to_string(path).ok())
        .find_map(|source| find_python_assignment(&source, name))
}

/// Resolve `file = "VERSION"` or `file = ["a", "b"]` by reading the files.
fn resolve_file(base_dir: &Path, files: &Value) -> Option<String> {
    let names: Vec<&str> = match files {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => return None,
    };
    let mut contents = Vec::new();
    for name in names {
        contents.push(std::fs::read_to_string(base_dir.join(name)).ok()?);
    }
    Some(contents.join("\n").trim().to_string())
}

/// Replace every `dynamic` project field with its resolved value.
fn setup_dynamic(project: &mut Table, tool: Option<&Table>, base_dir: &Path) {
    let Some(dynamic_table) = tool
        .and_then(|t| t.get("setuptools"))
        .and_then(Value::as_table)
        .and_then(|s| s.get("dynamic"))
        .and_then(Value::as_table)
    else {
        return;
    };
    let Some(dynamic) = project.get("dynamic").and_then(Value::as_array).cloned() else {
        return;
    };
    for item in dynamic.iter().filter_map(Value::as_str) {
        let Some(entry) = dynamic_table.get(item).and_then(Value::as_table) else {
            continue;
        };
        let resolved = if let Some(files) = entry.get("file") {
            resolve_file(base_dir, files)
        } else if let Some(attr) = entry.get("attr").and_then(Value::as_str) {
            resolve_attr(base_dir, attr)
        } else {
            None
        };
        if let Some(value) = resolved {
            project.insert(item.to_string(), Value::String(value));
        }
    }
}

fn find_url(lines: &mut Vec<String>, project: &Table) {
    let Some(urls) = project.get("urls").and_then(Value::as_table) else {
        return;
    };
    let url = SETUP_URL_LIST
        .iter()
        .find_map(|key| urls.get(*key))
        .or_else(|| urls.values().next());
    if let Some(url) = url {
        output_entry(lines, "url", url, 4, 8);
    }
}

fn find_license_file(lines: &mut Vec<String>, project: &Table) {
    if let Some(first) = project
        .get("license-files")
        .and_then(Value::as_array)
        .and_then(|files| files.first())
    {
        output_entry(lines, "license_file", first, 4, 8);
    }
}

/// Insert code that loads the readme into `LONG_DESCRIPTION`.
fn find_readme_file(lines: &mut Vec<String>, project: &Table) {
    let readme = match project.get("readme") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Table(t)) => match t.get("file").and_then(Value::as_str) {
            Some(s) => s.to_string(),
            None => return,
        },
        _ => return,
    };
    if let Some(index) = lines.iter().position(|l| l == "import setuptools") {
        lines.splice(index..index, ["import io".to_string(), "import os".to_string()]);
    }
    if let Some(index) = lines.iter().position(|l| l == "SETUP_ARGS = {") {
        let index = index.saturating_sub(1);
        lines.splice(
            index..index,
            [
                "# Ensure the working directory is captured".to_string(),
                "CWD = os.path.dirname(os.path.abspath(__file__))".to_string(),
                String::new(),
                "# Read the file into LONG_DESCRIPTION using utf-8".to_string(),
                format!(
                    "with io.open(os.path.join(CWD, \"{}\"), encoding=\"utf-8\") as fp:",
                    readme
                ),
                "    LONG_DESCRIPTION = fp.read()".to_string(),
                String::new(),
            ],
        );
    }
    lines.push("    \"long_description\": LONG_DESCRIPTION,".to_string());
}

fn find_packages(lines: &mut Vec<String>, setuptools: Option<&Table>) {
    let Some(setuptools) = setuptools else {
        return;
    };
    let include = setuptools
        .get("packages")
        .and_then(Value::as_table)
        .and_then(|p| p.get("find"))
        .and_then(Value::as_table)
        .and_then(|f| f.get("include"));
    match include {
        Some(Value::String(s)) => {
            output_entry(lines, "packages", &Value::Array(vec![Value::String(s.clone())]), 4, 8)
        }
        Some(list @ Value::Array(_)) => output_entry(lines, "packages", list, 4, 8),
        _ => {}
    }
    if let Some(package_data) = setuptools.get("package-data").and_then(Value::as_table) {
        lines.push("    \"package_data\": {".to_string());
        for (key, value) in package_data {
            output_entry(lines, key, value, 8, 12);
        }
        lines.push("    },".to_string());
    }
}

/// Lines of a `setup.py` equivalent to a parsed `pyproject.toml`.
///
/// `base_dir` is where `dynamic` files and modules are looked up.
pub fn generate_setup_py(pyproject: &Table, base_dir: &Path) -> Vec<String> {
    let mut lines: Vec<String> = [
        "#!/usr/bin/env python",
        "# -*- coding: utf-8 -*-",
        "",
        "\"\"\"",
        "Generated with burger::setuputils::create_setup_py()",
        "\"\"\"",
        "",
        "import setuptools",
        "",
        "# Data lovingly ripped off from a toml file",
        "SETUP_ARGS = {",
    ]
    .into_iter()
    .map(str::to_string)
    .collect();

    let tool = pyproject.get("tool").and_then(Value::as_table);
    if let Some(project) = pyproject.get("project").and_then(Value::as_table) {
        let setuptools = tool
            .and_then(|t| t.get("setuptools"))
            .and_then(Value::as_table);
        let mut project = project.clone();
        setup_dynamic(&mut project, tool, base_dir);
        process_entries(&mut lines, Some(&project), &PROJECT_KEYWORDS);
        process_entries(&mut lines, setuptools, &SETUPTOOLS_KEYWORDS);
        find_url(&mut lines, &project);
        find_license_file(&mut lines, &project);
        find_readme_file(&mut lines, &project);
        find_packages(&mut lines, setuptools);
    }

    lines.extend(
        [
            "}",
            "",
            "# Pass metadata to pip for old python versions",
            "",
            "if __name__ == \"__main__\":",
            "    setuptools.setup(**SETUP_ARGS)",
        ]
        .into_iter()
        .map(str::to_string),
    );
    lines
}

/// Read `toml_name` (default `pyproject.toml`) and write `setup_name`
/// (default `setup.py`).
pub fn create_setup_py(toml_name: Option<&Path>, setup_name: Option<&Path>) -> Result<()> {
    let toml_name = toml_name.unwrap_or(Path::new("pyproject.toml"));
    let setup_name = setup_name.unwrap_or(Path::new("setup.py"));

    let text = std::fs::read_to_string(toml_name)
        .with_context(|| format!("Failed to read {}", toml_name.display()))?;
    let pyproject: Table = toml::from_str(&text)
        .with_context(|| format!("Failed to parse {}", toml_name.display()))?;
    let base_dir = toml_name
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let lines = generate_setup_py(&pyproject, base_dir);
    save_text_file(setup_name, &lines, None, false)
        .with_context(|| format!("Failed to write {}", setup_name.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PYPROJECT: &str = r#"
[project]
name = "burger"
dynamic = ["version"]
description = "Burger Becky's shared code"
requires-python = ">=2.7"
dependencies = ["setuptools >= 0.7.0", "wslwinreg"]
readme = "README.rst"
license-files = ["LICENSE.txt"]

[project.urls]
Source = "https://github.com/burgerbecky/pyburger"
Homepage = "http://burgerbecky.com"

[tool.setuptools]
platforms = ["Any"]
zip-safe = false

[tool.setuptools.packages.find]
include = ["burger"]

[tool.setuptools.package-data]
burger = ["*.txt"]

[tool.setuptools.dynamic]
version = { attr = "burger.__pkginfo__.VERSION" }
"#;

    fn parse(text: &str) -> Table {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn test_find_python_assignment() {
        let src = "# comment\nVERSION = \"1.4.2\"\nOTHER='x'\n";
        assert_eq!(find_python_assignment(src, "VERSION").as_deref(), Some("1.4.2"));
        assert_eq!(find_python_assignment(src, "OTHER").as_deref(), Some("x"));
        assert_eq!(find_python_assignment(src, "MISSING"), None);
    }

    #[test]
    fn test_generate_full_setup_py() {
        let dir = TempDir::new().unwrap();
        let pkg = dir.path().join("burger");
        std::fs::create_dir_all(&pkg).unwrap();
        std::fs::write(pkg.join("__pkginfo__.py"), "VERSION = \"1.4.2\"\n").unwrap();

        let lines = generate_setup_py(&parse(PYPROJECT), dir.path());
        let text = lines.join("\n");
        assert!(lines.contains(&"    \"name\": \"burger\",".to_string()));
        assert!(lines.contains(&"    \"version\": \"1.4.2\",".to_string()));
        assert!(lines.contains(&"    \"python_requires\": \">=2.7\",".to_string()));
        assert!(text.contains("    \"install_requires\": [\n        \"setuptools >= 0.7.0\",\n        \"wslwinreg\",\n    ],"));
        assert!(lines.contains(&"    \"zip_safe\": False,".to_string()));
        assert!(lines.contains(&"    \"url\": \"http://burgerbecky.com\",".to_string()));
        assert!(lines.contains(&"    \"license_file\": \"LICENSE.txt\",".to_string()));
        assert!(text.contains("    \"packages\": [\n        \"burger\",\n    ],"));
        assert!(text.contains("    \"package_data\": {\n        \"burger\": [\n            \"*.txt\",\n        ],\n    },"));
        assert!(lines.contains(&"    \"long_description\": LONG_DESCRIPTION,".to_string()));

        let io = lines.iter().position(|l| l == "import io").unwrap();
        assert_eq!(lines[io + 2], "import setuptools");
        let cwd = lines.iter().position(|l| l.starts_with("CWD = ")).unwrap();
        let args = lines.iter().position(|l| l == "SETUP_ARGS = {").unwrap();
        assert!(cwd < args);
        assert_eq!(lines.last().map(String::as_str), Some("    setuptools.setup(**SETUP_ARGS)"));
    }

    #[test]
    fn test_url_falls_back_to_first() {
        let table = parse("[project]\nname = \"x\"\n[project.urls]\nTracker = \"https://t\"\n");
        let lines = generate_setup_py(&table, Path::new("."));
        assert!(lines.contains(&"    \"url\": \"https://t\",".to_string()));
    }

    #[test]
    fn test_url_fallback_keeps_declaration_order() {
        let table = parse(
            "[project]\nname = \"x\"\n[project.urls]\nTracker = \"https://t\"\nChangelog = \"https://c\"\n",
        );
        let lines = generate_setup_py(&table, Path::new("."));
        assert!(lines.contains(&"    \"url\": \"https://t\",".to_string()));
        assert!(!lines.iter().any(|l| l.contains("https://c")));
    }

    #[test]
    fn test_dynamic_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("VERSION"), "2.0.1\n").unwrap();
        let table = parse(
            "[project]\nname = \"x\"\ndynamic = [\"version\"]\n\
             [tool.setuptools.dynamic]\nversion = { file = \"VERSION\" }\n",
        );
        let lines = generate_setup_py(&table, dir.path());
        assert!(lines.contains(&"    \"version\": \"2.0.1\",".to_string()));
    }

    #[test]
    fn test_no_project_section() {
        let lines = generate_setup_py(&Table::new(), Path::new("."));
        assert_eq!(lines[10], "SETUP_ARGS = {");
        assert_eq!(lines[11], "}");
    }

    #[test]
    fn test_create_setup_py_writes_file() {
        let dir = TempDir::new().unwrap();
        let toml_path = dir.path().join("pyproject.toml");
        let setup_path = dir.path().join("setup.py");
        std::fs::write(&toml_path, "[project]\nname = \"demo\"\n").unwrap();
        create_setup_py(Some(&toml_path), Some(&setup_path)).unwrap();
        let text = std::fs::read_to_string(&setup_path).unwrap();
        assert!(text.contains("\"name\": \"demo\","));
        assert!(create_setup_py(Some(&dir.path().join("missing.toml")), Some(&setup_path)).is_err());
    }
}
