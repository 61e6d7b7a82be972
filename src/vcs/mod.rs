//! Source control helpers and version header generation.
//!
//! Both Perforce and git headers share the same layout: a banner, an include
//! guard derived from the output file name and one `#define` per piece of
//! metadata. The file is only rewritten when its content changes so build
//! tools watching timestamps don't rebuild needlessly.

pub mod git;
pub mod perforce;

use crate::fileutils::save_text_file_if_newer;
use colored::*;
use std::path::Path;

/// Status returned when the source control tool isn't installed.
pub const TOOL_NOT_FOUND: i32 = 10;

/// Status returned when the header couldn't be written.
pub const WRITE_ERROR: i32 = 2;

/// `__NAME_H__` style guard for a header file name.
pub fn create_header_guard(filename: &Path) -> String {
    let base = filename
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
        .to_uppercase()
        .replace([' ', '.'], "_");
    format!("__{}__", base)
}

/// Full text of a generated header, one entry per line.
pub fn render_header(generator: &str, guard: &str, defines: &[String]) -> Vec<String> {
    let mut output = vec![
        "/***************************************".to_string(),
        String::new(),
        "\tThis file was generated by a call to".to_string(),
        format!("\t{}() from", generator),
        "\tthe burger crate".to_string(),
        String::new(),
        "***************************************/".to_string(),
        String::new(),
        format!("#ifndef {}", guard),
        format!("#define {}", guard),
        String::new(),
    ];
    output.extend(defines.iter().cloned());
    output.push(String::new());
    output.push("#endif".to_string());
    output
}

/// Write the header if it changed. Returns `0` or [`WRITE_ERROR`].
pub fn write_header(output_file: &Path, generator: &str, defines: &[String], verbose: bool) -> i32 {
    let lines = render_header(generator, &create_header_guard(output_file), defines);
    match save_text_file_if_newer(output_file, &lines, None, false, verbose) {
        Ok(_) => 0,
        Err(e) => {
            eprintln!("{} {}: {}", "x".red(), output_file.display(), e);
            WRITE_ERROR
        }
    }
}
