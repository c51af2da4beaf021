#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Header of a floor-plan export with 23 columns.
pub const EXPORT_HEADER: [&str; 23] = [
    "type",
    "center_x",
    "center_y",
    "center_z",
    "color",
    "content",
    "layer",
    "x",
    "y",
    "z",
    "rotation",
    "height",
    "width",
    "style",
    "handle",
    "owner",
    "linetype",
    "lineweight",
    "text_style",
    "attachment",
    "scale",
    "visible",
    "block_name",
];

pub const MAPPING_YAML: &str = r#"csv_columns_mapping:
  L1能耗计量:
    columns: [content, layer, x, y]
    description: ground floor meters
  L1M1能耗计量:
    columns: [content, x, y, z, foo]
    description: ground floor mezzanine 1
  default:
    columns: [type, color, content, layer, x, y, z]
    description: all other exports
"#;

pub const PATTERN_YAML: &str = r#"pattern_mapping:
  distribution_box:
    code: "AL\\d+"
    abbreviation: "AL"
  water_meter:
    code: "WM-\\d{2}"
"#;

/// One export row; `content` and `layer` vary, everything else is filler.
pub fn export_row(index: usize, content: &str, layer: &str) -> String {
    EXPORT_HEADER
        .iter()
        .map(|column| match *column {
            "type" => "TEXT".to_string(),
            "content" => content.to_string(),
            "layer" => layer.to_string(),
            "x" => format!("{}.5", index * 10),
            "y" => format!("{}.25", index * 3),
            "z" => "0".to_string(),
            "color" => "256".to_string(),
            other => format!("{other}_{index}"),
        })
        .collect::<Vec<_>>()
        .join(",")
}

pub fn export_csv(rows: &[(&str, &str)]) -> String {
    let mut out = EXPORT_HEADER.join(",");
    out.push('\n');
    for (idx, (content, layer)) in rows.iter().enumerate() {
        out.push_str(&export_row(idx, content, layer));
        out.push('\n');
    }
    out
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` under the workspace, creating parent directories.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        self.write_bytes(name, contents.as_bytes())
    }

    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }

    /// Writes a `config.yaml` pointing at `input/` and `output/`.
    pub fn write_config(&self, level: &str) -> PathBuf {
        self.write(
            "config.yaml",
            &format!(
                "log_level: {level}\nlog_file: ./logs/run.log\npaths:\n  input_dir: ./input\n  output_dir: ./output\n"
            ),
        )
    }

    /// Reads an output file, asserting the UTF-8 BOM and returning the text after it.
    pub fn read_output(&self, name: &str) -> String {
        let bytes = fs::read(self.path().join("output").join(name)).expect("read output");
        assert!(bytes.starts_with(b"\xEF\xBB\xBF"), "{name} lacks a byte-order mark");
        String::from_utf8(bytes[3..].to_vec()).expect("utf-8 output")
    }
}
