//! `resolve` and `mappings`: read-only views over the column mapping file.

use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::{MappingsArgs, ResolveArgs},
    config::{ColumnMappings, DEFAULT_MAPPING_FILE},
    resolver, table,
};

fn load_mappings(path: Option<&Path>) -> Result<ColumnMappings> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_MAPPING_FILE));
    ColumnMappings::load(path).with_context(|| format!("Loading column mappings from {path:?}"))
}

pub fn resolution_rows(file_names: &[String], mappings: &ColumnMappings) -> Result<Vec<Vec<String>>> {
    file_names
        .iter()
        .map(|name| {
            let resolution = resolver::resolve(name, mappings)?;
            Ok(vec![
                name.clone(),
                resolution.keyword.to_string(),
                resolution.mapping.columns.join(","),
            ])
        })
        .collect()
}

pub fn mapping_rows(mappings: &ColumnMappings) -> Vec<Vec<String>> {
    mappings
        .iter()
        .map(|(keyword, mapping)| {
            vec![
                keyword.to_string(),
                mapping.columns.len().to_string(),
                mapping.description.clone(),
            ]
        })
        .collect()
}

pub fn execute_resolve(args: &ResolveArgs) -> Result<()> {
    let mappings = load_mappings(args.mapping.as_deref())?;
    let rows = resolution_rows(&args.files, &mappings)?;
    table::print_table(&["file", "keyword", "columns"], &rows);
    info!("Resolved {} file name(s)", rows.len());
    Ok(())
}

pub fn execute_mappings(args: &MappingsArgs) -> Result<()> {
    let mappings = load_mappings(args.mapping.as_deref())?;
    let rows = mapping_rows(&mappings);
    table::print_table(&["keyword", "columns", "description"], &rows);
    info!("Listed {} mapping(s)", rows.len());
    Ok(())
}
