//! `worktable columns`: show what a template will render.

use crate::config::GlobalConfig;
use crate::document::Sheet;
use crate::table::{ColumnSpec, parse_columns};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

/// List the columns of a template with their flags and referenced attributes.
#[derive(Args, Debug, Default)]
pub struct ColumnsCommand {
    /// Template document; defaults to `template` from the config file
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

impl ColumnsCommand {
    /// Run the command.
    ///
    /// # Errors
    ///
    /// Fails when the config file or the template cannot be read.
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let path = match self.template {
            Some(path) => path,
            None => GlobalConfig::load_with_optional(config_path).await?.template_path()?,
        };
        let sheet = Sheet::load_template(&path).await?;
        let columns = parse_columns(&sheet);

        if self.json {
            let items: Vec<serde_json::Value> = columns.iter().map(column_json).collect();
            println!("{}", serde_json::to_string_pretty(&items)?);
            return Ok(());
        }

        println!("{}", path.display().to_string().bold());
        if columns.is_empty() {
            println!("No column labels in row 1.");
            return Ok(());
        }
        for column in &columns {
            print_column(column);
        }
        println!();
        println!("{}: {} columns", "Total".green().bold(), columns.len());
        Ok(())
    }
}

fn kind_label(column: &ColumnSpec) -> &'static str {
    if column.is_mergeable() {
        "merge"
    } else if column.is_renderable() {
        "template"
    } else {
        "literal"
    }
}

fn print_column(column: &ColumnSpec) {
    println!(
        "{:>3}  {:<20} {:<8} {}",
        column.position(),
        column.header_label().cyan(),
        kind_label(column),
        column.body_spec().bright_black()
    );
}

fn column_json(column: &ColumnSpec) -> serde_json::Value {
    let references: Vec<String> = column
        .references()
        .map(|reference| format!("{}.{}", reference.root, reference.attribute))
        .collect();
    serde_json::json!({
        "position": column.position(),
        "label": column.header_label(),
        "body": column.body_spec(),
        "kind": kind_label(column),
        "references": references,
    })
}
