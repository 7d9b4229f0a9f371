//! CLI example that flattens a directory tree into list rows
//!
//! Usage:
//!   cargo run --example fs_list [path]
//!
//! If no path is provided, uses the current directory. Directories are
//! unfolded level by level to show lazy loading driving the flat view.

use std::env;

use anyhow::Result;
use flat_model::FlatTreeModel;
use tree_source::FsSource;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let path = if args.len() > 1 { &args[1] } else { "." };

    println!("Flattening directory: {}", path);
    println!();

    let source = FsSource::new(path)?;
    let mut model = FlatTreeModel::new(source);

    // The root is the only row until something gets unfolded.
    println!("Rows after attach: {}", model.row_count());

    // Unfold the root, then every directory two levels deep. Each
    // toggle pulls the directory contents in lazily.
    model.set_expanded(0, true);
    let mut row = 0;
    while row < model.row_count() {
        let is_dir = model
            .attribute(row, "is_dir")
            .and_then(|value| value.as_bool())
            .unwrap_or(false);
        if is_dir && model.indentation(row).unwrap_or(0) < 2 {
            model.set_expanded(row, true);
        }
        row += 1;
    }

    println!("Rows after unfolding: {}", model.row_count());
    println!();

    // Render what a list widget would show: every non-hidden row,
    // indented by depth.
    for row in 0..model.row_count() {
        if model.is_hidden(row).unwrap_or(true) {
            continue;
        }
        let depth = model.indentation(row).unwrap_or(0);
        let name = model
            .attribute(row, "name")
            .and_then(|value| value.as_text().map(str::to_string))
            .unwrap_or_default();
        let marker = if model.has_children(row).unwrap_or(false) {
            let open = model.is_expanded(row).unwrap_or(false);
            if open {
                "v "
            } else {
                "> "
            }
        } else {
            "  "
        };
        let size = model
            .attribute(row, "size")
            .and_then(|value| value.as_int())
            .unwrap_or(0);
        if size > 0 {
            println!("{}{}{} ({} bytes)", "  ".repeat(depth), marker, name, size);
        } else {
            println!("{}{}{}", "  ".repeat(depth), marker, name);
        }
    }

    println!();
    println!(
        "{} rows total, {} columns",
        model.row_count(),
        model.column_count()
    );

    Ok(())
}
