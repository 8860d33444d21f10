pub mod progress;
mod styling;
mod tables;

pub use styling::{bright_red, cyan, dim, magenta_bold};
pub use tables::timing_table;

/// Prints the `ciunit` banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🧪 ciunit"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("JUnit CI Report Tool")
    );
}
