use std::path::PathBuf;

use clap::{arg, command, value_parser, Command};

pub(super) fn make_command() -> Command {
    command!()
        .name("mandira")
        .args([
            arg!(--layout <FILE> "render the template inside of this layout template")
                .value_parser(value_parser!(PathBuf)),
            arg!(--"no-newline" "Do not output a trailing newline"),
            arg!(template: <TEMPLATE> "path to the template file")
                .value_parser(value_parser!(PathBuf)),
            arg!(context: <CONTEXT> "path to the JSON context file or - for stdin")
                .value_parser(value_parser!(PathBuf)),
        ])
        .about("mandira renders a mandira template against a JSON context.")
        .after_help("Set MANDIRA_LOG=debug to see why an expression rendered empty.")
}
