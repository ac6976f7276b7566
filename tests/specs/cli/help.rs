//! CLI help specs

use crate::prelude::*;

#[test]
fn no_arguments_prints_help() {
    let project = Project::empty();
    project
        .rpk()
        .passes()
        .stdout_has("Usage: rpk [OPTIONS] [COMMAND]")
        .stdout_has("Repackage Dify plugins");
}

#[test]
fn help_lists_commands() {
    let project = Project::empty();
    project
        .rpk()
        .args(&["--help"])
        .passes()
        .stdout_has("run")
        .stdout_has("list")
        .stdout_has("show")
        .stdout_has("logs");
}

#[test]
fn run_help_lists_sources() {
    let project = Project::empty();
    project
        .rpk()
        .args(&["run", "--help"])
        .passes()
        .stdout_has("market")
        .stdout_has("github")
        .stdout_has("local");
}
