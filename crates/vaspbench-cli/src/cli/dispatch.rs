use std::path::Path;

pub(super) const PROGRAM_NAME: &str = "vaspbench";

/// Program-name aliases that select a subcommand, e.g. a `bench-runner` symlink.
pub(super) const COMMAND_ALIASES: [(&str, &str); 2] =
    [("bench-runner", "run"), ("bench-summary", "summarize")];

pub(super) fn command_alias_from_program_name(program_name: &str) -> Option<&'static str> {
    let executable_name = Path::new(program_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(program_name);
    let normalized = executable_name
        .strip_suffix(".exe")
        .unwrap_or(executable_name);

    if normalized == PROGRAM_NAME {
        return None;
    }

    COMMAND_ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, command)| *command)
}
