use shared::domain::SortField;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// Full current contents of the search box.
    Search(String),
    Sort(SortField),
    Toggle,
    Quit,
    Invalid(String),
}

pub fn parse_line(line: &str) -> InputCommand {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(command) = line.strip_prefix('/') else {
        return InputCommand::Search(line.to_string());
    };

    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("sort"), Some(field), None) => match field.parse::<SortField>() {
            Ok(field) => InputCommand::Sort(field),
            Err(err) => InputCommand::Invalid(err.to_string()),
        },
        (Some("toggle"), None, None) => InputCommand::Toggle,
        (Some("quit"), None, None) => InputCommand::Quit,
        _ => InputCommand::Invalid(format!("unknown command '{line}'")),
    }
}
