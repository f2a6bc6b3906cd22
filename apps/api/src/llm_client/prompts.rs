// Prompt-building utilities shared by the services that call the model.
// Each service keeps its own templates in a prompts.rs alongside it.

/// Fills `{name}` placeholders in a prompt template.
pub fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{name}}}"), value)
    })
}
