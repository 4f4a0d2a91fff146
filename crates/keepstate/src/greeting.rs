//! What the greeting shows for a given name.

/// Render the greeting line.
pub fn render(name: &str) -> String {
    if name.is_empty() {
        "Please type your name".to_string()
    } else {
        format!("Hello {name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greets_name() {
        assert_eq!(render("Kara"), "Hello Kara");
    }

    #[test]
    fn test_prompts_when_empty() {
        assert_eq!(render(""), "Please type your name");
    }
}
