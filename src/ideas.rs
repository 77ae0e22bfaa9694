use regex::Regex;
use tracing::debug;

use crate::model::IDEA_SEPARATOR;

lazy_static::lazy_static! {
    static ref ORDINAL_PREFIX: Regex = Regex::new(r"^[0-9]+\.[ \t]+").unwrap();
}

/// Turn completion text into a non-empty list of ideas.
///
/// Tried in order: a JSON array of strings, then one idea per non-blank line
/// with list numbering and wrapping quotes removed, then the whole text.
pub fn normalize_ideas(completion: &str) -> Vec<String> {
    let trimmed = completion.trim();

    if let Some(ideas) = parse_json_ideas(trimmed) {
        debug!(count = ideas.len(), "Parsed ideas from JSON array");
        return ideas;
    }

    let ideas: Vec<String> = trimmed
        .lines()
        .map(clean_line)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if ideas.is_empty() {
        debug!("Falling back to the whole completion as one idea");
        return vec![trimmed.to_string()];
    }

    debug!(count = ideas.len(), "Split ideas from plain text");
    ideas
}

fn parse_json_ideas(text: &str) -> Option<Vec<String>> {
    let ideas: Vec<String> = serde_json::from_str::<Vec<String>>(text)
        .ok()?
        .iter()
        .map(|idea| flatten_idea(idea))
        .filter(|idea| !idea.is_empty())
        .collect();
    if ideas.is_empty() {
        None
    } else {
        Some(ideas)
    }
}

/// Collapse blank lines inside one idea so it cannot be mistaken for two cards.
pub fn flatten_idea(idea: &str) -> String {
    idea.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn clean_line(line: &str) -> &str {
    let line = line.trim();
    let line = match ORDINAL_PREFIX.find(line) {
        Some(prefix) => &line[prefix.end()..],
        None => line,
    };
    strip_quotes(line).trim()
}

fn strip_quotes(line: &str) -> &str {
    for quote in ['"', '\''] {
        if line.len() >= 2 && line.starts_with(quote) && line.ends_with(quote) {
            return &line[1..line.len() - 1];
        }
    }
    line
}

/// Split one assistant turn into the idea cards a renderer shows.
pub fn split_idea_cards(content: &str) -> Vec<&str> {
    content
        .split(IDEA_SEPARATOR)
        .map(str::trim)
        .filter(|card| !card.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_array_is_used_verbatim() {
        let ideas = normalize_ideas(r#"["Idea A","Idea B"]"#);
        assert_eq!(ideas, vec!["Idea A", "Idea B"]);
    }

    #[test]
    fn test_json_array_keeps_inner_numbering() {
        let ideas = normalize_ideas(r#"  ["1. kept as is"]  "#);
        assert_eq!(ideas, vec!["1. kept as is"]);
    }

    #[test]
    fn test_numbered_lines_are_stripped() {
        let ideas = normalize_ideas("1. First idea\n2. Second idea");
        assert_eq!(ideas, vec!["First idea", "Second idea"]);
    }

    #[test]
    fn test_blank_line_separated_paragraphs() {
        let ideas = normalize_ideas("\"Quoted idea\"\n\n  'Single quoted'  \n\n\n10. Tenth idea");
        assert_eq!(ideas, vec!["Quoted idea", "Single quoted", "Tenth idea"]);
    }

    #[test]
    fn test_only_one_layer_of_quotes_is_removed() {
        let ideas = normalize_ideas("\"\"twice\"\"");
        assert_eq!(ideas, vec!["\"twice\""]);
    }

    #[test]
    fn test_ordinal_needs_a_following_space() {
        let ideas = normalize_ideas("3.14 is pi");
        assert_eq!(ideas, vec!["3.14 is pi"]);
    }

    #[test]
    fn test_single_sentence_becomes_one_idea() {
        let ideas = normalize_ideas("  Start a neighborhood tool library.  ");
        assert_eq!(ideas, vec!["Start a neighborhood tool library."]);
    }

    #[test]
    fn test_lines_that_clean_to_nothing_fall_back_to_whole_text() {
        let ideas = normalize_ideas("\"\"\n''");
        assert_eq!(ideas, vec!["\"\"\n''"]);
    }

    #[test]
    fn test_empty_json_array_is_not_an_empty_list() {
        let ideas = normalize_ideas("[]");
        assert_eq!(ideas, vec!["[]"]);
    }

    #[test]
    fn test_non_string_json_array_falls_through() {
        let ideas = normalize_ideas("[1, 2]");
        assert_eq!(ideas, vec!["[1, 2]"]);
    }

    #[test]
    fn test_json_idea_with_blank_line_stays_one_card() {
        let ideas = normalize_ideas(r#"["Part one\n\nPart two","Second"]"#);
        assert_eq!(ideas, vec!["Part one\nPart two", "Second"]);

        let content = ideas.join(IDEA_SEPARATOR);
        assert_eq!(split_idea_cards(&content), vec!["Part one\nPart two", "Second"]);
    }

    #[test]
    fn test_blank_json_ideas_fall_through() {
        let ideas = normalize_ideas(r#"["  ", "\n\n"]"#);
        assert_eq!(ideas, vec![r#"["  ", "\n\n"]"#]);
    }

    #[test]
    fn test_only_ascii_ordinals_are_stripped() {
        let ideas = normalize_ideas("\u{0661}. idea\n2. two");
        assert_eq!(ideas, vec!["\u{0661}. idea", "two"]);
    }

    #[test]
    fn test_split_idea_cards() {
        assert_eq!(split_idea_cards("A\n\nB\n\n\n\nC"), vec!["A", "B", "C"]);
        assert_eq!(split_idea_cards("only one"), vec!["only one"]);
        assert!(split_idea_cards("").is_empty());
    }
}
