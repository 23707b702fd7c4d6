//! Conversion of raw backend replies into window content.

use crate::api::{DockerContainer, DockerImage, LogTail};

use super::Content;

/// Split `KEY=VALUE` strings at the first `=` and sort by key.
///
/// Entries without `=` get an empty value.
pub fn env_pairs(entries: &[String]) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = entries
        .iter()
        .map(|entry| match entry.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (entry.clone(), String::new()),
        })
        .collect();
    pairs.sort();
    pairs
}

/// Pretty-printed JSON, one line per entry.
pub fn json_lines(value: &serde_json::Value) -> Vec<String> {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|_| value.to_string())
        .lines()
        .map(str::to_string)
        .collect()
}

/// Remove ANSI escape sequences (colors, cursor movement) from `text`.
pub fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\u{1b}' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            // CSI: parameters and intermediates, then one final byte in @..~
            Some('[') => {
                chars.next();
                for c in chars.by_ref() {
                    if ('@'..='~').contains(&c) {
                        break;
                    }
                }
            }
            // OSC: terminated by BEL or ESC \
            Some(']') => {
                chars.next();
                while let Some(c) = chars.next() {
                    if c == '\u{7}' {
                        break;
                    }
                    if c == '\u{1b}' && chars.peek() == Some(&'\\') {
                        chars.next();
                        break;
                    }
                }
            }
            Some(_) => {
                chars.next();
            }
            None => {}
        }
    }
    out
}

/// Plain text split into lines with escapes removed.
pub fn text_lines(text: &str) -> Vec<String> {
    strip_ansi(text).lines().map(str::to_string).collect()
}

pub fn log_content(tail: LogTail) -> Content {
    Content::Log {
        truncated: tail.truncated,
        lines: text_lines(&tail.log),
    }
}

/// One line per image tag; untagged images are skipped.
pub fn image_tags(images: &[DockerImage]) -> Vec<String> {
    images.iter().flat_map(|image| image.repo_tags.iter().cloned()).collect()
}

pub fn container_names(containers: &[DockerContainer]) -> Vec<String> {
    containers
        .iter()
        .map(|c| c.name.trim_start_matches('/').to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_pairs_split_at_first_equals_and_sort() {
        let entries = vec![
            "PATH=/usr/bin".to_string(),
            "OPTS=-Da=b".to_string(),
            "EMPTY".to_string(),
        ];
        assert_eq!(
            env_pairs(&entries),
            vec![
                ("EMPTY".to_string(), String::new()),
                ("OPTS".to_string(), "-Da=b".to_string()),
                ("PATH".to_string(), "/usr/bin".to_string()),
            ]
        );
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\u{1b}[31mred\u{1b}[0m plain"), "red plain");
        assert_eq!(strip_ansi("\u{1b}]0;title\u{7}text"), "text");
        assert_eq!(strip_ansi("no escapes"), "no escapes");
    }

    #[test]
    fn test_log_content_keeps_truncation_flag() {
        let content = log_content(LogTail {
            truncated: true,
            log: "one\n\u{1b}[1mtwo\u{1b}[0m\n".to_string(),
        });
        assert_eq!(
            content,
            Content::Log {
                truncated: true,
                lines: vec!["one".to_string(), "two".to_string()],
            }
        );
    }

    #[test]
    fn test_listings() {
        let images = vec![
            DockerImage { repo_tags: vec!["a:1".to_string(), "a:latest".to_string()] },
            DockerImage { repo_tags: vec![] },
        ];
        assert_eq!(image_tags(&images), vec!["a:1", "a:latest"]);

        let containers = vec![DockerContainer { name: "/web".to_string() }];
        assert_eq!(container_names(&containers), vec!["web"]);
    }

    #[test]
    fn test_json_lines() {
        let lines = json_lines(&serde_json::json!({"Id": "abc"}));
        assert_eq!(lines, vec!["{", "  \"Id\": \"abc\"", "}"]);
    }
}
