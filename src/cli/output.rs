use crate::dispatch::ClassifierRegistry;
use crate::{CheckResult, ClassifiedFile};
use anyhow::Result;
use colored::*;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonCheckOutput<'a> {
    files_checked: usize,
    total_errors: usize,
    files: &'a [CheckResult],
}

#[derive(Debug, Serialize)]
struct JsonClassifyOutput<'a> {
    files_classified: usize,
    files: &'a [ClassifiedFile],
}

#[derive(Debug, Serialize)]
struct JsonRule<'a> {
    extension: &'a str,
    classifier: &'a str,
    kind: Option<String>,
}

/// Single-line, shortened rendering of span text.
fn preview(text: &str, width: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    if flat.chars().count() <= width {
        flat
    } else {
        let cut: String = flat.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

pub fn print_spans(files: &[ClassifiedFile], colored_output: bool, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for file in files {
                print_text_spans(file, colored_output);
            }
        }
        OutputFormat::Json => {
            let output = JsonClassifyOutput {
                files_classified: files.len(),
                files,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn print_text_spans(file: &ClassifiedFile, colored_output: bool) {
    let header = format!("{} ({})", file.path.display(), file.classifier);

    if colored_output {
        println!("\n{}", header.bold().underline());
    } else {
        println!("\n{}", header);
    }

    for span in &file.spans {
        let range = format!("{}..{}", span.start, span.end());
        let class = span.classification.to_string();
        let text = preview(&span.text, 60);

        if colored_output {
            println!("  {:>12} {:<26} {}", range.blue().bold(), class.cyan(), text);
        } else {
            println!("  {:>12} {:<26} {}", range, class, text);
        }
    }
}

pub fn print_errors(results: &[CheckResult], colored_output: bool, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for result in results {
                print_text_errors(result, colored_output);
            }
        }
        OutputFormat::Json => {
            let output = JsonCheckOutput {
                files_checked: results.len(),
                total_errors: results.iter().map(CheckResult::error_count).sum(),
                files: results,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn print_text_errors(result: &CheckResult, colored_output: bool) {
    if result.errors.is_empty() {
        return;
    }

    let file_name = result.path.display().to_string();

    if colored_output {
        println!("\n{}", file_name.bold().underline());
    } else {
        println!("\n{}", file_name);
    }

    for error in &result.errors {
        let line_info = format!("{}:{}", error.line, error.column);

        if colored_output {
            println!(
                "  {} {} {} {}",
                line_info.blue().bold(),
                error.word.red().bold(),
                format!("[{}]", error.classification).dimmed(),
                format_context(&error.context, &error.word, colored_output)
            );

            if !error.suggestions.is_empty() {
                let suggestions = error
                    .suggestions
                    .iter()
                    .map(|s| s.green().to_string())
                    .collect::<Vec<_>>()
                    .join(&", ".dimmed().to_string());
                println!("    {} {}", "→".dimmed(), suggestions);
            }
        } else {
            println!(
                "  {} {} [{}] {}",
                line_info, error.word, error.classification, &error.context
            );

            if !error.suggestions.is_empty() {
                println!("    → {}", error.suggestions.join(", "));
            }
        }
    }
}

fn format_context(context: &str, word: &str, colored: bool) -> String {
    if colored {
        context.replace(word, &word.red().bold().to_string())
    } else {
        context.to_string()
    }
}

pub fn print_check_summary(total_errors: usize, files_checked: usize, colored: bool) {
    println!();
    let file_word = if files_checked == 1 { "file" } else { "files" };

    if total_errors == 0 {
        let message = format!("✓ No spelling errors found in {} {}", files_checked, file_word);
        if colored {
            println!("{}", message.green().bold());
        } else {
            println!("{}", message);
        }
    } else {
        let error_word = if total_errors == 1 { "error" } else { "errors" };
        if colored {
            println!(
                "{} {} {} found in {} {}",
                "✗".red().bold(),
                total_errors.to_string().red().bold(),
                error_word,
                files_checked,
                file_word
            );
        } else {
            println!(
                "✗ {} {} found in {} {}",
                total_errors, error_word, files_checked, file_word
            );
        }
    }
}

/// The extension table, one mapping per line.
pub fn print_rules(registry: &ClassifierRegistry, colored_output: bool, format: OutputFormat) -> Result<()> {
    let kind_of = |id: &str| registry.definition(id).map(|d| d.kind.to_string());

    match format {
        OutputFormat::Text => {
            for (extension, id) in registry.extensions() {
                let kind = kind_of(id).unwrap_or_else(|| "skipped".to_string());
                let extension = format!(".{}", extension);

                if colored_output {
                    println!("{:<12} {:<12} {}", extension.bold(), id.cyan(), kind.dimmed());
                } else {
                    println!("{:<12} {:<12} {}", extension, id, kind);
                }
            }
        }
        OutputFormat::Json => {
            let rules: Vec<_> = registry
                .extensions()
                .map(|(extension, classifier)| JsonRule {
                    extension,
                    classifier,
                    kind: kind_of(classifier),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rules)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("yaml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("// a\ncomment", 20), "// a comment");
        assert_eq!(preview("abcdefghij", 5), "abcd…");
    }
}
