//! Output formatting for CLI commands.

use serde::Serialize;

use crate::cli::args::{OutputFormat, WikiseekArgs};
use crate::error::Result;
use crate::search::SearchResult;

/// Result of one title lookup.
#[derive(Debug, Serialize)]
pub struct QueryOutcome {
    pub query: String,
    pub result: SearchResult,
}

/// Result structure for search operations.
#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub results: Vec<QueryOutcome>,
    pub duration_ms: u64,
}

/// An article body, possibly reduced to plain text.
#[derive(Debug, Serialize)]
pub struct ArticleOutput {
    pub chunk_id: u64,
    pub article_id: String,
    pub text: String,
}

/// Result structure for a lookup: the search outcome and, when found, the
/// article.
#[derive(Debug, Serialize)]
pub struct LookupOutput {
    pub query: String,
    pub result: SearchResult,
    pub article: Option<ArticleOutput>,
    pub duration_ms: u64,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &WikiseekArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output search results.
pub fn output_search(output: &SearchOutput, args: &WikiseekArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => {
            for outcome in &output.results {
                print!("{}", format_outcome(&outcome.query, &outcome.result));
            }
            if args.verbosity() > 1 {
                println!("Search time: {}ms", output.duration_ms);
            }
            Ok(())
        }
        OutputFormat::Json => output_json(output, args),
    }
}

/// Output a lookup: the article text when found, the outcome otherwise.
pub fn output_lookup(output: &LookupOutput, args: &WikiseekArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => {
            match &output.article {
                Some(article) => println!("{}", article.text),
                None => print!("{}", format_outcome(&output.query, &output.result)),
            }
            if args.verbosity() > 1 {
                println!("Search time: {}ms", output.duration_ms);
            }
            Ok(())
        }
        OutputFormat::Json => output_json(output, args),
    }
}

/// Human-readable rendering of one search outcome, newline-terminated.
pub fn format_outcome(query: &str, result: &SearchResult) -> String {
    match result {
        SearchResult::Found(record) => format!(
            "{query}: {} (chunk {}, article {})\n",
            record.title, record.chunk_id, record.article_id
        ),
        SearchResult::Candidates(titles) => {
            let mut text = format!("{query}: {} candidates\n", titles.len());
            for title in titles {
                text.push_str("  ");
                text.push_str(title);
                text.push('\n');
            }
            text
        }
        SearchResult::NotFound => format!("{query}: not found\n"),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &WikiseekArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }

    let value = serde_json::to_value(result)?;
    print_value_human(&value, 0);
    Ok(())
}

/// Print nested objects as indented `key: value` lines.
fn print_value_human(value: &serde_json::Value, indent: usize) {
    let spaces = "  ".repeat(indent);

    match value {
        serde_json::Value::Object(obj) => {
            for (key, val) in obj {
                if val.is_object() {
                    println!("{spaces}{}:", format_key(key));
                    print_value_human(val, indent + 1);
                } else {
                    println!("{spaces}{}: {}", format_key(key), format_value(val));
                }
            }
        }
        _ => println!("{spaces}{}", format_value(value)),
    }
}

/// `skipped_other_namespace` -> `Skipped other namespace`.
fn format_key(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &WikiseekArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Format a JSON value for display.
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Array(arr) => {
            let formatted_values = arr.iter().map(format_value).collect::<Vec<_>>().join(", ");
            format!("[{formatted_values}]")
        }
        serde_json::Value::Object(_) => "[object]".to_string(),
        serde_json::Value::Null => "null".to_string(),
    }
}
