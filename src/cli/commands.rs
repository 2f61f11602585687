//! Command implementations for the wikiseek CLI.

use std::io::{self, BufRead, Write};
use std::time::Instant;

use log::info;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::Settings;
use crate::error::Result;
use crate::indexer::{Indexer, build};
use crate::markup::MarkupStripper;
use crate::reader::ArticleReader;
use crate::search::{SearchEngine, SearchResult};
use crate::sorter::IndexSorter;
use crate::storage::StorageFactory;

/// Words that end the interactive shell.
const SHELL_EXIT: &[&str] = &["quit", "exit"];

/// Execute a CLI command.
pub fn execute_command(args: WikiseekArgs) -> Result<()> {
    let settings = args.settings()?;

    match &args.command {
        Command::Build(index_args) => build_all(index_args, settings, &args),
        Command::Index(index_args) => index_dump(index_args, settings, &args),
        Command::Sort => sort_index(&settings, &args),
        Command::Search(search_args) => search_titles(search_args, settings, &args),
        Command::Read(read_args) => read_article(read_args, &settings, &args),
        Command::Lookup(lookup_args) => lookup_article(lookup_args, &settings, &args),
        Command::Shell(shell_args) => run_shell(shell_args, &settings),
    }
}

/// Index a dump and sort the result.
fn build_all(
    index_args: &IndexArgs,
    mut settings: Settings,
    cli_args: &WikiseekArgs,
) -> Result<()> {
    index_args.apply(&mut settings)?;
    if cli_args.verbosity() > 1 {
        println!("Building index from: {}", settings.dump_path().display());
    }

    let report = build(&settings)?;
    output_result("Build complete", &report, cli_args)
}

/// Index a dump without sorting.
fn index_dump(
    index_args: &IndexArgs,
    mut settings: Settings,
    cli_args: &WikiseekArgs,
) -> Result<()> {
    index_args.apply(&mut settings)?;

    let stats = Indexer::new(&settings)?.index_dump_file()?;
    output_result("Indexing complete", &stats, cli_args)
}

/// Sort the unsorted index into the sorted index.
fn sort_index(settings: &Settings, cli_args: &WikiseekArgs) -> Result<()> {
    settings.validate()?;
    let storage = StorageFactory::create(settings.index_storage_config())?;

    let stats = IndexSorter::new(storage)
        .sort_file(&settings.index_file, &settings.sorted_index_file)?;
    output_result("Sorting complete", &stats, cli_args)
}

/// Look up one or more titles.
fn search_titles(
    search_args: &SearchArgs,
    mut settings: Settings,
    cli_args: &WikiseekArgs,
) -> Result<()> {
    if let Some(prefix_match) = search_args.prefix_match {
        settings.prefix_match = prefix_match.into();
    }
    if let Some(depth) = search_args.max_redirect_depth {
        settings.max_redirect_depth = depth;
    }

    let engine = SearchEngine::open(&settings)?;

    let start_time = Instant::now();
    let results = engine.search_many(&search_args.queries);
    let duration = start_time.elapsed();

    let output = SearchOutput {
        results: search_args
            .queries
            .iter()
            .cloned()
            .zip(results)
            .map(|(query, result)| QueryOutcome { query, result })
            .collect(),
        duration_ms: duration.as_millis() as u64,
    };
    output_search(&output, cli_args)
}

/// Print the raw text of one article.
fn read_article(read_args: &ReadArgs, settings: &Settings, cli_args: &WikiseekArgs) -> Result<()> {
    let reader = ArticleReader::open(settings)?;
    let text = reader.read(read_args.chunk_id, &read_args.article_id)?;

    match cli_args.output_format {
        OutputFormat::Human => {
            println!("{text}");
            Ok(())
        }
        OutputFormat::Json => output_result(
            "Article",
            &ArticleOutput {
                chunk_id: read_args.chunk_id,
                article_id: read_args.article_id.clone(),
                text,
            },
            cli_args,
        ),
    }
}

/// How article text is presented by `lookup` and `shell`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMode {
    Raw,
    Plain,
    Short,
}

/// Search `query` and fetch the article when found.
pub fn lookup(
    engine: &SearchEngine,
    reader: &ArticleReader,
    markup: &MarkupStripper,
    query: &str,
    mode: TextMode,
) -> Result<LookupOutput> {
    let start_time = Instant::now();
    let result = engine.search(query);

    let article = match &result {
        SearchResult::Found(record) => {
            let raw = reader.read_record(record)?;
            let text = match mode {
                TextMode::Raw => raw,
                TextMode::Plain => markup.strip(&raw).trim().to_string(),
                TextMode::Short => markup.short_definition(&raw),
            };
            Some(ArticleOutput {
                chunk_id: record.chunk_id,
                article_id: record.article_id.clone(),
                text,
            })
        }
        SearchResult::Candidates(_) | SearchResult::NotFound => None,
    };

    Ok(LookupOutput {
        query: query.to_string(),
        result,
        article,
        duration_ms: start_time.elapsed().as_millis() as u64,
    })
}

/// Look up a title and print its article.
fn lookup_article(
    lookup_args: &LookupArgs,
    settings: &Settings,
    cli_args: &WikiseekArgs,
) -> Result<()> {
    let engine = SearchEngine::open(settings)?;
    let reader = ArticleReader::open(settings)?;
    let markup = MarkupStripper::new()?;

    let mode = if lookup_args.raw {
        TextMode::Raw
    } else if lookup_args.short {
        TextMode::Short
    } else {
        TextMode::Plain
    };

    let output = lookup(&engine, &reader, &markup, &lookup_args.query, mode)?;
    output_lookup(&output, cli_args)
}

/// Interactive lookup loop over stdin.
fn run_shell(shell_args: &ShellArgs, settings: &Settings) -> Result<()> {
    let engine = SearchEngine::open(settings)?;
    let reader = ArticleReader::open(settings)?;
    info!("loaded {} index records", engine.index().len());

    let mode = if shell_args.short {
        TextMode::Short
    } else {
        TextMode::Plain
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    shell_loop(&engine, &reader, mode, stdin.lock(), stdout.lock())
}

/// Read queries from `input` until an exit word or end of input, writing
/// answers to `output`.
pub fn shell_loop<R: BufRead, W: Write>(
    engine: &SearchEngine,
    reader: &ArticleReader,
    mode: TextMode,
    input: R,
    mut output: W,
) -> Result<()> {
    let markup = MarkupStripper::new()?;
    let mut lines = input.lines();

    loop {
        write!(output, "query> ")?;
        output.flush()?;

        let Some(line) = lines.next() else {
            writeln!(output)?;
            return Ok(());
        };
        let query = line?;
        let query = query.trim();

        if SHELL_EXIT.iter().any(|word| query.eq_ignore_ascii_case(word)) {
            return Ok(());
        }
        if query.is_empty() {
            continue;
        }

        let start_time = Instant::now();
        match lookup(engine, reader, &markup, query, mode) {
            Ok(LookupOutput {
                article: Some(article),
                ..
            }) => writeln!(output, "{}", article.text)?,
            Ok(outcome) => write!(output, "{}", format_outcome(query, &outcome.result))?,
            Err(e) => writeln!(output, "Error: {e}")?,
        }
        writeln!(output, "({:.3}s)", start_time.elapsed().as_secs_f64())?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkWriter;
    use crate::record::IndexRecord;
    use crate::search::SortedIndex;
    use crate::storage::Storage;
    use crate::storage::memory::MemoryStorage;
    use std::sync::Arc;

    fn fixture() -> (SearchEngine, ArticleReader) {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new_default());
        let mut writer = ChunkWriter::new(Arc::clone(&storage), 10).unwrap();
        writer
            .append("5", "{{Infobox}}\n'''C''' is a [[letter]].\n\nMore text.")
            .unwrap();
        writer.finish().unwrap();

        let index = SortedIndex::from_unsorted(vec![
            IndexRecord::new("c", 0, "5", None),
            IndexRecord::new("d", 0, "6", Some("C".to_string())),
            IndexRecord::new("e-1", 0, "7", None),
            IndexRecord::new("e-2", 0, "8", None),
        ]);

        (
            SearchEngine::new(Arc::new(index)),
            ArticleReader::new(storage),
        )
    }

    #[test]
    fn test_lookup_modes() {
        let (engine, reader) = fixture();
        let markup = MarkupStripper::new().unwrap();

        let short = lookup(&engine, &reader, &markup, "D", TextMode::Short).unwrap();
        assert_eq!(short.article.unwrap().text, "C is a letter.");

        let raw = lookup(&engine, &reader, &markup, "c", TextMode::Raw).unwrap();
        assert!(raw.article.unwrap().text.starts_with("{{Infobox}}"));

        let missing = lookup(&engine, &reader, &markup, "zzz", TextMode::Plain).unwrap();
        assert_eq!(missing.result, SearchResult::NotFound);
        assert!(missing.article.is_none());
    }

    #[test]
    fn test_lookup_missing_chunk_is_an_error() {
        let (_, reader) = fixture();
        let engine = SearchEngine::new(Arc::new(SortedIndex::from_unsorted(vec![
            IndexRecord::new("x", 3, "1", None),
        ])));
        let markup = MarkupStripper::new().unwrap();
        assert!(lookup(&engine, &reader, &markup, "x", TextMode::Plain).is_err());
    }

    #[test]
    fn test_shell_loop() {
        let (engine, reader) = fixture();
        let input = "c\n\ne\nQUIT\nd\n";
        let mut output = Vec::new();

        shell_loop(&engine, &reader, TextMode::Short, input.as_bytes(), &mut output).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("C is a letter."));
        assert!(output.contains("e: 2 candidates\n  e-1\n  e-2\n"));
        // Nothing after the exit word is answered.
        assert_eq!(output.matches("C is a letter.").count(), 1);
    }

    #[test]
    fn test_shell_loop_stops_at_end_of_input() {
        let (engine, reader) = fixture();
        let mut output = Vec::new();
        shell_loop(&engine, &reader, TextMode::Plain, "zzz".as_bytes(), &mut output).unwrap();
        assert!(String::from_utf8(output).unwrap().contains("zzz: not found"));
    }
}
