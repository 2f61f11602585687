use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use wikiseek::chunk::{Chunk, ChunkEntries};
use wikiseek::config::Settings;
use wikiseek::error::WikiseekError;
use wikiseek::indexer::{Indexer, build};
use wikiseek::markup::MarkupStripper;
use wikiseek::reader::ArticleReader;
use wikiseek::record::IndexRecord;
use wikiseek::search::{SearchEngine, SearchResult};
use wikiseek::storage::memory::MemoryStorage;
use wikiseek::storage::{Storage, StorageFactory};

use tempfile::tempdir;

const SAMPLE_DUMP: &str = "tests/fixtures/sample_dump.xml";

fn read_file(storage: &dyn Storage, name: &str) -> String {
    let mut contents = String::new();
    storage
        .open_input(name)
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    contents
}

fn settings_with_dump(dir: &Path, capacity: usize) -> Settings {
    fs::copy(SAMPLE_DUMP, dir.join("dump.xml")).unwrap();
    Settings {
        chunk_capacity: capacity,
        ..Settings::new(dir)
    }
}

#[test]
fn test_two_article_round_trip() {
    let dump = r#"<mediawiki>
        <page><title>Ab</title><ns>0</ns><id>2</id><revision><id>10</id><text>T1</text></revision></page>
        <page><title>Abc</title><ns>0</ns><id>8</id><revision><id>11</id><text>T2</text></revision></page>
    </mediawiki>"#;

    let settings = Settings {
        chunk_capacity: 2,
        ..Settings::default()
    };
    let chunks: Arc<dyn Storage> = Arc::new(MemoryStorage::new_default());
    let index_storage = MemoryStorage::new_default();

    let stats = Indexer::new(&settings)
        .unwrap()
        .index(dump.as_bytes(), Arc::clone(&chunks), &index_storage)
        .unwrap();
    assert_eq!(stats.chunks, 1);

    let chunk = Chunk::load(chunks.as_ref(), 0).unwrap();
    assert_eq!(chunk.len(), 2);
    assert_eq!(chunk.get("2"), Some("T1"));
    assert_eq!(chunk.get("8"), Some("T2"));

    let lines = read_file(&index_storage, &settings.index_file);
    let records: Vec<IndexRecord> = lines.lines().map(|l| l.parse().unwrap()).collect();
    assert_eq!(
        records.iter().map(|r| r.to_string()).collect::<Vec<_>>(),
        vec!["ab|0|2|none", "abc|0|8|none"]
    );

    let engine = SearchEngine::new(Arc::new(
        wikiseek::search::SortedIndex::from_unsorted(records),
    ));
    let record = match engine.search("ab") {
        SearchResult::Found(record) => record,
        other => panic!("expected a match, got {other:?}"),
    };
    assert_eq!((record.chunk_id, record.article_id.as_str()), (0, "2"));

    let reader = ArticleReader::new(chunks);
    assert_eq!(reader.read(0, "2").unwrap(), "T1");
}

#[test]
fn test_build_on_disk() {
    let dir = tempdir().unwrap();
    let settings = settings_with_dump(dir.path(), 2);

    let report = build(&settings).unwrap();
    assert_eq!(report.index.pages, 8);
    assert_eq!(report.index.articles, 5);
    assert_eq!(report.index.redirects, 1);
    assert_eq!(report.index.skipped_other_namespace, 1);
    assert_eq!(report.index.skipped_self_redirect, 1);
    assert_eq!(report.index.chunks, 3);
    assert_eq!(report.sort.records, 6);

    assert!(dir.path().join("chunks/0.chunk").exists());
    assert!(dir.path().join("chunks/2.chunk").exists());
    assert!(!dir.path().join("chunks/3.chunk").exists());

    let sorted = fs::read_to_string(dir.path().join("sorted_index.txt")).unwrap();
    assert_eq!(
        sorted,
        "donau|1|17|none\n\
         ohne text|2|19|none\n\
         stadt ulm|1|16|Ulm\n\
         ulm|0|12|none\n\
         ulm (begriffsklärung)|0|14|none\n\
         ulm-söflingen|1|15|none\n"
    );
}

#[test]
fn test_chunk_capacity_respected() {
    let dir = tempdir().unwrap();
    let settings = settings_with_dump(dir.path(), 2);
    build(&settings).unwrap();

    let chunk_storage = StorageFactory::create(settings.chunk_storage_config()).unwrap();
    for name in chunk_storage.list_files().unwrap() {
        let chunk_id: u64 = name.trim_end_matches(".chunk").parse().unwrap();
        let entries = ChunkEntries::open(chunk_storage.as_ref(), chunk_id)
            .unwrap()
            .count();
        assert!(entries <= settings.chunk_capacity, "{name} holds {entries}");
    }

    // Every non-redirect record is readable from the chunk it names.
    let engine = SearchEngine::open(&settings).unwrap();
    let reader = ArticleReader::open(&settings).unwrap();
    for record in engine.index().records() {
        if !record.is_redirect() {
            reader.read_record(record).unwrap();
        }
    }
}

#[test]
fn test_search_and_read_after_build() {
    let dir = tempdir().unwrap();
    let settings = settings_with_dump(dir.path(), 2);
    build(&settings).unwrap();

    let engine = SearchEngine::open(&settings).unwrap();
    let reader = ArticleReader::open(&settings).unwrap();

    let ulm = engine.search("Ulm");
    assert_eq!(
        ulm.record().map(|r| (r.chunk_id, r.article_id.as_str())),
        Some((0, "12"))
    );

    // Redirect resolves to the target article.
    assert_eq!(engine.search("stadt ulm"), ulm);

    // Self-redirects are never indexed.
    assert_eq!(engine.search("kreis"), SearchResult::NotFound);

    assert_eq!(
        engine.search("ohne"),
        SearchResult::Candidates(vec!["ohne text".to_string()])
    );

    let text = reader.read_record(ulm.record().unwrap()).unwrap();
    assert!(text.contains("<ref>Statistik</ref>"));
    let markup = MarkupStripper::new().unwrap();
    assert_eq!(
        markup.short_definition(&text),
        "Ulm ist eine Stadt an der Donau."
    );

    // An article without a text element has an empty body.
    assert_eq!(reader.read(2, "19").unwrap(), "");

    assert!(matches!(
        reader.read(0, "17"),
        Err(WikiseekError::ArticleNotFound { chunk_id: 0, .. })
    ));
    assert!(matches!(
        reader.read(42, "17"),
        Err(WikiseekError::ChunkUnavailable { chunk_id: 42, .. })
    ));
}

#[test]
fn test_rebuild_replaces_index() {
    let dir = tempdir().unwrap();
    let settings = settings_with_dump(dir.path(), 100);
    build(&settings).unwrap();
    let first = fs::read_to_string(dir.path().join("sorted_index.txt")).unwrap();

    build(&settings).unwrap();
    let second = fs::read_to_string(dir.path().join("sorted_index.txt")).unwrap();
    assert_eq!(first, second);

    // No temporary files are left behind.
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_truncated_dump_keeps_complete_pages() {
    let dir = tempdir().unwrap();
    let dump = fs::read_to_string(SAMPLE_DUMP).unwrap();
    let cut = dump.find("<title>Donau</title>").unwrap();
    fs::write(dir.path().join("dump.xml"), &dump[..cut]).unwrap();

    let settings = Settings::new(dir.path());
    let stats = Indexer::new(&settings).unwrap().index_dump_file().unwrap();
    assert_eq!(stats.articles, 3);
    assert_eq!(stats.redirects, 1);
}
