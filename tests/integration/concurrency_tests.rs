use std::sync::Arc;
use std::time::Duration;

use metascope::{Config, MetadataIndex, SearchFlags};

use crate::helpers::fixtures::wide_snapshot;
use crate::helpers::flaky_source::FlakySource;

fn type_names(index: &MetadataIndex, query: &str) -> Vec<String> {
    index
        .search(query, SearchFlags::CLASSES, 0)
        .unwrap()
        .iter()
        .map(|r| r.name().to_string())
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_queries_see_old_or_new_index_during_rebuild() {
    let source = Arc::new(
        FlakySource::new(wide_snapshot("Alpha", 3, 4)).with_delay(Duration::from_millis(2)),
    );
    let index = Arc::new(MetadataIndex::new(source.clone(), &Config::default()));
    index.build_index(None, None).await.unwrap();
    let alpha = type_names(&index, "Type");
    assert_eq!(alpha.len(), 12);

    source.replace_snapshot(wide_snapshot("Beta", 3, 5));
    let handle = index.start_build(None, None).unwrap();

    let mut observed_old = 0;
    while !handle.is_finished() {
        let mut readers = Vec::new();
        for _ in 0..4 {
            let index = index.clone();
            readers.push(tokio::task::spawn_blocking(move || type_names(&index, "Type")));
        }
        for reader in readers {
            let names = reader.await.unwrap();
            let alphas = names.iter().filter(|n| n.starts_with("Alpha")).count();
            let betas = names.iter().filter(|n| n.starts_with("Beta")).count();
            assert!(
                (alphas == 12 && betas == 0) || (alphas == 0 && betas == 15),
                "mixed view: {} alpha, {} beta",
                alphas,
                betas
            );
            if alphas == 12 {
                observed_old += 1;
            }
        }
    }

    handle.wait().await.unwrap();
    assert!(observed_old > 0);
    assert_eq!(type_names(&index, "Type").len(), 15);
    assert!(type_names(&index, "Alpha").is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_source_never_sees_overlapping_calls() {
    let source = Arc::new(
        FlakySource::new(wide_snapshot("Gate", 2, 6)).with_delay(Duration::from_millis(1)),
    );
    let index = Arc::new(MetadataIndex::new(source.clone(), &Config::default()));
    index.build_index(None, None).await.unwrap();
    let types = index.type_definitions().unwrap();

    let handle = index.start_build(None, None).unwrap();
    let mut lookups = Vec::new();
    for type_def in types {
        let index = index.clone();
        lookups.push(tokio::task::spawn_blocking(move || index.type_layout(&type_def)));
    }
    for lookup in lookups {
        assert!(lookup.await.unwrap().unwrap().is_some());
    }
    handle.wait().await.unwrap();

    assert_eq!(source.max_in_flight(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_async_searches_agree() {
    let source = Arc::new(FlakySource::new(wide_snapshot("Par", 4, 25)));
    let index = Arc::new(MetadataIndex::new(source, &Config::default()));
    index.build_index(None, None).await.unwrap();

    let expected: Vec<String> = index
        .search("Type2", SearchFlags::ALL, 0)
        .unwrap()
        .iter()
        .map(|r| r.path().to_string())
        .collect();
    assert!(!expected.is_empty());

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let index = index.clone();
        tasks.push(tokio::spawn(async move {
            index
                .search_async("Type2", SearchFlags::ALL, 0)
                .await
                .unwrap()
                .iter()
                .map(|r| r.path().to_string())
                .collect::<Vec<_>>()
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), expected);
    }
}
