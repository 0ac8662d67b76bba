use std::collections::HashSet;
use std::sync::Arc;

use metascope::{Config, IndexError, MetadataIndex, ResultKind, SearchFlags, SearchResult};

use crate::helpers::fixtures::{game_scenario, ranking_snapshot, three_modules};
use crate::helpers::flaky_source::FlakySource;

async fn built(snapshot: metascope::source::Snapshot) -> MetadataIndex {
    let index = MetadataIndex::new(Arc::new(FlakySource::new(snapshot)), &Config::default());
    index.build_index(None, None).await.unwrap();
    index
}

fn paths(results: &[Arc<SearchResult>]) -> Vec<&str> {
    results.iter().map(|r| r.path()).collect()
}

#[tokio::test]
async fn test_game_scenario() {
    let index = built(game_scenario()).await;

    let classes = index.search("player", SearchFlags::CLASSES, 0).unwrap();
    assert_eq!(classes.len(), 1);
    assert_eq!(classes[0].kind(), ResultKind::TypeDefinition);
    assert_eq!(classes[0].name(), "PlayerController");

    let methods = index
        .search("TakeDamage", SearchFlags::METHODS | SearchFlags::EXACT_MATCH, 0)
        .unwrap();
    assert_eq!(methods.len(), 1);
    assert_eq!(methods[0].kind(), ResultKind::Method);
    assert_eq!(methods[0].method().unwrap().name, "TakeDamage");

    assert!(index.search("zzz_none", SearchFlags::ALL, 0).unwrap().is_empty());

    let fields = index.search("health", SearchFlags::FIELDS, 1).unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].kind(), ResultKind::Field);
    assert_eq!(fields[0].path(), "Game.Core.PlayerController.health");
}

#[tokio::test]
async fn test_every_rendered_path_is_found_exactly() {
    let index = built(three_modules()).await;

    let snapshot = index.snapshot().unwrap();
    let everything: Vec<Arc<SearchResult>> = snapshot.index.records().cloned().collect();
    assert_eq!(everything.len(), index.indexed_item_count());

    for result in &everything {
        let found = index
            .search(result.path(), SearchFlags::ALL | SearchFlags::EXACT_MATCH, 0)
            .unwrap();
        assert!(
            found.iter().any(|r| r.path() == result.path()),
            "{} not found by exact search",
            result.path()
        );
    }
}

#[tokio::test]
async fn test_results_respect_kind_flags() {
    let index = built(three_modules()).await;
    let kinds = [
        SearchFlags::MODULES,
        SearchFlags::CLASSES,
        SearchFlags::METHODS,
        SearchFlags::FIELDS,
        SearchFlags::CLASSES | SearchFlags::FIELDS,
    ];

    for query in ["game", "e", "Health", "Game.Core.Enemy"] {
        for flags in kinds {
            for exact in [false, true] {
                let mut flags = flags;
                flags.set(SearchFlags::EXACT_MATCH, exact);
                for result in index.search(query, flags, 0).unwrap() {
                    assert!(flags.contains(result.kind().flag()), "{} leaked into {:?}", result, flags);
                }
            }
        }
    }
}

#[tokio::test]
async fn test_no_duplicate_paths() {
    let index = built(three_modules()).await;

    for query in ["game", "a", "Player", "health"] {
        let results = index.search(query, SearchFlags::ALL, 0).unwrap();
        let unique: HashSet<&str> = results.iter().map(|r| r.path()).collect();
        assert_eq!(unique.len(), results.len(), "duplicates for {}", query);
    }
}

#[tokio::test]
async fn test_identical_searches_are_identical() {
    let index = built(three_modules()).await;

    let first = index.search("e", SearchFlags::ALL, 0).unwrap();
    let second = index.search("e", SearchFlags::ALL, 0).unwrap();
    assert_eq!(paths(&first), paths(&second));
}

#[tokio::test]
async fn test_ranking_exact_prefix_then_length() {
    let index = built(ranking_snapshot()).await;

    let results = index.search("Get", SearchFlags::CLASSES, 0).unwrap();
    let names: Vec<&str> = results.iter().map(|r| r.name()).collect();
    assert_eq!(names, ["Get", "GetName", "WidgetGetter"]);

    let capped = index.search("Get", SearchFlags::CLASSES, 2).unwrap();
    assert_eq!(paths(&capped), ["Lib.Get", "Lib.GetName"]);
}

#[tokio::test]
async fn test_case_sensitivity() {
    let index = built(game_scenario()).await;

    assert_eq!(index.search("PLAYER", SearchFlags::CLASSES, 0).unwrap().len(), 1);
    assert!(index
        .search("PLAYER", SearchFlags::CLASSES | SearchFlags::CASE_SENSITIVE, 0)
        .unwrap()
        .is_empty());
    assert_eq!(
        index
            .search("Player", SearchFlags::CLASSES | SearchFlags::CASE_SENSITIVE, 0)
            .unwrap()
            .len(),
        1
    );

    let exact = SearchFlags::METHODS | SearchFlags::EXACT_MATCH | SearchFlags::CASE_SENSITIVE;
    assert!(index.search("takedamage", exact, 0).unwrap().is_empty());
    assert_eq!(index.search("TakeDamage", exact, 0).unwrap().len(), 1);
}

#[tokio::test]
async fn test_blank_query_and_missing_index() {
    let source = Arc::new(FlakySource::new(game_scenario()));
    let index = MetadataIndex::new(source, &Config::default());

    assert!(matches!(
        index.search("   ", SearchFlags::ALL, 0),
        Err(IndexError::NotBuilt)
    ));

    index.build_index(None, None).await.unwrap();
    assert!(index.search("", SearchFlags::ALL, 0).unwrap().is_empty());
    assert!(index.search(" \t", SearchFlags::ALL, 0).unwrap().is_empty());
}

#[tokio::test]
async fn test_unlimited_and_capped_results() {
    let index = built(three_modules()).await;

    let all = index.search("game", SearchFlags::ALL, 0).unwrap();
    assert_eq!(paths(&all), ["Game.UI", "Game.Net", "Game.Core"]);
    assert!(all.iter().all(|r| r.name().to_lowercase().contains("game")));

    let capped = index.search("game", SearchFlags::ALL, 2).unwrap();
    assert_eq!(paths(&capped), paths(&all[..2]));

    let unlimited = index.search("a", SearchFlags::ALL, 0).unwrap();
    assert!(unlimited.len() > 10);
    assert_eq!(index.search("a", SearchFlags::ALL, 10).unwrap().len(), 10);
}

#[tokio::test]
async fn test_module_and_owner_names_do_not_match_members() {
    let index = built(game_scenario()).await;

    assert!(index.find_methods_by_name("Game").unwrap().is_empty());
    assert!(index.find_fields_by_name("Core").unwrap().is_empty());
    assert!(index.find_methods_by_name("PlayerController").unwrap().is_empty());
    assert!(index
        .search("Core", SearchFlags::METHODS | SearchFlags::FIELDS | SearchFlags::EXACT_MATCH, 0)
        .unwrap()
        .is_empty());

    let by_path = index
        .search("game.core.playercontroller.takedamage", SearchFlags::ALL | SearchFlags::EXACT_MATCH, 0)
        .unwrap();
    assert_eq!(paths(&by_path), ["Game.Core.PlayerController.TakeDamage"]);
}

#[tokio::test]
async fn test_find_type_by_name_requires_own_name() {
    let index = built(game_scenario()).await;

    assert!(index.find_type_by_name("Core").unwrap().is_none());
    assert!(index.find_type_by_name("Game").unwrap().is_none());

    let by_name = index.find_type_by_name("playercontroller").unwrap().unwrap();
    assert_eq!(by_name.name(), "PlayerController");
    let by_path = index.find_type_by_name("Game.Core.PlayerController").unwrap().unwrap();
    assert_eq!(by_path.path(), by_name.path());
}

#[tokio::test]
async fn test_query_whitespace_is_ignored() {
    let index = built(game_scenario()).await;

    let exact = index
        .search("PlayerController ", SearchFlags::CLASSES | SearchFlags::EXACT_MATCH, 0)
        .unwrap();
    assert_eq!(exact.len(), 1);

    let strict = SearchFlags::METHODS | SearchFlags::EXACT_MATCH | SearchFlags::CASE_SENSITIVE;
    assert_eq!(index.search("\tTakeDamage\n", strict, 0).unwrap().len(), 1);
    assert_eq!(index.search(" player ", SearchFlags::CLASSES, 0).unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_kind_selection_matches_nothing() {
    let index = built(game_scenario()).await;
    assert!(index.search("player", SearchFlags::empty(), 0).unwrap().is_empty());
}
