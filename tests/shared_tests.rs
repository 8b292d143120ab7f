use layout_expressions::shared_tests::{
    load_context_lists, load_functions, load_invalid, run_context_test, run_folder,
    run_function_test, TestEntry,
};
use std::path::PathBuf;

fn corpus_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("shared-tests")
}

#[test]
fn function_fixtures_pass() {
    let folder = load_functions(&corpus_root()).expect("functions corpus loads");
    assert_eq!(folder.folder_name, "functions");
    let summary = run_folder(&folder, run_function_test);
    assert!(summary.failures.is_empty(), "{}", summary.report());
    assert!(summary.passed > 30, "only {} fixtures ran", summary.passed);
}

#[test]
fn invalid_fixtures_pass() {
    let folder = load_invalid(&corpus_root()).expect("invalid corpus loads");
    let summary = run_folder(&folder, run_function_test);
    assert!(summary.failures.is_empty(), "{}", summary.report());
    for test in folder.tests() {
        assert!(
            test.expects_failure.is_some(),
            "{} should expect a failure",
            test.base.name
        );
    }
}

#[test]
fn context_list_fixtures_pass() {
    let folder = load_context_lists(&corpus_root()).expect("context-lists corpus loads");
    let summary = run_folder(&folder, run_context_test);
    assert!(summary.failures.is_empty(), "{}", summary.report());
    assert_eq!(summary.total(), 6);
}

#[test]
fn folders_mirror_the_directory_tree() {
    let folder = load_context_lists(&corpus_root()).unwrap();
    let names: Vec<_> = folder.subfolders().map(|f| f.folder_name.as_str()).collect();
    assert_eq!(names, vec!["groups", "simple"]);

    let groups = folder.subfolders().next().unwrap();
    assert!(groups.content.iter().any(|e| matches!(
        e,
        TestEntry::Folder(f) if f.folder_name == "nested"
    )));
}

#[test]
fn fixture_names_carry_file_names() {
    let folder = load_invalid(&corpus_root()).unwrap();
    let names: Vec<_> = folder.tests().iter().map(|t| t.base.name.clone()).collect();
    assert!(names.contains(&"Unknown function (unknown-function.json)".to_string()));
}
