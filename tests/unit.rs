//! Unit tests for the file map, its tree view, and error reporting.
mod common;
use common::*;
use kestrel::error::{BundleError, GraphValidationError, GraphViolation};
use kestrel::resolver::ImportKind;
use kestrel::vfs::{FileTree, SourceFile, TreeEntry, VirtualFileMap};
use pretty_assertions::assert_eq;

#[test]
fn test_file_map_normalizes_paths() {
    let map = VirtualFileMap::new(vec![
        SourceFile::new("src/index.ts", "a"),
        SourceFile::new("./src/util/../lib.ts", "b"),
        SourceFile::new("/manifest.toml", "c"),
    ]);
    assert_eq!(
        map.paths().collect::<Vec<_>>(),
        vec!["/manifest.toml", "/src/index.ts", "/src/lib.ts"]
    );
    assert_eq!(map.get("/src/lib.ts"), Some("b"));
    assert_eq!(map.get("src/lib.ts"), None);
    assert_eq!(map.lookup("src/lib.ts"), Some("b"));
}

#[test]
fn test_later_duplicate_path_wins() {
    let map = files(&[("a.ts", "first"), ("/a.ts", "second")]);
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("/a.ts"), Some("second"));
}

#[test]
fn test_file_tree_puts_directories_first() {
    let map = files(&[
        ("zeta.ts", ""),
        ("src/b.ts", ""),
        ("src/a.ts", ""),
        ("src/cmd/ping.ts", ""),
        ("alpha.ts", ""),
    ]);
    let tree = map.tree();
    let names: Vec<&str> = tree.entries.iter().map(TreeEntry::name).collect();
    assert_eq!(names, vec!["src", "alpha.ts", "zeta.ts"]);

    match &tree.entries[0] {
        TreeEntry::Directory { path, children, .. } => {
            assert_eq!(path, "/src");
            let names: Vec<&str> = children.iter().map(TreeEntry::name).collect();
            assert_eq!(names, vec!["cmd", "a.ts", "b.ts"]);
        }
        other => panic!("expected a directory, got {other:?}"),
    }
    assert_eq!(FileTree::from_paths(map.paths()), tree);
}

#[test]
fn test_file_tree_serializes_with_type_tags() {
    let tree = files(&[("src/a.ts", "")]).tree();
    let json = serde_json::to_value(&tree).unwrap();
    assert_eq!(json["entries"][0]["type"], "directory");
    assert_eq!(json["entries"][0]["children"][0]["type"], "file");
    assert_eq!(json["entries"][0]["children"][0]["path"], "/src/a.ts");
}

#[test]
fn test_bundle_error_messages() {
    let err = BundleError::NotResolvable {
        path: "./a".to_string(),
        importer: "/index.ts".to_string(),
        kind: ImportKind::RequireCall,
    };
    assert_eq!(
        err.to_string(),
        "Could not resolve './a' imported from '/index.ts' as require-call"
    );
    let err = BundleError::EngineSyntax {
        path: "/index.ts".to_string(),
        messages: vec!["one".to_string(), "two".to_string()],
    };
    assert_eq!(err.to_string(), "Syntax error in '/index.ts': one; two");
}

#[test]
fn test_graph_violations_serialize_for_the_editor() {
    let error = GraphValidationError::new(vec![
        GraphViolation::UnreachableNode { node_id: "4".to_string() },
        GraphViolation::CyclicGraph {
            edge_id: "c".to_string(),
            source_node_id: "3".to_string(),
            target_node_id: "2".to_string(),
        },
    ]);
    let json = serde_json::to_value(&error).unwrap();
    assert_eq!(json["violations"][0]["kind"], "unreachable_node");
    assert_eq!(json["violations"][1]["edge_id"], "c");
    assert_eq!(error.violations[1].edge_id(), Some("c"));
    assert_eq!(
        error.to_string(),
        "Flow graph is invalid (2 violation(s)):\n  Node '4' is not reachable from any entry node\n  Edge 'c' from '3' to '2' closes a cycle"
    );
}
