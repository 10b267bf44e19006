use std::collections::BTreeSet;

use super::*;
use crate::builtins;
use crate::compile::{CompileOptions, Compiler};
use crate::tree::{NodeId, Tree};
use crate::value::Value;

fn clamped_pair() -> (Tree, NodeId) {
    let clamp = builtins::lookup("clamp").expect("clamp is a builtin");
    let mut tree = Tree::new();
    let x = tree.terminal(3);
    let lo = tree.terminal(0);
    let hi = tree.terminal(10);
    let clamped = tree.call_with(clamp, [x], [("lo", lo), ("hi", hi)]);
    let root = tree.tuple([clamped, x]);
    (tree, root)
}

fn compiled() -> (Graph, Key) {
    let (tree, root) = clamped_pair();
    Compiler::default()
        .compile(&tree, root)
        .expect("tree compiles")
}

// ── Keys ──────────────────────────────────────────────────────────

#[test]
fn test_key_display() {
    assert_eq!(Key::new(3, Some("add")).to_string(), "add-3");
    assert_eq!(Key::new(0, None).to_string(), "k0");
}

#[test]
fn test_key_order_follows_sequence() {
    let mut keys = vec![
        Key::new(2, None),
        Key::new(0, Some("z")),
        Key::new(1, Some("a")),
    ];
    keys.sort();
    let seqs: Vec<u64> = keys.iter().map(Key::seq).collect();
    assert_eq!(seqs, vec![0, 1, 2]);
}

#[test]
fn test_key_identity_ignores_label() {
    assert_eq!(Key::new(4, Some("add")), Key::new(4, None));
    assert_ne!(Key::new(4, Some("add")), Key::new(5, Some("add")));
    let set: BTreeSet<Key> = [Key::new(1, Some("a")), Key::new(1, Some("b"))]
        .into_iter()
        .collect();
    assert_eq!(set.len(), 1);
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "key allocated twice")]
fn test_reused_sequence_is_caught() {
    let mut graph = Graph::new();
    graph.insert(Key::new(0, Some("add")), Descriptor::Literal(Value::Int(1)));
    graph.insert(Key::new(0, Some("neg")), Descriptor::Literal(Value::Int(2)));
}

#[test]
fn test_allocator_counts_up() {
    let keys = KeyAllocator::new();
    assert_eq!(keys.allocate(None), Key::new(0, None));
    assert_eq!(keys.allocate(Some("f")), Key::new(1, Some("f")));

    let offset = KeyAllocator::starting_at(100);
    assert_eq!(offset.next_seq(), 100);
    assert_eq!(offset.next_seq(), 101);
}

#[test]
fn test_shared_allocator_never_repeats() {
    let keys = SharedKeyAllocator::new();
    let seqs: Vec<u64> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| (0..1000).map(|_| keys.next_seq()).collect::<Vec<_>>()))
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().expect("allocating thread panicked"))
            .collect()
    });
    let unique: BTreeSet<u64> = seqs.iter().copied().collect();
    assert_eq!(unique.len(), 4000);
}

// ── Display and validation ────────────────────────────────────────

#[test]
fn test_display_lists_entries_in_key_order() {
    let (graph, root) = compiled();
    assert_eq!(root.to_string(), "k4");
    insta::assert_snapshot!(graph.to_string(), @r"
    k0 = 3
    k1 = 10
    k2 = 0
    clamp-3 = clamp(k0, hi=k1, lo=k2)
    k4 = [clamp-3, k0]
    ");
}

#[test]
fn test_dependencies_in_operand_order() {
    let (graph, root) = compiled();
    let deps: Vec<String> = graph
        .get(&root)
        .expect("root entry")
        .dependencies()
        .iter()
        .map(|k| k.to_string())
        .collect();
    assert_eq!(deps, vec!["clamp-3", "k0"]);
}

#[test]
fn test_compiled_graph_validates() {
    let (graph, _) = compiled();
    assert_eq!(graph.validate(), Ok(()));
}

#[test]
fn test_validate_reports_dangling_key() {
    let mut graph = Graph::new();
    let a = Key::new(0, None);
    let ghost = Key::new(7, None);
    graph.insert(a.clone(), Descriptor::Tuple(vec![ghost.clone()]));
    assert_eq!(
        graph.validate(),
        Err(GraphError::Dangling {
            from: a,
            missing: ghost
        })
    );
}

#[test]
fn test_validate_reports_cycle() {
    let mut graph = Graph::new();
    let a = Key::new(0, None);
    let b = Key::new(1, None);
    graph.insert(a.clone(), Descriptor::Tuple(vec![b.clone()]));
    graph.insert(b.clone(), Descriptor::Tuple(vec![a.clone()]));
    match graph.validate() {
        Err(GraphError::Cycle { at }) => assert!(at == a || at == b),
        other => panic!("expected a cycle, got {:?}", other),
    }
}

// ── Exports ───────────────────────────────────────────────────────

#[test]
fn test_petgraph_edges_point_at_consumers() {
    let (graph, root) = compiled();
    let (pg, index) = graph.to_petgraph();
    assert_eq!(pg.node_count(), 5);
    // clamp reads three entries, the tuple two
    assert_eq!(pg.edge_count(), 5);
    let incoming = pg
        .neighbors_directed(index[&root], petgraph::Direction::Incoming)
        .count();
    assert_eq!(incoming, 2);
}

#[test]
fn test_dot_export() {
    let (graph, _) = compiled();
    let dot = graph.to_dot();
    assert!(dot.starts_with("digraph"));
    assert!(dot.contains("clamp-3"));
    assert!(dot.contains("arg0"));
    assert!(dot.contains("item1"));
    assert!(dot.contains("hi"));
}

#[test]
fn test_json_export() {
    let (graph, root) = compiled();
    let json = graph.to_json(&root).expect("graph serializes");
    let doc: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(doc["root"], "k4");
    let entries = doc["entries"].as_array().expect("entries array");
    assert_eq!(entries.len(), 5);
    assert_eq!(entries[0]["kind"], "literal");
    assert_eq!(entries[0]["value"], 3);
    assert_eq!(entries[3]["kind"], "apply");
    assert_eq!(entries[3]["target"], "<fn clamp>");
    assert_eq!(entries[3]["kwargs"][0][0], "hi");
    assert_eq!(entries[4]["kind"], "tuple");
    assert_eq!(entries[4]["items"][1], "k0");
}

// ── Fingerprints ──────────────────────────────────────────────────

#[test]
fn test_fingerprint_is_deterministic() {
    let (a, ra) = compiled();
    let (b, rb) = compiled();
    assert_eq!(a.fingerprint(&ra), b.fingerprint(&rb));
}

#[test]
fn test_fingerprint_ignores_labels_and_offsets() {
    let (tree, root) = clamped_pair();
    let (labeled, lr) = compiled();
    let (plain, pr) = Compiler::new(CompileOptions::default().with_labels(false))
        .compile_with(&tree, root, &KeyAllocator::starting_at(100))
        .expect("tree compiles");
    assert_ne!(lr, pr);
    assert_eq!(labeled.fingerprint(&lr), plain.fingerprint(&pr));
}

#[test]
fn test_fingerprint_depends_on_structure() {
    let (graph, root) = compiled();
    let clamped = graph.keys().nth(3).cloned().expect("four entries");
    assert_ne!(graph.fingerprint(&root), graph.fingerprint(&clamped));

    let mut changed = Tree::new();
    let x = changed.terminal(4);
    let (g, r) = Compiler::default().compile(&changed, x).expect("compiles");
    let mut same = Tree::new();
    let y = same.terminal(3);
    let (h, s) = Compiler::default().compile(&same, y).expect("compiles");
    assert_ne!(g.fingerprint(&r), h.fingerprint(&s));
}

#[test]
fn test_fingerprint_text_forms() {
    let (graph, root) = compiled();
    let fp = graph.fingerprint(&root);
    assert_eq!(fp.to_hex().len(), 64);
    assert_eq!(fp.to_short().len(), 8);
    assert_eq!(fp.to_string(), format!("#{}", fp.to_short()));
}

#[test]
fn test_fingerprint_short_digits() {
    assert_eq!(Fingerprint([0; 32]).to_short(), "00000000");
    assert_eq!(Fingerprint([0xff; 32]).to_short(), "zzzzzzzz");
    let mut bytes = [0; 32];
    bytes[0] = 0x08;
    assert_eq!(Fingerprint(bytes).to_short(), "10000000");
}
