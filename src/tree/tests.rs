use super::*;
use crate::builtins;
use crate::exec::ExecError;

fn add() -> Function {
    builtins::lookup("add").expect("add is a builtin")
}

fn shared_sum() -> (Tree, NodeId) {
    let add = add();
    let mut tree = Tree::new();
    let one = tree.terminal(1);
    let two = tree.terminal(2);
    let inner = tree.call(add.clone(), [one, two]);
    let outer = tree.call(add, [inner, inner]);
    (tree, outer)
}

#[test]
fn test_builders_assign_sequential_ids() {
    let (tree, root) = shared_sum();
    assert_eq!(tree.len(), 4);
    assert_eq!(root.index(), 3);
    assert_eq!(root.to_string(), "%3");
    assert_eq!(tree.get(root).map(Node::kind), Some(NodeKind::Invocation));
    let kinds: Vec<NodeKind> = tree.iter().map(|(_, node)| node.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::Terminal,
            NodeKind::Terminal,
            NodeKind::Invocation,
            NodeKind::Invocation
        ]
    );
}

#[test]
#[should_panic(expected = "not in this tree")]
fn test_push_rejects_unknown_child() {
    let (big, root) = shared_sum();
    assert_eq!(big.len(), 4);
    let mut tree = Tree::new();
    tree.tuple([root]);
}

#[test]
#[should_panic(expected = "not in this tree")]
fn test_push_checks_overridden_keywords() {
    let (big, root) = shared_sum();
    assert_eq!(big.len(), 4);
    let mut tree = Tree::new();
    let x = tree.terminal(1);
    tree.call_with(add(), [x], [("k", root), ("k", x)]);
}

#[test]
fn test_equal_values_are_distinct_nodes() {
    let mut tree = Tree::new();
    let a = tree.terminal(1);
    let b = tree.terminal(1);
    assert_ne!(a, b);
    assert_eq!(tree.get(a), tree.get(b));
}

#[test]
fn test_keywords_sorted_last_binding_wins() {
    let mut tree = Tree::new();
    let x = tree.terminal(0);
    let a = tree.terminal(1);
    let b = tree.terminal(2);
    let c = tree.terminal(3);
    let f = builtins::lookup("clamp").expect("clamp is a builtin");
    let call = tree.call_with(f, [x], [("lo", a), ("hi", b), ("lo", c)]);
    let Some(Node::Invocation(inv)) = tree.get(call) else {
        panic!("expected an invocation");
    };
    assert_eq!(inv.keywords(), vec![("hi", b), ("lo", c)]);
    assert_eq!(tree.get(call).map(Node::children), Some(vec![x, b, c]));
}

#[test]
fn test_children_order_callee_args_keywords() {
    let mut tree = Tree::new();
    let f = tree.terminal(add());
    let x = tree.terminal(1);
    let y = tree.terminal(2);
    let call = tree.call_with(f, [x], [("z", y)]);
    assert_eq!(tree.get(call).map(Node::children), Some(vec![f, x, y]));
}

#[test]
fn test_reachable_and_occurrences() {
    let (tree, root) = shared_sum();
    assert_eq!(tree.reachable(root), 4);
    // outer + inner twice, each with two terminals
    assert_eq!(tree.occurrences(root), 7);

    let mut tree = tree;
    let orphan = tree.terminal(9);
    assert_eq!(tree.reachable(root), 4);
    assert_eq!(tree.reachable(orphan), 1);
}

#[test]
fn test_occurrences_saturate() {
    let add = add();
    let mut tree = Tree::new();
    let mut x = tree.terminal(1);
    for _ in 0..80 {
        x = tree.call(add.clone(), [x, x]);
    }
    assert_eq!(tree.reachable(x), 81);
    assert_eq!(tree.occurrences(x), u64::MAX);
}

#[test]
fn test_eval_shared_sum() {
    let (tree, root) = shared_sum();
    assert_eq!(tree.eval(root), Ok(Value::Int(6)));
}

#[test]
fn test_eval_keywords_and_tuples() {
    let mut tree = Tree::new();
    let x = tree.terminal(15);
    let lo = tree.terminal(0);
    let hi = tree.terminal(10);
    let clamp = builtins::lookup("clamp").expect("clamp is a builtin");
    let clamped = tree.call_with(clamp, [x], [("hi", hi), ("lo", lo)]);
    let pair = tree.tuple([clamped, x]);
    assert_eq!(
        tree.eval(pair),
        Ok(Value::List(vec![Value::Int(10), Value::Int(15)]))
    );
}

#[test]
fn test_eval_node_callee() {
    let mut tree = Tree::new();
    let f = tree.terminal(add());
    let x = tree.terminal(4);
    let call = tree.call(f, [x, x]);
    assert_eq!(tree.eval(call), Ok(Value::Int(8)));

    let not_a_function = tree.terminal("add");
    let bad = tree.call(not_a_function, [x]);
    assert_eq!(tree.eval(bad), Err(ExecError::NotCallable { found: "str" }));
}

#[test]
fn test_eval_unknown_root() {
    let (big, root) = shared_sum();
    assert_eq!(big.len(), 4);
    let tree = Tree::new();
    assert_eq!(tree.eval(root), Err(ExecError::MissingNode(root)));
    assert_eq!(tree.reachable(root), 0);
    assert_eq!(tree.occurrences(root), 0);
}
