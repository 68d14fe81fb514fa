// common/mod.rs - Shared helpers for the integration suites.

#![allow(dead_code)]

use oniparse::prelude::*;

pub fn parse_ok(pattern: &str) -> Ast {
    parse(pattern).unwrap_or_else(|e| panic!("parse failed for {:?}: {}", pattern, e))
}

pub fn parse_optimized(pattern: &str) -> Ast {
    ParseBuilder::new(pattern)
        .optimize(true)
        .build()
        .unwrap_or_else(|e| panic!("optimized parse failed for {:?}: {}", pattern, e))
}

pub fn parse_err(pattern: &str) -> ParseError {
    match parse(pattern) {
        Ok(_) => panic!("expected parse failure for {:?}", pattern),
        Err(e) => e,
    }
}

pub fn first_alt(ast: &Ast) -> NodeId {
    ast.alternatives(ast.pattern())[0]
}

/// Pre-order walk of the live tree (skips arena slots detached by rewrites).
pub fn walk(ast: &Ast) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![ast.root()];
    while let Some(id) = stack.pop() {
        out.push(id);
        let mut kids = ast.children(id);
        kids.reverse();
        stack.extend(kids);
    }
    out
}

/// Every reachable node's back-link must name the node whose child
/// container holds it.
pub fn assert_parent_links(ast: &Ast, pattern: &str) {
    assert_eq!(ast[ast.root()].parent, None, "root of {:?} has a parent", pattern);
    for id in walk(ast) {
        for child in ast.children(id) {
            assert_eq!(
                ast[child].parent,
                Some(id),
                "stale parent link under {:?}: {:?} not owned by {:?}",
                pattern,
                ast[child].node_type(),
                ast[id].node_type()
            );
        }
    }
}

/// Capturing groups in pre-order (= open order) must be numbered 1..=n.
pub fn assert_capture_numbering(ast: &Ast, pattern: &str) {
    let numbers: Vec<u32> = walk(ast)
        .into_iter()
        .filter_map(|id| ast[id].as_capturing_group().map(|g| g.number))
        .collect();
    let expected: Vec<u32> = (1..=numbers.len() as u32).collect();
    assert_eq!(numbers, expected, "capture numbering broken for {:?}", pattern);
}
