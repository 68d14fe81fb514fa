// parse_syntax.rs - Integration tests over pattern strings.
//
// Exercises the full scanner -> parser pipeline: AST shapes, reference
// resolution, optimizer rewrites (and the mergers that must not happen),
// structural invariants, and the error inventory.

mod common;

use common::*;
use oniparse::prelude::*;
use oniparse::{CharacterSetKind, DirectiveKind, VariableLengthKind};

const CORPUS: &[&str] = &[
    "",
    "abc",
    "a|b|c",
    "(a)(b(c))",
    "(?:ab)+",
    "(?>a|bb)",
    "(?=x)(?!y)",
    "(?<=ab)(?<!cd)",
    "a{2,3}?b*+",
    "[a-z0-9_]",
    "[^a-c&&[^b]]",
    "[]a-]",
    r"\d\H\s\W",
    r"\p{Lu}\p{greek}[[:alnum:]]",
    r"\R\X\K",
    "(?i)a(?m-i:b.)",
    r"(first)\1",
    r"(?<tag>x)\k<tag>",
    r"(a)\g<1>\g<-1>",
    r"^foo$|\Abar\z",
    "a(?#comment)b",
    r"\x{1F600}\uFFFF\o{17}\cJ",
];

// --- universal invariants ---

#[test]
fn parent_links_hold_across_corpus() {
    for pattern in CORPUS {
        assert_parent_links(&parse_ok(pattern), pattern);
        assert_parent_links(&parse_optimized(pattern), pattern);
    }
}

#[test]
fn capture_numbering_holds_across_corpus() {
    for pattern in CORPUS {
        assert_capture_numbering(&parse_ok(pattern), pattern);
        assert_capture_numbering(&parse_optimized(pattern), pattern);
    }
}

#[test]
fn ranges_and_quantifiers_stay_ordered() {
    for pattern in CORPUS {
        let ast = parse_ok(pattern);
        for id in walk(&ast) {
            if let Some(r) = ast[id].as_class_range() {
                let lo = ast[r.min].as_character().unwrap().value;
                let hi = ast[r.max].as_character().unwrap().value;
                assert!(lo <= hi, "reversed range in {:?}", pattern);
            }
            if let Some(q) = ast[id].as_quantifier() {
                if let Some(max) = q.max {
                    assert!(q.min <= max, "reversed quantifier in {:?}", pattern);
                }
            }
        }
    }
}

#[test]
fn numbered_backrefs_resolve_leftward() {
    let ast = parse_ok(r"(a)(b)\2\1");
    let count = walk(&ast)
        .into_iter()
        .filter(|&id| ast[id].as_capturing_group().is_some())
        .count();
    for id in walk(&ast) {
        if let Some(b) = ast[id].as_backreference() {
            match &b.target {
                GroupRef::Number(n) => assert!(*n >= 1 && *n as usize <= count),
                GroupRef::Name(_) => {}
            }
        }
    }
}

// --- re-parse idempotence ---

#[test]
fn reparse_is_structurally_identical() {
    for pattern in CORPUS {
        let first = parse_ok(pattern);
        let second = parse_ok(pattern);
        assert_eq!(first.len(), second.len(), "arena drift for {:?}", pattern);
        for id in first.ids() {
            assert_eq!(first[id], second[id], "node drift for {:?}", pattern);
        }
    }
}

#[test]
fn unoptimized_classes_keep_their_intersection_wrapper() {
    for pattern in CORPUS {
        let ast = parse_ok(pattern);
        for id in walk(&ast) {
            if ast[id].node_type() != NodeType::CharacterClass {
                continue;
            }
            let base_of_intersection = ast[id].parent.map_or(false, |p| {
                ast[p].node_type() == NodeType::CharacterClassIntersection
            });
            if !base_of_intersection {
                let els = ast.elements(id);
                assert_eq!(els.len(), 1, "unwrapped class in {:?}", pattern);
                assert_eq!(
                    ast[els[0]].node_type(),
                    NodeType::CharacterClassIntersection,
                    "unwrapped class in {:?}",
                    pattern
                );
            }
        }
    }
}

/// After one optimized parse, no rewrite opportunity may remain: a second
/// optimization pass would find nothing to do.
#[test]
fn optimization_reaches_a_fixed_point() {
    for pattern in CORPUS {
        let ast = parse_optimized(pattern);
        for id in walk(&ast) {
            match ast[id].node_type() {
                NodeType::CharacterClassIntersection => {
                    assert!(
                        ast.classes(id).len() > 1,
                        "intersection of one survived in {:?}",
                        pattern
                    );
                }
                NodeType::CharacterClass => {
                    let base_of_intersection = ast[id].parent.map_or(false, |p| {
                        ast[p].node_type() == NodeType::CharacterClassIntersection
                    });
                    if base_of_intersection {
                        if let [only] = ast.elements(id) {
                            assert_ne!(
                                ast[*only].node_type(),
                                NodeType::CharacterClass,
                                "collapsible base survived in {:?}",
                                pattern
                            );
                        }
                    }
                }
                NodeType::Group => {
                    let g = ast[id].as_group().unwrap();
                    let alts = ast.alternatives(id);
                    if alts.len() != 1 || ast.elements(alts[0]).len() != 1 {
                        continue;
                    }
                    let inner = ast.elements(alts[0])[0];
                    match ast[inner].node_type() {
                        NodeType::Group => {
                            let ig = ast[inner].as_group().unwrap();
                            assert!(
                                g.flags.is_some() && (ig.atomic || ig.flags.is_some()),
                                "collapsible group nesting survived in {:?}",
                                pattern
                            );
                        }
                        NodeType::CapturingGroup => {
                            assert!(
                                g.atomic || g.flags.is_some(),
                                "collapsible capture wrapper survived in {:?}",
                                pattern
                            );
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }
    }
}

// --- subroutines and capture references ---

#[test]
fn subroutine_after_group() {
    let ast = parse_ok(r"(a)\g<1>");
    let alt = first_alt(&ast);
    let els = ast.elements(alt);
    assert_eq!(els.len(), 2);
    let group = ast[els[0]].as_capturing_group().unwrap();
    assert_eq!(group.number, 1);
    assert!(group.name.is_none());
    let body = ast.elements(group.alternatives[0]);
    assert_eq!(body.len(), 1);
    assert_eq!(ast[body[0]].as_character().unwrap().value, 0x61);
    let sub = ast[els[1]].as_subroutine().unwrap();
    assert_eq!(sub.target, GroupRef::Number(1));
}

#[test]
fn subroutine_before_group() {
    let ast = parse_ok(r"\g<1>(a)");
    let alt = first_alt(&ast);
    let els = ast.elements(alt);
    let sub = ast[els[0]].as_subroutine().unwrap();
    assert_eq!(sub.target, GroupRef::Number(1));
    assert_eq!(ast[els[1]].as_capturing_group().unwrap().number, 1);
}

#[test]
fn relative_subroutine_resolution_is_positional() {
    // Before any group, -1 resolves below the valid range.
    assert_eq!(
        parse_err(r"\g<-1>(a)"),
        ParseError::SubroutineGroupUndefined { number: 0 }
    );
    // After the group it lands on that group.
    let ast = parse_ok(r"(a)\g<-1>");
    let alt = first_alt(&ast);
    let sub = ast[ast.elements(alt)[1]].as_subroutine().unwrap();
    assert_eq!(sub.target, GroupRef::Number(1));
}

#[test]
fn named_subroutine_requires_unique_name() {
    assert_eq!(
        parse_err(r"(?<a>)(?<a>)\g<a>"),
        ParseError::SubroutineNameAmbiguous { name: "a".into() }
    );
    let ast = parse_ok(r"(?<r>a)\g<r>");
    let alt = first_alt(&ast);
    let sub = ast[ast.elements(alt)[1]].as_subroutine().unwrap();
    assert_eq!(sub.target, GroupRef::Name("r".into()));
}

#[test]
fn named_capture_excludes_numbered_refs() {
    assert_eq!(
        parse_err(r"(?<a>)\k<1>"),
        ParseError::NumericRefWithNamedCapture
    );
}

// --- optimizer scenarios ---

#[test]
fn intersection_run_collapses_into_nested_class() {
    let ast = parse_optimized("[a-z&&[^aeiou]]");
    let alt = first_alt(&ast);
    let class = ast.elements(alt)[0];
    assert!(!ast[class].as_class().unwrap().negate);
    let intersection = ast.elements(class)[0];
    let bases = ast.classes(intersection);
    assert_eq!(bases.len(), 2);
    let first = ast[bases[0]].as_class().unwrap();
    assert_eq!(first.elements.len(), 1);
    assert_eq!(
        ast[first.elements[0]].node_type(),
        NodeType::CharacterClassRange
    );
    let second = ast[bases[1]].as_class().unwrap();
    assert!(second.negate);
    let vowels: Vec<u32> = second
        .elements
        .iter()
        .map(|&id| ast[id].as_character().unwrap().value)
        .collect();
    assert_eq!(vowels, vec![0x61, 0x65, 0x69, 0x6F, 0x75]);
}

#[test]
fn capture_wrapper_collapses_under_plain_group() {
    let ast = parse_optimized("(?:(a))");
    let alt = first_alt(&ast);
    let els = ast.elements(alt);
    assert_eq!(els.len(), 1);
    let group = ast[els[0]].as_capturing_group().unwrap();
    assert_eq!(group.number, 1);
    assert_eq!(ast[els[0]].parent, Some(alt));
}

#[test]
fn lossy_mergers_do_not_collapse() {
    // atomic outer + capturing inner
    let ast = parse_optimized("(?>(a))");
    let alt = first_alt(&ast);
    assert!(ast[ast.elements(alt)[0]].as_group().unwrap().atomic);
    // flags outer + atomic inner
    let ast = parse_optimized("(?i:(?>a))");
    let alt = first_alt(&ast);
    let outer = ast[ast.elements(alt)[0]].as_group().unwrap();
    assert!(outer.flags.is_some() && !outer.atomic);
    // flags outer + flags inner
    let ast = parse_optimized("(?i:(?m:a))");
    let alt = first_alt(&ast);
    let outer = ast[ast.elements(alt)[0]].as_group().unwrap();
    let inner = ast.elements(ast.alternatives(ast.elements(alt)[0])[0])[0];
    assert!(outer.flags.is_some());
    assert!(ast[inner].as_group().unwrap().flags.is_some());
}

#[test]
fn atomic_outer_absorbs_flagged_inner() {
    let ast = parse_optimized("(?>(?i:a))");
    let alt = first_alt(&ast);
    let group = ast[ast.elements(alt)[0]].as_group().unwrap();
    assert!(group.atomic);
    assert!(group
        .flags
        .as_ref()
        .and_then(|m| m.enable)
        .map_or(false, |f| f.ignore_case));
}

// --- lookbehind restriction ---

#[test]
fn variable_length_lookbehind_is_rejected() {
    assert_eq!(
        parse_err("(?<=a{2,3})"),
        ParseError::VariableLookbehind { raw: "{2,3}".into() }
    );
    assert!(matches!(
        parse_err("(?<=a*)"),
        ParseError::VariableLookbehind { .. }
    ));
    // Fixed-length bodies and lookaheads are unrestricted.
    assert!(parse("(?<=a{3})").is_ok());
    assert!(parse("(?=a{2,3})").is_ok());
}

// --- property-name normalization ---

#[test]
fn posix_names_demote_from_property_kind() {
    let ast = parse_ok(r"\p{Alpha}");
    let alt = first_alt(&ast);
    let set = ast[ast.elements(alt)[0]].as_character_set().unwrap();
    assert_eq!(set.kind, CharacterSetKind::Posix);
    assert_eq!(set.property.as_deref(), Some("alpha"));
}

#[test]
fn recognized_properties_take_canonical_names() {
    let ast = parse_ok(r"\p{alphabetic}\P{lowercase_letter}");
    let alt = first_alt(&ast);
    let first = ast[ast.elements(alt)[0]].as_character_set().unwrap();
    assert_eq!(first.kind, CharacterSetKind::Property);
    assert_eq!(first.property.as_deref(), Some("Alphabetic"));
    assert!(!first.negate);
    let second = ast[ast.elements(alt)[1]].as_character_set().unwrap();
    assert_eq!(second.property.as_deref(), Some("Lowercase_Letter"));
    assert!(second.negate);
}

#[test]
fn unknown_property_names_are_recased_as_scripts() {
    let ast = parse_ok(r"\p{oldPersian}");
    let alt = first_alt(&ast);
    let set = ast[ast.elements(alt)[0]].as_character_set().unwrap();
    assert_eq!(set.kind, CharacterSetKind::Property);
    assert_eq!(set.property.as_deref(), Some("Old_Persian"));
}

#[test]
fn posix_brackets_inside_classes() {
    let ast = parse_ok("[[:^space:]x]");
    let alt = first_alt(&ast);
    let class = ast.elements(alt)[0];
    let intersection = ast.elements(class)[0];
    let base = ast.classes(intersection)[0];
    let set = ast[ast.elements(base)[0]].as_character_set().unwrap();
    assert_eq!(set.kind, CharacterSetKind::Posix);
    assert_eq!(set.property.as_deref(), Some("space"));
    assert!(set.negate);
}

// --- directives and variable-length sets ---

#[test]
fn keep_and_flag_directives() {
    let ast = parse_ok(r"(?im)a\Kb");
    let alt = first_alt(&ast);
    let els = ast.elements(alt);
    let flags_dir = ast[els[0]].as_directive().unwrap();
    assert_eq!(flags_dir.kind, DirectiveKind::Flags);
    let enabled = flags_dir.flags.as_ref().unwrap().enable.unwrap();
    assert!(enabled.ignore_case && enabled.dot_all);
    let keep = ast[els[2]].as_directive().unwrap();
    assert_eq!(keep.kind, DirectiveKind::Keep);
    assert!(keep.flags.is_none());
}

#[test]
fn newline_and_grapheme_sets() {
    let ast = parse_ok(r"\R\X");
    let alt = first_alt(&ast);
    let kinds: Vec<VariableLengthKind> = ast
        .elements(alt)
        .iter()
        .map(|&id| match &ast[id].inner {
            NodeInner::VariableLengthCharacterSet(kind) => *kind,
            other => panic!("expected variable-length set, got {:?}", other),
        })
        .collect();
    assert_eq!(
        kinds,
        vec![VariableLengthKind::Newline, VariableLengthKind::Grapheme]
    );
}

// --- error inventory ---

#[test]
fn error_kinds_map_to_their_constructs() {
    assert_eq!(parse_err("(a"), ParseError::UnclosedGroup);
    assert_eq!(parse_err("[ab"), ParseError::UnclosedClass);
    assert!(matches!(parse_err("a)"), ParseError::UnexpectedToken { .. }));
    assert!(matches!(parse_err("+a"), ParseError::NothingToRepeat { .. }));
    assert!(matches!(
        parse_err("a{3,2}"),
        ParseError::RangeOutOfOrder { .. }
    ));
    assert!(matches!(
        parse_err("[z-a]"),
        ParseError::RangeOutOfOrder { .. }
    ));
    assert!(matches!(
        parse_err(r"[a-\d]"),
        ParseError::InvalidRange { .. }
    ));
    assert!(matches!(
        parse_err(r"(a)\5"),
        ParseError::InsufficientGroups { .. }
    ));
    assert!(matches!(
        parse_err(r"\k<nope>"),
        ParseError::UndefinedGroupName { .. }
    ));
    assert!(matches!(
        parse_err(r"(?<a>)(?<b>)\k<a-b>"),
        ParseError::InvalidBackrefName { .. }
    ));
    assert_eq!(
        parse_err(r"\g<9>(a)"),
        ParseError::SubroutineGroupUndefined { number: 9 }
    );
    assert!(matches!(
        parse_err(r"\g<x>"),
        ParseError::SubroutineNameUndefined { .. }
    ));
    assert!(matches!(
        parse_err("(?<1>a)"),
        ParseError::InvalidGroupName { .. }
    ));
    assert!(matches!(parse_err(r"\q"), ParseError::InvalidEscape { .. }));
    assert!(matches!(
        parse_err(r"\x{110000}"),
        ParseError::InvalidCodePoint { .. }
    ));
    assert_eq!(parse_err("(?#x"), ParseError::UnclosedComment);
    assert!(matches!(
        parse_err("(?q)"),
        ParseError::InvalidGroupOption { .. }
    ));
    assert!(matches!(
        parse_err("[[:nope:]]"),
        ParseError::InvalidPosixBracket { .. }
    ));
}

// --- quantifier variants ---

#[test]
fn quantifier_shapes() {
    let ast = parse_ok("a??b{2,}+c*");
    let alt = first_alt(&ast);
    let quants: Vec<(u32, Option<u32>, bool, bool)> = ast
        .elements(alt)
        .iter()
        .map(|&id| {
            let q = ast[id].as_quantifier().unwrap();
            (q.min, q.max, q.greedy, q.possessive)
        })
        .collect();
    assert_eq!(
        quants,
        vec![
            (0, Some(1), false, false),
            (2, None, true, true),
            (0, None, true, false),
        ]
    );
}

#[test]
fn quantifier_stacks_on_quantifier() {
    let ast = parse_ok("a+?*");
    let alt = first_alt(&ast);
    let els = ast.elements(alt);
    assert_eq!(els.len(), 1);
    let outer = ast[els[0]].as_quantifier().unwrap();
    assert_eq!((outer.min, outer.max), (0, None));
    let inner = ast[outer.element].as_quantifier().unwrap();
    assert!(!inner.greedy);
    assert_eq!(ast[outer.element].parent, Some(els[0]));
}
