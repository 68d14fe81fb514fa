// parser.rs - Recursive-descent walker: token sequence -> AST.
//
// Structure: env management -> dispatch -> sub-parsers (group, class,
// range, references, quantifier) -> optimizer rewrites -> post-pass
// validation. A single mutable ParseEnv is threaded by reference through
// every sub-parser; subroutine targets are validated after the walk since
// they may point forward.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::ast::{AssertionKind, Ast, GroupRef, NodeId, NodeInner, NodeType};
use crate::error::ParseError;
use crate::tokens::{CharacterSetKind, Flags, GroupKind, Token, TokenType};
use crate::unicode;

/// Parse-time options. `optimize` enables the structural rewrites
/// (intersection-of-one hoist, redundant-group collapse); off by default so
/// the AST retains full structural fidelity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub optimize: bool,
}

// === Parse Environment ===

struct ParseEnv<'t> {
    tokens: &'t [Token],
    current: usize,
    optimize: bool,
    /// Capturing groups in open order; index + 1 is the group number.
    capturing_groups: Vec<NodeId>,
    /// Group name -> groups carrying it, in open order. Duplicates are
    /// legal at parse time; subroutine validation rejects ambiguous calls.
    named_groups: HashMap<String, SmallVec<[NodeId; 1]>>,
    /// Subroutine nodes pending post-pass target resolution.
    subroutines: Vec<NodeId>,
    has_numbered_ref: bool,
}

impl<'t> ParseEnv<'t> {
    fn new(tokens: &'t [Token], options: ParseOptions) -> Self {
        ParseEnv {
            tokens,
            current: 0,
            optimize: options.optimize,
            capturing_groups: Vec::new(),
            named_groups: HashMap::new(),
            subroutines: Vec::new(),
            has_numbered_ref: false,
        }
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.current)
    }

    fn next(&mut self) -> Option<&'t Token> {
        let tok = self.tokens.get(self.current)?;
        self.current += 1;
        Some(tok)
    }
}

// === Entry Point ===

/// Parse a token sequence into an [`Ast`]. `flags` is carried verbatim
/// into the `Flags` node.
pub fn parse_tokens(
    tokens: &[Token],
    flags: Flags,
    options: ParseOptions,
) -> Result<Ast, ParseError> {
    let mut ast = Ast::new(flags);
    let mut env = ParseEnv::new(tokens, options);
    let pattern = ast.pattern();
    let mut alt = ast.alternatives(pattern)[0];
    while let Some(tok) = env.next() {
        if tok.token_type == TokenType::Alternator {
            alt = ast.new_alternative(pattern);
            continue;
        }
        let node = prs_element(&mut ast, &mut env, alt, tok)?;
        ast.append_element(alt, node);
    }
    validate(&ast, &env)?;
    Ok(ast)
}

// === Dispatch ===

/// Consume the sub-parse for one already-fetched token and return the node
/// it produced. `parent` is the container the node will land in; it is set
/// as the parent eagerly so ancestor checks work during nested parses.
fn prs_element(
    ast: &mut Ast,
    env: &mut ParseEnv<'_>,
    parent: NodeId,
    tok: &Token,
) -> Result<NodeId, ParseError> {
    match tok.token_type {
        TokenType::Assertion => prs_assertion(ast, parent, tok),
        TokenType::Backreference => prs_backref(ast, env, parent, tok),
        TokenType::Character => Ok(ast.new_character(parent, tok.code)),
        TokenType::CharacterClassHyphen => prs_cc_hyphen(ast, env, parent),
        TokenType::CharacterClassOpen => prs_cc(ast, env, parent, tok),
        TokenType::CharacterSet => Ok(prs_cset(ast, parent, tok)),
        TokenType::Directive => {
            Ok(ast.new_directive(parent, tok.directive_kind, tok.flag_mods.clone()))
        }
        TokenType::GroupOpen => prs_group(ast, env, parent, tok),
        TokenType::Quantifier => prs_quantifier(ast, parent, tok),
        TokenType::Subroutine => prs_subroutine(ast, env, parent, tok),
        TokenType::VariableLengthCharacterSet => {
            Ok(ast.new_variable_length_set(parent, tok.vlcs_kind))
        }
        _ => Err(ParseError::UnexpectedToken {
            raw: tok.raw.clone(),
        }),
    }
}

fn prs_assertion(ast: &mut Ast, parent: NodeId, tok: &Token) -> Result<NodeId, ParseError> {
    let (kind, negate) = match tok.raw.as_str() {
        "^" => (AssertionKind::LineStart, false),
        "$" => (AssertionKind::LineEnd, false),
        r"\A" => (AssertionKind::StringStart, false),
        r"\z" => (AssertionKind::StringEnd, false),
        r"\Z" => (AssertionKind::StringEndNewline, false),
        r"\G" => (AssertionKind::SearchStart, false),
        r"\b" => (AssertionKind::WordBoundary, false),
        r"\B" => (AssertionKind::WordBoundary, true),
        _ => {
            return Err(ParseError::UnknownKind {
                raw: tok.raw.clone(),
            })
        }
    };
    Ok(ast.new_assertion(parent, kind, negate))
}

// === Groups ===

fn prs_group(
    ast: &mut Ast,
    env: &mut ParseEnv<'_>,
    parent: NodeId,
    open: &Token,
) -> Result<NodeId, ParseError> {
    let node = match open.group_kind {
        GroupKind::Capturing => {
            let number = env.capturing_groups.len() as u32 + 1;
            let id = ast.new_capturing_group(parent, number, open.name.clone())?;
            // Register before parsing the body so nested same-named groups
            // land in source order.
            env.capturing_groups.push(id);
            if let Some(name) = &open.name {
                env.named_groups.entry(name.clone()).or_default().push(id);
            }
            id
        }
        GroupKind::Group => ast.new_group(parent, false, open.flag_mods.clone()),
        GroupKind::Atomic => ast.new_group(parent, true, None),
        GroupKind::Lookahead => ast.new_assertion(parent, AssertionKind::Lookahead, open.negate),
        GroupKind::Lookbehind => ast.new_assertion(parent, AssertionKind::Lookbehind, open.negate),
    };
    let mut alt = ast.new_alternative(node);
    loop {
        let tok = match env.next() {
            None => return Err(ParseError::UnclosedGroup),
            Some(tok) => tok,
        };
        match tok.token_type {
            TokenType::GroupClose => break,
            TokenType::Alternator => {
                alt = ast.new_alternative(node);
            }
            _ => {
                let el = prs_element(ast, env, alt, tok)?;
                ast.append_element(alt, el);
            }
        }
    }
    if env.optimize {
        Ok(collapse_redundant_group(ast, node))
    } else {
        Ok(node)
    }
}

/// A non-capturing group holding exactly one group collapses to the inner
/// group when the atomic/flag merger is lossless. Returns the surviving
/// node; the caller re-attaches it.
fn collapse_redundant_group(ast: &mut Ast, outer: NodeId) -> NodeId {
    let (atomic, flags) = match ast.node(outer).as_group() {
        Some(g) => (g.atomic, g.flags.clone()),
        None => return outer,
    };
    let alts = ast.alternatives(outer);
    if alts.len() != 1 {
        return outer;
    }
    let alt = alts[0];
    let els = ast.elements(alt);
    if els.len() != 1 {
        return outer;
    }
    let inner = els[0];
    match &ast.node(inner).inner {
        NodeInner::Group(g) => {
            // An outer flag scope cannot merge into a group that already
            // carries atomicity or its own flags.
            if flags.is_some() && (g.atomic || g.flags.is_some()) {
                return outer;
            }
        }
        NodeInner::CapturingGroup(_) => {
            // Capturing groups cannot absorb atomicity or flag scopes.
            if atomic || flags.is_some() {
                return outer;
            }
        }
        _ => return outer,
    }
    if atomic {
        if let Some(g) = ast.node_mut(inner).as_group_mut() {
            g.atomic = true;
        }
    } else if flags.is_some() {
        if let Some(g) = ast.node_mut(inner).as_group_mut() {
            g.flags = flags;
        }
    }
    ast.pop_element(alt);
    inner
}

// === Character Classes ===

/// The class body always parses into a single intersection whose inner
/// classes collect the `&&`-separated member runs. With optimization on,
/// single-member wrappers are unwrapped afterwards, folding negations by
/// XOR.
fn prs_cc(
    ast: &mut Ast,
    env: &mut ParseEnv<'_>,
    parent: NodeId,
    open: &Token,
) -> Result<NodeId, ParseError> {
    let outer = ast.new_class(parent, open.negate);
    let intersection = ast.new_intersection(outer);
    ast.append_element(outer, intersection);
    let mut base = ast.new_class(intersection, false);
    ast.push_class(intersection, base);
    loop {
        let tok = match env.next() {
            None => return Err(ParseError::UnclosedClass),
            Some(tok) => tok,
        };
        match tok.token_type {
            TokenType::CharacterClassClose => break,
            TokenType::CharacterClassIntersector => {
                base = ast.new_class(intersection, false);
                ast.push_class(intersection, base);
            }
            _ => {
                let el = prs_element(ast, env, base, tok)?;
                ast.append_element(base, el);
            }
        }
    }
    if !env.optimize {
        return Ok(outer);
    }
    // Unwrap inner bases whose only member is itself a class.
    let count = ast.classes(intersection).len();
    for i in 0..count {
        let b = ast.classes(intersection)[i];
        let only = match ast.elements(b) {
            [only] => *only,
            _ => continue,
        };
        if ast.node(only).node_type() != NodeType::CharacterClass {
            continue;
        }
        let combined = class_negate(ast, b) ^ class_negate(ast, only);
        if let Some(c) = ast.node_mut(only).as_class_mut() {
            c.negate = combined;
        }
        ast.replace_class(intersection, i, only);
    }
    // An intersection of one is no intersection at all.
    if let [inner] = ast.classes(intersection) {
        let inner = *inner;
        let combined = class_negate(ast, outer) ^ class_negate(ast, inner);
        if let Some(c) = ast.node_mut(inner).as_class_mut() {
            c.negate = combined;
        }
        ast.set_parent(inner, Some(parent));
        return Ok(inner);
    }
    Ok(outer)
}

fn class_negate(ast: &Ast, id: NodeId) -> bool {
    ast.node(id).as_class().map_or(false, |c| c.negate)
}

/// A hyphen in class context forms a range when both neighbors are range
/// material, and is a literal `-` otherwise.
fn prs_cc_hyphen(
    ast: &mut Ast,
    env: &mut ParseEnv<'_>,
    parent: NodeId,
) -> Result<NodeId, ParseError> {
    let prev = ast.elements(parent).last().copied();
    let prev_eligible = prev
        .map_or(false, |p| ast.node(p).node_type() != NodeType::CharacterClass);
    let next_eligible = env.peek().map_or(false, |t| {
        !matches!(
            t.token_type,
            TokenType::CharacterClassOpen
                | TokenType::CharacterClassClose
                | TokenType::CharacterClassIntersector
        )
    });
    let prev = match (prev, prev_eligible && next_eligible) {
        (Some(prev), true) => prev,
        _ => return Ok(ast.new_character(parent, '-' as u32)),
    };
    let rhs_tok = match env.next() {
        None => return Err(ParseError::UnclosedClass),
        Some(tok) => tok,
    };
    let rhs = prs_element(ast, env, parent, rhs_tok)?;
    let lo = ast.node(prev).as_character().map(|c| c.value);
    let hi = ast.node(rhs).as_character().map(|c| c.value);
    match (lo, hi) {
        (Some(lo), Some(hi)) => {
            ast.pop_element(parent);
            let raw = format!("{}-{}", cp_display(lo), cp_display(hi));
            ast.new_class_range(parent, prev, rhs, &raw)
        }
        _ => Err(ParseError::InvalidRange {
            raw: rhs_tok.raw.clone(),
        }),
    }
}

fn cp_display(value: u32) -> String {
    match char::from_u32(value) {
        Some(c) if !c.is_control() => c.to_string(),
        _ => format!("\\x{{{:X}}}", value),
    }
}

// === Character Sets ===

/// Property names are normalized here: recognized POSIX names demote the
/// kind to `posix`; everything else is mapped to the target flavor's
/// convention.
fn prs_cset(ast: &mut Ast, parent: NodeId, tok: &Token) -> NodeId {
    let mut kind = tok.set_kind;
    let mut property = tok.property.clone();
    if kind == CharacterSetKind::Property {
        if let Some(name) = &property {
            let normalized = unicode::normalize(name);
            if unicode::is_posix_property(&normalized) {
                kind = CharacterSetKind::Posix;
                property = Some(normalized);
            } else {
                property = Some(unicode::js_property_name(name));
            }
        }
    }
    ast.new_character_set(parent, kind, tok.negate, property)
}

// === Quantifiers ===

fn prs_quantifier(ast: &mut Ast, parent: NodeId, tok: &Token) -> Result<NodeId, ParseError> {
    let prev = match ast.pop_element(parent) {
        Some(prev) => prev,
        None => {
            return Err(ParseError::NothingToRepeat {
                raw: tok.raw.clone(),
            })
        }
    };
    if let Some(max) = tok.max {
        if max < tok.min {
            return Err(ParseError::RangeOutOfOrder {
                raw: tok.raw.clone(),
            });
        }
    }
    // Lookbehind bodies must stay fixed-length. Conservative: variable
    // top-level alternation forms Oniguruma itself accepts are rejected too.
    if tok.max != Some(tok.min) && in_lookbehind(ast, parent) {
        return Err(ParseError::VariableLookbehind {
            raw: tok.raw.clone(),
        });
    }
    ast.new_quantifier(
        parent,
        prev,
        tok.min,
        tok.max,
        tok.greedy,
        tok.possessive,
        &tok.raw,
    )
}

fn in_lookbehind(ast: &Ast, start: NodeId) -> bool {
    let mut node = start;
    loop {
        if let Some(a) = ast.node(node).as_assertion() {
            if a.kind == AssertionKind::Lookbehind {
                return true;
            }
        }
        match ast.node(node).parent {
            Some(parent) => node = parent,
            None => return false,
        }
    }
}

// === References ===

/// Sign and magnitude of a reference, per `^([-+]?)0*([1-9]\d*)$` (the
/// leading `+` only where the caller allows it). `None` when the text is
/// not a number reference at all.
fn parse_ref_number(s: &str, allow_plus: bool) -> Option<(i32, u32)> {
    let (sign, digits) = match s.as_bytes().first()? {
        b'-' => (-1, &s[1..]),
        b'+' if allow_plus => (1, &s[1..]),
        _ => (0, s),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return None;
    }
    let num = digits.parse().ok()?;
    Some((sign, num))
}

fn prs_backref(
    ast: &mut Ast,
    env: &mut ParseEnv<'_>,
    parent: NodeId,
    tok: &Token,
) -> Result<NodeId, ParseError> {
    let raw = tok.raw.as_str();
    let group_count = env.capturing_groups.len() as u32;
    let inner = raw
        .strip_prefix(r"\k<")
        .and_then(|s| s.strip_suffix('>'))
        .or_else(|| raw.strip_prefix(r"\k'").and_then(|s| s.strip_suffix('\'')));
    if let Some(inner) = inner {
        if let Some((sign, num)) = parse_ref_number(inner, false) {
            if num == 0 || num > group_count {
                return Err(ParseError::InsufficientGroups {
                    raw: raw.to_string(),
                });
            }
            let resolved = if sign < 0 { group_count + 1 - num } else { num };
            env.has_numbered_ref = true;
            Ok(ast.new_backreference(parent, GroupRef::Number(resolved)))
        } else if inner.contains('-') || inner.contains('+') {
            Err(ParseError::InvalidBackrefName {
                name: inner.to_string(),
            })
        } else if env.named_groups.contains_key(inner) {
            Ok(ast.new_backreference(parent, GroupRef::Name(inner.to_string())))
        } else {
            Err(ParseError::UndefinedGroupName {
                name: inner.to_string(),
            })
        }
    } else {
        // Bare \n form.
        let num: u32 = raw[1..].parse().map_err(|_| ParseError::InsufficientGroups {
            raw: raw.to_string(),
        })?;
        if num == 0 || num > group_count {
            return Err(ParseError::InsufficientGroups {
                raw: raw.to_string(),
            });
        }
        env.has_numbered_ref = true;
        Ok(ast.new_backreference(parent, GroupRef::Number(num)))
    }
}

/// Relative and forward-relative subroutine numbers resolve to absolute
/// numbers here, so later rewrites cannot shift them. Out-of-range results
/// are caught by the post-pass.
fn prs_subroutine(
    ast: &mut Ast,
    env: &mut ParseEnv<'_>,
    parent: NodeId,
    tok: &Token,
) -> Result<NodeId, ParseError> {
    let raw = tok.raw.as_str();
    let inner = raw
        .strip_prefix(r"\g<")
        .and_then(|s| s.strip_suffix('>'))
        .or_else(|| raw.strip_prefix(r"\g'").and_then(|s| s.strip_suffix('\'')))
        .ok_or_else(|| ParseError::UnknownKind {
            raw: raw.to_string(),
        })?;
    let group_count = env.capturing_groups.len() as i64;
    let target = match parse_ref_number(inner, true) {
        Some((sign, num)) => {
            let absolute = match sign {
                0 => num as i64,
                1 => group_count + num as i64,
                _ => group_count + 1 - num as i64,
            };
            env.has_numbered_ref = true;
            GroupRef::Number(absolute.max(0) as u32)
        }
        None => GroupRef::Name(inner.to_string()),
    };
    let id = ast.new_subroutine(parent, target);
    env.subroutines.push(id);
    Ok(id)
}

// === Post-Pass Validation ===

fn validate(ast: &Ast, env: &ParseEnv<'_>) -> Result<(), ParseError> {
    if env.has_numbered_ref && !env.named_groups.is_empty() {
        return Err(ParseError::NumericRefWithNamedCapture);
    }
    for &sub in &env.subroutines {
        let target = match ast.node(sub).as_subroutine() {
            Some(s) => &s.target,
            None => continue,
        };
        match target {
            GroupRef::Number(n) => {
                if *n < 1 || *n as usize > env.capturing_groups.len() {
                    return Err(ParseError::SubroutineGroupUndefined { number: *n });
                }
            }
            GroupRef::Name(name) => match env.named_groups.get(name) {
                None => {
                    return Err(ParseError::SubroutineNameUndefined { name: name.clone() })
                }
                Some(groups) if groups.len() > 1 => {
                    return Err(ParseError::SubroutineNameAmbiguous { name: name.clone() })
                }
                Some(_) => {}
            },
        }
    }
    Ok(())
}
