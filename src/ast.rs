// ast.rs - AST node types and the arena that owns them.
//
// The tree is an append-only arena of nodes addressed by NodeId. Forward
// ownership runs through child containers (elements, alternatives, classes,
// or direct fields); `parent` is the non-owning back-link and is kept equal
// to the actual owner across every rewrite. Detached nodes stay in the
// arena but become unreachable from the root.

use smallvec::SmallVec;

use crate::error::ParseError;
use crate::tokens::{CharacterSetKind, DirectiveKind, FlagMods, Flags, VariableLengthKind};
use crate::unicode;

/// Handle to a node in an [`Ast`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Small inline storage for alternative/class lists; most groups have one
/// or two branches.
pub type ChildVec = SmallVec<[NodeId; 2]>;

// === Node Type Enum ===

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeType {
    Regexp,
    Pattern,
    Flags,
    Alternative,
    Group,
    CapturingGroup,
    Assertion,
    Character,
    CharacterSet,
    VariableLengthCharacterSet,
    CharacterClass,
    CharacterClassIntersection,
    CharacterClassRange,
    Quantifier,
    Backreference,
    Subroutine,
    Directive,
}

/// Assertion kinds, zero-width by construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssertionKind {
    LineStart,
    LineEnd,
    StringStart,
    StringEnd,
    StringEndNewline,
    SearchStart,
    WordBoundary,
    Lookahead,
    Lookbehind,
}

impl AssertionKind {
    pub fn is_lookaround(self) -> bool {
        matches!(self, AssertionKind::Lookahead | AssertionKind::Lookbehind)
    }
}

/// Target of a backreference or subroutine call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GroupRef {
    Number(u32),
    Name(String),
}

// === AST Node ===
// Outer struct for the common fields + inner enum for variant data.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub inner: NodeInner,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeInner {
    Regexp(RegexpNode),
    Pattern(PatternNode),
    Flags(Flags),
    Alternative(AlternativeNode),
    Group(GroupNode),
    CapturingGroup(CapturingGroupNode),
    Assertion(AssertionNode),
    Character(CharacterNode),
    CharacterSet(CharacterSetNode),
    VariableLengthCharacterSet(VariableLengthKind),
    CharacterClass(CharacterClassNode),
    CharacterClassIntersection(IntersectionNode),
    CharacterClassRange(ClassRangeNode),
    Quantifier(QuantifierNode),
    Backreference(BackreferenceNode),
    Subroutine(SubroutineNode),
    Directive(DirectiveNode),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegexpNode {
    pub pattern: NodeId,
    pub flags: NodeId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatternNode {
    pub alternatives: ChildVec,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlternativeNode {
    pub elements: Vec<NodeId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupNode {
    pub alternatives: ChildVec,
    pub atomic: bool,
    pub flags: Option<FlagMods>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturingGroupNode {
    pub alternatives: ChildVec,
    /// 1-based; equals 1 + the count of capturing groups opened before it.
    pub number: u32,
    pub name: Option<String>,
}

/// `alternatives` is populated for lookarounds only; `negate` is meaningful
/// for word-boundary and lookaround kinds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssertionNode {
    pub kind: AssertionKind,
    pub negate: bool,
    pub alternatives: ChildVec,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacterNode {
    /// Unicode code point. Lone surrogates from `\uHHHH` escapes are kept
    /// as-is, so this is wider than `char`.
    pub value: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacterSetNode {
    pub kind: CharacterSetKind,
    pub negate: bool,
    /// Set for `posix` (normalized) and `property` (target convention).
    pub property: Option<String>,
}

/// `elements` holds exactly one `CharacterClassIntersection` in the general
/// case, or direct elements after single-intersection simplification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacterClassNode {
    pub negate: bool,
    pub elements: Vec<NodeId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntersectionNode {
    pub classes: ChildVec,
}

/// Both ends are `Character` nodes with `min.value <= max.value`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassRangeNode {
    pub min: NodeId,
    pub max: NodeId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuantifierNode {
    pub min: u32,
    /// `None` means unbounded.
    pub max: Option<u32>,
    pub greedy: bool,
    pub possessive: bool,
    pub element: NodeId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackreferenceNode {
    pub target: GroupRef,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubroutineNode {
    pub target: GroupRef,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectiveNode {
    pub kind: DirectiveKind,
    /// Set for the `flags` kind only.
    pub flags: Option<FlagMods>,
}

// === Node Helper Methods ===

impl Node {
    pub fn node_type(&self) -> NodeType {
        match &self.inner {
            NodeInner::Regexp(_) => NodeType::Regexp,
            NodeInner::Pattern(_) => NodeType::Pattern,
            NodeInner::Flags(_) => NodeType::Flags,
            NodeInner::Alternative(_) => NodeType::Alternative,
            NodeInner::Group(_) => NodeType::Group,
            NodeInner::CapturingGroup(_) => NodeType::CapturingGroup,
            NodeInner::Assertion(_) => NodeType::Assertion,
            NodeInner::Character(_) => NodeType::Character,
            NodeInner::CharacterSet(_) => NodeType::CharacterSet,
            NodeInner::VariableLengthCharacterSet(_) => NodeType::VariableLengthCharacterSet,
            NodeInner::CharacterClass(_) => NodeType::CharacterClass,
            NodeInner::CharacterClassIntersection(_) => NodeType::CharacterClassIntersection,
            NodeInner::CharacterClassRange(_) => NodeType::CharacterClassRange,
            NodeInner::Quantifier(_) => NodeType::Quantifier,
            NodeInner::Backreference(_) => NodeType::Backreference,
            NodeInner::Subroutine(_) => NodeType::Subroutine,
            NodeInner::Directive(_) => NodeType::Directive,
        }
    }

    pub fn as_regexp(&self) -> Option<&RegexpNode> {
        match &self.inner {
            NodeInner::Regexp(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_pattern(&self) -> Option<&PatternNode> {
        match &self.inner {
            NodeInner::Pattern(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_flags(&self) -> Option<&Flags> {
        match &self.inner {
            NodeInner::Flags(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_alternative(&self) -> Option<&AlternativeNode> {
        match &self.inner {
            NodeInner::Alternative(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupNode> {
        match &self.inner {
            NodeInner::Group(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut GroupNode> {
        match &mut self.inner {
            NodeInner::Group(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_capturing_group(&self) -> Option<&CapturingGroupNode> {
        match &self.inner {
            NodeInner::CapturingGroup(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_assertion(&self) -> Option<&AssertionNode> {
        match &self.inner {
            NodeInner::Assertion(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_character(&self) -> Option<&CharacterNode> {
        match &self.inner {
            NodeInner::Character(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_character_set(&self) -> Option<&CharacterSetNode> {
        match &self.inner {
            NodeInner::CharacterSet(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&CharacterClassNode> {
        match &self.inner {
            NodeInner::CharacterClass(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_class_mut(&mut self) -> Option<&mut CharacterClassNode> {
        match &mut self.inner {
            NodeInner::CharacterClass(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_intersection(&self) -> Option<&IntersectionNode> {
        match &self.inner {
            NodeInner::CharacterClassIntersection(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_class_range(&self) -> Option<&ClassRangeNode> {
        match &self.inner {
            NodeInner::CharacterClassRange(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_quantifier(&self) -> Option<&QuantifierNode> {
        match &self.inner {
            NodeInner::Quantifier(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_backreference(&self) -> Option<&BackreferenceNode> {
        match &self.inner {
            NodeInner::Backreference(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_subroutine(&self) -> Option<&SubroutineNode> {
        match &self.inner {
            NodeInner::Subroutine(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_directive(&self) -> Option<&DirectiveNode> {
        match &self.inner {
            NodeInner::Directive(n) => Some(n),
            _ => None,
        }
    }
}

// === Arena ===

/// A parsed pattern: the node arena plus the `Regexp` root.
#[derive(Clone, Debug)]
pub struct Ast {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Ast {
    /// An arena seeded with the root `Regexp`, its `Flags` and `Pattern`
    /// children, and the initial empty `Alternative`.
    pub fn new(flags: Flags) -> Ast {
        let mut ast = Ast {
            nodes: Vec::with_capacity(16),
            root: NodeId(0),
        };
        let root = ast.push(
            None,
            NodeInner::Regexp(RegexpNode {
                pattern: NodeId(0),
                flags: NodeId(0),
            }),
        );
        let flags_id = ast.push(Some(root), NodeInner::Flags(flags));
        let pattern = ast.push(
            Some(root),
            NodeInner::Pattern(PatternNode {
                alternatives: ChildVec::new(),
            }),
        );
        if let NodeInner::Regexp(re) = &mut ast.nodes[root.index()].inner {
            re.pattern = pattern;
            re.flags = flags_id;
        }
        ast.root = root;
        ast.new_alternative(pattern);
        ast
    }

    fn push(&mut self, parent: Option<NodeId>, inner: NodeInner) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { parent, inner });
        id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The root's `Pattern` child.
    pub fn pattern(&self) -> NodeId {
        self.node(self.root)
            .as_regexp()
            .map(|re| re.pattern)
            .unwrap_or(self.root)
    }

    /// The pattern-level flags, copied out of the `Flags` node.
    pub fn flags(&self) -> Flags {
        let flags_id = self.node(self.root).as_regexp().map(|re| re.flags);
        flags_id
            .and_then(|id| self.node(id).as_flags().copied())
            .unwrap_or_default()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Total number of arena slots, including nodes detached by rewrites.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Every arena slot, including detached ones. Walk [`Ast::children`]
    /// from the root to visit only the live tree.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        self.nodes[id.index()].parent = parent;
    }

    // --- child container access ---

    /// Alternatives of a `Pattern`, `Group`, `CapturingGroup`, or lookaround.
    pub fn alternatives(&self, id: NodeId) -> &[NodeId] {
        match &self.node(id).inner {
            NodeInner::Pattern(n) => &n.alternatives,
            NodeInner::Group(n) => &n.alternatives,
            NodeInner::CapturingGroup(n) => &n.alternatives,
            NodeInner::Assertion(n) => &n.alternatives,
            _ => panic!("node has no alternatives container"),
        }
    }

    fn alternatives_mut(&mut self, id: NodeId) -> &mut ChildVec {
        match &mut self.node_mut(id).inner {
            NodeInner::Pattern(n) => &mut n.alternatives,
            NodeInner::Group(n) => &mut n.alternatives,
            NodeInner::CapturingGroup(n) => &mut n.alternatives,
            NodeInner::Assertion(n) => &mut n.alternatives,
            _ => panic!("node has no alternatives container"),
        }
    }

    /// Elements of an `Alternative` or a `CharacterClass`.
    pub fn elements(&self, id: NodeId) -> &[NodeId] {
        match &self.node(id).inner {
            NodeInner::Alternative(n) => &n.elements,
            NodeInner::CharacterClass(n) => &n.elements,
            _ => panic!("node has no elements container"),
        }
    }

    fn elements_mut(&mut self, id: NodeId) -> &mut Vec<NodeId> {
        match &mut self.node_mut(id).inner {
            NodeInner::Alternative(n) => &mut n.elements,
            NodeInner::CharacterClass(n) => &mut n.elements,
            _ => panic!("node has no elements container"),
        }
    }

    /// Append `child` to `container`'s elements and point its back-link at
    /// the container.
    pub fn append_element(&mut self, container: NodeId, child: NodeId) {
        self.elements_mut(container).push(child);
        self.set_parent(child, Some(container));
    }

    /// Detach and return the last element of `container`. The caller owns
    /// re-parenting the detached node.
    pub fn pop_element(&mut self, container: NodeId) -> Option<NodeId> {
        self.elements_mut(container).pop()
    }

    /// Inner classes of a `CharacterClassIntersection`.
    pub fn classes(&self, id: NodeId) -> &[NodeId] {
        match &self.node(id).inner {
            NodeInner::CharacterClassIntersection(n) => &n.classes,
            _ => panic!("node is not an intersection"),
        }
    }

    pub fn push_class(&mut self, intersection: NodeId, class: NodeId) {
        match &mut self.node_mut(intersection).inner {
            NodeInner::CharacterClassIntersection(n) => n.classes.push(class),
            _ => panic!("node is not an intersection"),
        }
        self.set_parent(class, Some(intersection));
    }

    /// Swap the intersection slot at `index` for `class`, updating the
    /// back-link. The displaced node is left detached.
    pub fn replace_class(&mut self, intersection: NodeId, index: usize, class: NodeId) {
        match &mut self.node_mut(intersection).inner {
            NodeInner::CharacterClassIntersection(n) => n.classes[index] = class,
            _ => panic!("node is not an intersection"),
        }
        self.set_parent(class, Some(intersection));
    }

    /// All owned children of `id`, in container order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match &self.node(id).inner {
            NodeInner::Regexp(n) => vec![n.pattern, n.flags],
            NodeInner::Pattern(n) => n.alternatives.to_vec(),
            NodeInner::Alternative(n) => n.elements.clone(),
            NodeInner::Group(n) => n.alternatives.to_vec(),
            NodeInner::CapturingGroup(n) => n.alternatives.to_vec(),
            NodeInner::Assertion(n) => n.alternatives.to_vec(),
            NodeInner::CharacterClass(n) => n.elements.clone(),
            NodeInner::CharacterClassIntersection(n) => n.classes.to_vec(),
            NodeInner::CharacterClassRange(n) => vec![n.min, n.max],
            NodeInner::Quantifier(n) => vec![n.element],
            _ => Vec::new(),
        }
    }

    // --- node constructors ---

    /// A fresh `Alternative` attached to `parent`'s alternatives.
    pub fn new_alternative(&mut self, parent: NodeId) -> NodeId {
        let alt = self.push(
            Some(parent),
            NodeInner::Alternative(AlternativeNode {
                elements: Vec::new(),
            }),
        );
        self.alternatives_mut(parent).push(alt);
        alt
    }

    pub fn new_group(&mut self, parent: NodeId, atomic: bool, flags: Option<FlagMods>) -> NodeId {
        self.push(
            Some(parent),
            NodeInner::Group(GroupNode {
                alternatives: ChildVec::new(),
                atomic,
                flags,
            }),
        )
    }

    /// Fails with `InvalidGroupName` if `name` is outside the identifier
    /// grammar accepted downstream.
    pub fn new_capturing_group(
        &mut self,
        parent: NodeId,
        number: u32,
        name: Option<String>,
    ) -> Result<NodeId, ParseError> {
        if let Some(name) = &name {
            if !unicode::is_valid_group_name(name) {
                return Err(ParseError::InvalidGroupName { name: name.clone() });
            }
        }
        Ok(self.push(
            Some(parent),
            NodeInner::CapturingGroup(CapturingGroupNode {
                alternatives: ChildVec::new(),
                number,
                name,
            }),
        ))
    }

    pub fn new_assertion(&mut self, parent: NodeId, kind: AssertionKind, negate: bool) -> NodeId {
        self.push(
            Some(parent),
            NodeInner::Assertion(AssertionNode {
                kind,
                negate,
                alternatives: ChildVec::new(),
            }),
        )
    }

    pub fn new_character(&mut self, parent: NodeId, value: u32) -> NodeId {
        self.push(Some(parent), NodeInner::Character(CharacterNode { value }))
    }

    pub fn new_character_set(
        &mut self,
        parent: NodeId,
        kind: CharacterSetKind,
        negate: bool,
        property: Option<String>,
    ) -> NodeId {
        self.push(
            Some(parent),
            NodeInner::CharacterSet(CharacterSetNode {
                kind,
                negate: negate && kind.supports_negation(),
                property,
            }),
        )
    }

    pub fn new_variable_length_set(&mut self, parent: NodeId, kind: VariableLengthKind) -> NodeId {
        self.push(Some(parent), NodeInner::VariableLengthCharacterSet(kind))
    }

    pub fn new_class(&mut self, parent: NodeId, negate: bool) -> NodeId {
        self.push(
            Some(parent),
            NodeInner::CharacterClass(CharacterClassNode {
                negate,
                elements: Vec::new(),
            }),
        )
    }

    pub fn new_intersection(&mut self, parent: NodeId) -> NodeId {
        self.push(
            Some(parent),
            NodeInner::CharacterClassIntersection(IntersectionNode {
                classes: ChildVec::new(),
            }),
        )
    }

    /// A range over two `Character` ends; fails with `RangeOutOfOrder` when
    /// `min.value > max.value`. Both ends are re-parented to the range.
    pub fn new_class_range(
        &mut self,
        parent: NodeId,
        min: NodeId,
        max: NodeId,
        raw: &str,
    ) -> Result<NodeId, ParseError> {
        let lo = self.node(min).as_character().map(|c| c.value);
        let hi = self.node(max).as_character().map(|c| c.value);
        match (lo, hi) {
            (Some(lo), Some(hi)) if lo <= hi => {}
            (Some(_), Some(_)) => {
                return Err(ParseError::RangeOutOfOrder {
                    raw: raw.to_string(),
                })
            }
            _ => {
                return Err(ParseError::InvalidRange {
                    raw: raw.to_string(),
                })
            }
        }
        let range = self.push(
            Some(parent),
            NodeInner::CharacterClassRange(ClassRangeNode { min, max }),
        );
        self.set_parent(min, Some(range));
        self.set_parent(max, Some(range));
        Ok(range)
    }

    /// Wrap `element` in a quantifier; fails with `RangeOutOfOrder` when
    /// `max < min`. The element is re-parented to the quantifier.
    #[allow(clippy::too_many_arguments)]
    pub fn new_quantifier(
        &mut self,
        parent: NodeId,
        element: NodeId,
        min: u32,
        max: Option<u32>,
        greedy: bool,
        possessive: bool,
        raw: &str,
    ) -> Result<NodeId, ParseError> {
        if let Some(max) = max {
            if max < min {
                return Err(ParseError::RangeOutOfOrder {
                    raw: raw.to_string(),
                });
            }
        }
        let quant = self.push(
            Some(parent),
            NodeInner::Quantifier(QuantifierNode {
                min,
                max,
                greedy,
                possessive,
                element,
            }),
        );
        self.set_parent(element, Some(quant));
        Ok(quant)
    }

    pub fn new_backreference(&mut self, parent: NodeId, target: GroupRef) -> NodeId {
        self.push(
            Some(parent),
            NodeInner::Backreference(BackreferenceNode { target }),
        )
    }

    pub fn new_subroutine(&mut self, parent: NodeId, target: GroupRef) -> NodeId {
        self.push(
            Some(parent),
            NodeInner::Subroutine(SubroutineNode { target }),
        )
    }

    pub fn new_directive(
        &mut self,
        parent: NodeId,
        kind: DirectiveKind,
        flags: Option<FlagMods>,
    ) -> NodeId {
        self.push(
            Some(parent),
            NodeInner::Directive(DirectiveNode { kind, flags }),
        )
    }
}

impl std::ops::Index<NodeId> for Ast {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        self.node(id)
    }
}
