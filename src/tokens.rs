// tokens.rs - Token types produced by the scanner and consumed by the parser.
//
// A token is a flat struct: fields beyond `token_type` and `raw` are only
// meaningful for the matching token type. Kind enumerations shared with the
// AST live here so scanner and parser cannot drift apart.

/// Pattern-level flags, carried verbatim into the AST's `Flags` node.
///
/// Oniguruma letters: `i` = ignore_case, `m` = dot_all (Oniguruma `m` is
/// dot-all, not multiline), `x` = extended.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flags {
    pub ignore_case: bool,
    pub dot_all: bool,
    pub extended: bool,
}

/// Scoped flag deltas on a group (`(?im-x:...)`) or a flags directive
/// (`(?im-x)`). Each side is present only if at least one letter appeared.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlagMods {
    pub enable: Option<Flags>,
    pub disable: Option<Flags>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenType {
    Alternator,
    Assertion,
    Backreference,
    Character,
    CharacterClassClose,
    CharacterClassHyphen,
    CharacterClassIntersector,
    CharacterClassOpen,
    CharacterSet,
    Directive,
    GroupClose,
    GroupOpen,
    Quantifier,
    Subroutine,
    VariableLengthCharacterSet,
}

/// Kind of a `CharacterSet` token/node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharacterSetKind {
    Any,
    Digit,
    Hex,
    Posix,
    Property,
    Space,
    Word,
}

impl CharacterSetKind {
    /// Kinds that carry a meaningful `negate` flag (`any` does not).
    pub fn supports_negation(self) -> bool {
        !matches!(self, CharacterSetKind::Any)
    }
}

/// Kind of a `GroupOpen` token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupKind {
    Capturing,
    Group,
    Atomic,
    Lookahead,
    Lookbehind,
}

/// Kind of a `Directive` token/node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectiveKind {
    Flags,
    Keep,
}

/// Kind of a `VariableLengthCharacterSet` token/node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VariableLengthKind {
    /// `\R`: any newline sequence, including `\r\n`.
    Newline,
    /// `\X`: an extended grapheme cluster.
    Grapheme,
}

/// A scanner token. Fields other than `token_type` and `raw` are valid only
/// for the token type noted on each field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub token_type: TokenType,
    /// The pattern text this token was scanned from.
    pub raw: String,
    /// Code point (`Character`).
    pub code: u32,
    /// Negation (`CharacterClassOpen`, `CharacterSet`, lookaround `GroupOpen`).
    pub negate: bool,
    /// Set kind (`CharacterSet`).
    pub set_kind: CharacterSetKind,
    /// Group kind (`GroupOpen`).
    pub group_kind: GroupKind,
    /// Directive kind (`Directive`).
    pub directive_kind: DirectiveKind,
    /// Variable-length set kind (`VariableLengthCharacterSet`).
    pub vlcs_kind: VariableLengthKind,
    /// Repetition bounds (`Quantifier`); `max == None` means unbounded.
    pub min: u32,
    pub max: Option<u32>,
    pub greedy: bool,
    pub possessive: bool,
    /// Capture number assigned in scan order (`GroupOpen` of capturing kind).
    pub number: Option<u32>,
    /// Group name (`GroupOpen` of capturing kind, when named).
    pub name: Option<String>,
    /// Property name (`CharacterSet` of posix/property kind).
    pub property: Option<String>,
    /// Flag deltas (`Directive` of flags kind, `GroupOpen` of group kind).
    pub flag_mods: Option<FlagMods>,
}

impl Token {
    /// A token of the given type with every kind-specific field defaulted.
    pub fn new(token_type: TokenType, raw: impl Into<String>) -> Self {
        Token {
            token_type,
            raw: raw.into(),
            code: 0,
            negate: false,
            set_kind: CharacterSetKind::Any,
            group_kind: GroupKind::Group,
            directive_kind: DirectiveKind::Keep,
            vlcs_kind: VariableLengthKind::Newline,
            min: 0,
            max: None,
            greedy: true,
            possessive: false,
            number: None,
            name: None,
            property: None,
            flag_mods: None,
        }
    }

    pub fn character(code: u32, raw: impl Into<String>) -> Self {
        Token {
            code,
            ..Token::new(TokenType::Character, raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_inert() {
        let tok = Token::new(TokenType::Alternator, "|");
        assert_eq!(tok.raw, "|");
        assert!(tok.greedy);
        assert!(!tok.possessive);
        assert!(tok.name.is_none());
    }

    #[test]
    fn character_helper_sets_code() {
        let tok = Token::character(0x61, "a");
        assert_eq!(tok.token_type, TokenType::Character);
        assert_eq!(tok.code, 0x61);
    }

    #[test]
    fn any_does_not_negate() {
        assert!(!CharacterSetKind::Any.supports_negation());
        assert!(CharacterSetKind::Posix.supports_negation());
    }
}
