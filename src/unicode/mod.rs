// unicode/mod.rs - Property-name tables and normalization.
//
// Source-flavor property names are matched through a normalized "slug"
// (lowercased, whitespace and underscores stripped). Tables are static
// sorted arrays searched with binary_search; a test at the bottom pins the
// sort order.

use unicode_ident::{is_xid_continue, is_xid_start};

/// POSIX bracket-expression class names, by normalized name.
pub static POSIX_PROPERTIES: &[&str] = &[
    "alnum", "alpha", "ascii", "blank", "cntrl", "digit", "graph", "lower", "print", "punct",
    "space", "upper", "word", "xdigit",
];

/// Normalized source name -> canonical JavaScript `\p{...}` name, covering
/// general categories (short and long forms) and the binary properties the
/// target flavor accepts. Script names are absent: they go through
/// [`format_script_name`] instead.
pub static JS_UNICODE_PROPERTIES_MAP: &[(&str, &str)] = &[
    ("alphabetic", "Alphabetic"),
    ("ascii", "ASCII"),
    ("asciihexdigit", "ASCII_Hex_Digit"),
    ("assigned", "Assigned"),
    ("bidicontrol", "Bidi_Control"),
    ("bidimirrored", "Bidi_Mirrored"),
    ("c", "C"),
    ("cased", "Cased"),
    ("casedletter", "Cased_Letter"),
    ("caseignorable", "Case_Ignorable"),
    ("cc", "Cc"),
    ("cf", "Cf"),
    ("changeswhencasefolded", "Changes_When_Casefolded"),
    ("changeswhencasemapped", "Changes_When_Casemapped"),
    ("changeswhenlowercased", "Changes_When_Lowercased"),
    ("changeswhennfkccasefolded", "Changes_When_NFKC_Casefolded"),
    ("changeswhentitlecased", "Changes_When_Titlecased"),
    ("changeswhenuppercased", "Changes_When_Uppercased"),
    ("closepunctuation", "Close_Punctuation"),
    ("cn", "Cn"),
    ("co", "Co"),
    ("connectorpunctuation", "Connector_Punctuation"),
    ("control", "Control"),
    ("cs", "Cs"),
    ("currencysymbol", "Currency_Symbol"),
    ("dash", "Dash"),
    ("dashpunctuation", "Dash_Punctuation"),
    ("decimalnumber", "Decimal_Number"),
    ("defaultignorablecodepoint", "Default_Ignorable_Code_Point"),
    ("deprecated", "Deprecated"),
    ("diacritic", "Diacritic"),
    ("emoji", "Emoji"),
    ("emojicomponent", "Emoji_Component"),
    ("emojimodifier", "Emoji_Modifier"),
    ("emojimodifierbase", "Emoji_Modifier_Base"),
    ("emojipresentation", "Emoji_Presentation"),
    ("enclosingmark", "Enclosing_Mark"),
    ("extendedpictographic", "Extended_Pictographic"),
    ("extender", "Extender"),
    ("finalpunctuation", "Final_Punctuation"),
    ("format", "Format"),
    ("graphemebase", "Grapheme_Base"),
    ("graphemeextend", "Grapheme_Extend"),
    ("hexdigit", "Hex_Digit"),
    ("idcontinue", "ID_Continue"),
    ("ideographic", "Ideographic"),
    ("idsbinaryoperator", "IDS_Binary_Operator"),
    ("idstart", "ID_Start"),
    ("idstrinaryoperator", "IDS_Trinary_Operator"),
    ("initialpunctuation", "Initial_Punctuation"),
    ("joincontrol", "Join_Control"),
    ("l", "L"),
    ("lc", "LC"),
    ("letter", "Letter"),
    ("letternumber", "Letter_Number"),
    ("lineseparator", "Line_Separator"),
    ("ll", "Ll"),
    ("lm", "Lm"),
    ("lo", "Lo"),
    ("logicalorderexception", "Logical_Order_Exception"),
    ("lowercase", "Lowercase"),
    ("lowercaseletter", "Lowercase_Letter"),
    ("lt", "Lt"),
    ("lu", "Lu"),
    ("m", "M"),
    ("mark", "Mark"),
    ("math", "Math"),
    ("mathsymbol", "Math_Symbol"),
    ("mc", "Mc"),
    ("me", "Me"),
    ("mn", "Mn"),
    ("modifierletter", "Modifier_Letter"),
    ("modifiersymbol", "Modifier_Symbol"),
    ("n", "N"),
    ("nd", "Nd"),
    ("nl", "Nl"),
    ("no", "No"),
    ("noncharactercodepoint", "Noncharacter_Code_Point"),
    ("nonspacingmark", "Nonspacing_Mark"),
    ("number", "Number"),
    ("openpunctuation", "Open_Punctuation"),
    ("other", "Other"),
    ("otherletter", "Other_Letter"),
    ("othernumber", "Other_Number"),
    ("otherpunctuation", "Other_Punctuation"),
    ("othersymbol", "Other_Symbol"),
    ("p", "P"),
    ("paragraphseparator", "Paragraph_Separator"),
    ("patternsyntax", "Pattern_Syntax"),
    ("patternwhitespace", "Pattern_White_Space"),
    ("pc", "Pc"),
    ("pd", "Pd"),
    ("pe", "Pe"),
    ("pf", "Pf"),
    ("pi", "Pi"),
    ("po", "Po"),
    ("privateuse", "Private_Use"),
    ("ps", "Ps"),
    ("punctuation", "Punctuation"),
    ("quotationmark", "Quotation_Mark"),
    ("radical", "Radical"),
    ("regionalindicator", "Regional_Indicator"),
    ("s", "S"),
    ("sc", "Sc"),
    ("sentenceterminal", "Sentence_Terminal"),
    ("separator", "Separator"),
    ("sk", "Sk"),
    ("sm", "Sm"),
    ("so", "So"),
    ("softdotted", "Soft_Dotted"),
    ("spaceseparator", "Space_Separator"),
    ("spacingmark", "Spacing_Mark"),
    ("surrogate", "Surrogate"),
    ("symbol", "Symbol"),
    ("terminalpunctuation", "Terminal_Punctuation"),
    ("titlecaseletter", "Titlecase_Letter"),
    ("unassigned", "Unassigned"),
    ("unifiedideograph", "Unified_Ideograph"),
    ("uppercase", "Uppercase"),
    ("uppercaseletter", "Uppercase_Letter"),
    ("variationselector", "Variation_Selector"),
    ("whitespace", "White_Space"),
    ("xidcontinue", "XID_Continue"),
    ("xidstart", "XID_Start"),
    ("z", "Z"),
    ("zl", "Zl"),
    ("zp", "Zp"),
    ("zs", "Zs"),
];

/// Lowercase `name` and strip whitespace and underscores.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Membership test by normalized name.
pub fn is_posix_property(normalized: &str) -> bool {
    POSIX_PROPERTIES.binary_search(&normalized).is_ok()
}

/// Map a source-flavor property name to the target convention.
///
/// Recognized names come back in canonical casing; anything else is assumed
/// to be a script name and reformatted heuristically. There is no fallback
/// lookup: unknown names pass through the heuristic unchecked.
pub fn js_property_name(raw: &str) -> String {
    let slug = normalize(raw);
    if let Ok(i) = JS_UNICODE_PROPERTIES_MAP.binary_search_by_key(&slug.as_str(), |&(k, _)| k) {
        return JS_UNICODE_PROPERTIES_MAP[i].1.to_string();
    }
    format_script_name(raw)
}

/// Recase a script name: trim, collapse whitespace to `_`, split camel-case
/// boundaries with `_`, and titlecase each word.
pub fn format_script_name(raw: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut cur = String::new();
    let mut prev_lower = false;
    for ch in raw.trim().chars() {
        if ch.is_whitespace() || ch == '_' {
            if !cur.is_empty() {
                words.push(std::mem::take(&mut cur));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !cur.is_empty() {
            words.push(std::mem::take(&mut cur));
        }
        prev_lower = ch.is_lowercase();
        cur.push(ch);
    }
    if !cur.is_empty() {
        words.push(cur);
    }
    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            out.push('_');
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.extend(chars.flat_map(char::to_lowercase));
        }
    }
    out
}

/// Whether `name` is a portable capturing-group name: one of `$`, `_`, or
/// ID_Start first, then `$`, ZWNJ, ZWJ, or ID_Continue.
pub fn is_valid_group_name(name: &str) -> bool {
    let mut chars = name.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    if first != '$' && first != '_' && !is_xid_start(first) {
        return false;
    }
    chars.all(|c| c == '$' || c == '\u{200C}' || c == '\u{200D}' || is_xid_continue(c))
}
