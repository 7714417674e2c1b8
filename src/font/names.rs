//! Glyph name and codepoint resolution.
//!
//! Glyph sources identify glyphs by arbitrary keys: a literal character
//! ("a"), a production name ("ampersand"), or a made-up label for a glyph
//! that has no codepoint. The resolver turns each key into a stable
//! `(codepoint, canonical name)` pair, allocating private-use-area
//! codepoints for keys nothing else can place.

use std::collections::{BTreeMap, HashMap};

use tracing::warn;

/// First private-use-area codepoint handed out to unresolvable names.
/// Leaves some space below for other PUA usage.
pub const PUA_BASE: u32 = 0xE8FF;

/// Maps raw glyph keys to `(codepoint, canonical name)` pairs.
///
/// Lives inside a [`Font`](super::Font) and returns the same results for
/// its whole lifetime: the first name that produced a codepoint stays the
/// canonical name for that codepoint, and a raw key allocated a PUA
/// codepoint keeps it.
#[derive(Debug, Clone)]
pub struct NameResolver {
    user_map: BTreeMap<String, char>,
    canonical: HashMap<u32, String>,
    pua: HashMap<String, u32>,
    next_pua: u32,
}

impl NameResolver {
    /// Build a resolver from the instructions' `name2Unicode` mapping.
    ///
    /// Map values are expected to be single-character strings; anything
    /// else is skipped with a warning.
    pub fn new(name_to_unicode: &BTreeMap<String, String>) -> Self {
        let mut user_map = BTreeMap::new();
        for (name, value) in name_to_unicode {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => {
                    user_map.insert(name.clone(), ch);
                }
                _ => {
                    warn!(
                        "name2Unicode entry for {name:?} is not a single character, ignoring it"
                    );
                }
            }
        }
        NameResolver {
            user_map,
            canonical: HashMap::new(),
            pua: HashMap::new(),
            next_pua: PUA_BASE,
        }
    }

    /// Resolve a raw glyph key to its `(codepoint, canonical name)` pair.
    ///
    /// Tried in order: the user-supplied `name2Unicode` mapping, the key
    /// as a literal single character, a standard name lookup, and finally
    /// a fresh private-use-area codepoint. The canonical name for a
    /// codepoint is fixed by whichever key resolves it first.
    pub fn resolve(&mut self, raw: &str) -> (u32, String) {
        let (codepoint, name) = self.lookup(raw);
        let canonical = self
            .canonical
            .entry(codepoint)
            .or_insert(name)
            .clone();
        (codepoint, canonical)
    }

    /// The canonical name for a raw key.
    pub fn name(&mut self, raw: &str) -> String {
        self.resolve(raw).1
    }

    /// The codepoint for a raw key.
    pub fn codepoint(&mut self, raw: &str) -> u32 {
        self.resolve(raw).0
    }

    fn lookup(&mut self, raw: &str) -> (u32, String) {
        if let Some(&ch) = self.user_map.get(raw) {
            return (ch as u32, raw.to_string());
        }
        let mut chars = raw.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            let codepoint = ch as u32;
            return (codepoint, glyph_name_for(codepoint));
        }
        if let Some(codepoint) = codepoint_for_name(raw) {
            return (codepoint, raw.to_string());
        }
        (self.pua_codepoint(raw), raw.to_string())
    }

    /// A private-use-area codepoint for `name`, allocated on first use
    /// and cached so repeated requests return the same value.
    fn pua_codepoint(&mut self, name: &str) -> u32 {
        if let Some(&codepoint) = self.pua.get(name) {
            return codepoint;
        }
        let codepoint = self.next_pua;
        self.next_pua += 1;
        self.pua.insert(name.to_string(), codepoint);
        codepoint
    }
}

/// Production glyph names for codepoints that have one in common use.
///
/// A small Adobe-glyph-list-style table covering ASCII punctuation and a
/// few Latin-1 letters; everything else falls back to `uniXXXX` naming.
const GLYPH_NAMES: &[(u32, &str)] = &[
    (0x20, "space"),
    (0x21, "exclam"),
    (0x22, "quotedbl"),
    (0x23, "numbersign"),
    (0x24, "dollar"),
    (0x25, "percent"),
    (0x26, "ampersand"),
    (0x27, "quotesingle"),
    (0x28, "parenleft"),
    (0x29, "parenright"),
    (0x2A, "asterisk"),
    (0x2B, "plus"),
    (0x2C, "comma"),
    (0x2D, "hyphen"),
    (0x2E, "period"),
    (0x2F, "slash"),
    (0x3A, "colon"),
    (0x3B, "semicolon"),
    (0x3C, "less"),
    (0x3D, "equal"),
    (0x3E, "greater"),
    (0x3F, "question"),
    (0x40, "at"),
    (0x5B, "bracketleft"),
    (0x5C, "backslash"),
    (0x5D, "bracketright"),
    (0x5E, "asciicircum"),
    (0x5F, "underscore"),
    (0x60, "grave"),
    (0x7B, "braceleft"),
    (0x7C, "bar"),
    (0x7D, "braceright"),
    (0x7E, "asciitilde"),
    (0xA1, "exclamdown"),
    (0xBF, "questiondown"),
    (0xC4, "Adieresis"),
    (0xD6, "Odieresis"),
    (0xDC, "Udieresis"),
    (0xDF, "germandbls"),
    (0xE4, "adieresis"),
    (0xE9, "eacute"),
    (0xF6, "odieresis"),
    (0xFC, "udieresis"),
];

/// The standard glyph name for a codepoint.
///
/// ASCII letters and digits are their own name, known punctuation comes
/// from the table, and everything else gets a `uniXXXX` name.
pub fn glyph_name_for(codepoint: u32) -> String {
    if let Some(ch) = char::from_u32(codepoint) {
        if ch.is_ascii_alphanumeric() {
            return ch.to_string();
        }
    }
    if let Some((_, name)) = GLYPH_NAMES.iter().find(|(cp, _)| *cp == codepoint) {
        return (*name).to_string();
    }
    if codepoint > 0xFFFF {
        format!("u{codepoint:05X}")
    } else {
        format!("uni{codepoint:04X}")
    }
}

/// The codepoint a standard glyph name refers to, if any.
///
/// Understands the table names plus `uniXXXX` and `uXXXXX`/`uXXXXXX`
/// hex-named glyphs.
pub fn codepoint_for_name(name: &str) -> Option<u32> {
    if let Some((cp, _)) = GLYPH_NAMES.iter().find(|(_, n)| *n == name) {
        return Some(*cp);
    }
    if let Some(hex) = name.strip_prefix("uni") {
        if hex.len() == 4 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return u32::from_str_radix(hex, 16).ok();
        }
    }
    if let Some(hex) = name.strip_prefix('u') {
        if (5..=6).contains(&hex.len()) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return u32::from_str_radix(hex, 16).ok().filter(|cp| *cp <= 0x10FFFF);
        }
    }
    None
}
