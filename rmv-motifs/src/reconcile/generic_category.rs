//! Generic (structural-class) category names
//!
//! Sources such as the Motif Atlas, BGSU and FR3D label motifs by loop class
//! only ("HL", "Internal Loop (IL)", "3-way Junction (J3)"). These names say
//! nothing about the motif family and are candidates for enrichment.
//!
//! Detection is an exact match after normalization (trim, upper-case,
//! '-' and ' ' → '_'), never a substring search: "Hairpin-like GNRA" is
//! not generic.

use std::fmt;

/// Loop-class category name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericCategory {
    /// HL / "Hairpin Loop" / "Hairpin Loop (HL)"
    HairpinLoop,
    /// IL / "Internal Loop" / "Internal Loop (IL)"
    InternalLoop,
    /// J3..J8 / "N-way Junction (JN)"
    Junction(u8),
    /// "Hairpin"
    Hairpin,
    /// "Internal"
    Internal,
    /// "Junction" without arity
    AnyJunction,
    /// "Bulge"
    Bulge,
    /// "Unknown"
    Unknown,
}

const MIN_JUNCTION_ARITY: u8 = 3;
const MAX_JUNCTION_ARITY: u8 = 8;

impl GenericCategory {
    /// Parse a category name; `None` means the name is specific
    pub fn parse(name: &str) -> Option<Self> {
        let normalized: String = name
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect();

        match normalized.as_str() {
            "HL" | "HAIRPIN_LOOP" | "HAIRPIN_LOOP_(HL)" => Some(Self::HairpinLoop),
            "IL" | "INTERNAL_LOOP" | "INTERNAL_LOOP_(IL)" => Some(Self::InternalLoop),
            "HAIRPIN" => Some(Self::Hairpin),
            "INTERNAL" => Some(Self::Internal),
            "JUNCTION" => Some(Self::AnyJunction),
            "BULGE" => Some(Self::Bulge),
            "UNKNOWN" => Some(Self::Unknown),
            other => parse_junction(other).map(Self::Junction),
        }
    }

    /// True when the name is a loop-class label
    pub fn is_generic(name: &str) -> bool {
        Self::parse(name).is_some()
    }

    /// Map a loop-type code (HL, IL, J3..J8) to its category
    pub fn from_loop_code(code: &str) -> Option<Self> {
        match code {
            "HL" => Some(Self::HairpinLoop),
            "IL" => Some(Self::InternalLoop),
            _ => code
                .strip_prefix('J')
                .and_then(|n| n.parse::<u8>().ok())
                .filter(|n| (MIN_JUNCTION_ARITY..=MAX_JUNCTION_ARITY).contains(n))
                .map(Self::Junction),
        }
    }

    /// Descriptive long form ("Hairpin Loop (HL)", "3-way Junction (J3)")
    pub fn descriptive_name(&self) -> String {
        match self {
            Self::HairpinLoop => "Hairpin Loop (HL)".to_string(),
            Self::InternalLoop => "Internal Loop (IL)".to_string(),
            Self::Junction(n) => format!("{}-way Junction (J{})", n, n),
            Self::Hairpin => "Hairpin".to_string(),
            Self::Internal => "Internal".to_string(),
            Self::AnyJunction => "Junction".to_string(),
            Self::Bulge => "Bulge".to_string(),
            Self::Unknown => "Unknown".to_string(),
        }
    }
}

impl fmt::Display for GenericCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptive_name())
    }
}

/// "J3" or "3_WAY_JUNCTION_(J3)" → 3
fn parse_junction(normalized: &str) -> Option<u8> {
    let arity = if let Some(n) = normalized.strip_prefix('J') {
        n.parse::<u8>().ok()?
    } else {
        let (n, rest) = normalized.split_once("_WAY_JUNCTION")?;
        let arity = n.parse::<u8>().ok()?;
        if !rest.is_empty() && rest != format!("_(J{})", arity) {
            return None;
        }
        arity
    };
    (MIN_JUNCTION_ARITY..=MAX_JUNCTION_ARITY)
        .contains(&arity)
        .then_some(arity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_codes_are_generic() {
        for name in ["HL", "IL", "J3", "J8", "hl"] {
            assert!(GenericCategory::is_generic(name), "{} should be generic", name);
        }
    }

    #[test]
    fn test_descriptive_names_are_generic() {
        for name in [
            "Hairpin Loop (HL)",
            "Internal Loop (IL)",
            "3-way Junction (J3)",
            "8-way Junction (J8)",
            "Hairpin Loop",
            "Internal Loop",
            "Hairpin",
            "Internal",
            "Junction",
            "Unknown",
            "Bulge",
        ] {
            assert!(GenericCategory::is_generic(name), "{} should be generic", name);
        }
    }

    #[test]
    fn test_specific_names_are_not_generic() {
        for name in ["Kink-turn", "GNRA", "Sarcin-Ricin", "J9", "J2", "Hairpin-like GNRA", "HLX"] {
            assert!(!GenericCategory::is_generic(name), "{} should be specific", name);
        }
    }

    #[test]
    fn test_descriptive_name_round_trips() {
        for code in ["HL", "IL", "J3", "J5", "J8"] {
            let category = GenericCategory::from_loop_code(code).unwrap();
            assert_eq!(GenericCategory::parse(&category.descriptive_name()), Some(category));
        }
        assert_eq!(GenericCategory::from_loop_code("J9"), None);
        assert_eq!(GenericCategory::from_loop_code("XX"), None);
    }

    #[test]
    fn test_mismatched_junction_arity_is_specific() {
        assert!(!GenericCategory::is_generic("3-way Junction (J4)"));
    }
}
