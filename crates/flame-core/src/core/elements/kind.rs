use phf::{Map, phf_map};
use std::fmt;

/// Element model selected by a lattice type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Marker,
    Source,
    Drift,
    SBend,
    EDipole,
    Quadrupole,
    EQuad,
    Solenoid,
    Sextupole,
    RfCavity,
    Stripper,
    OrbTrim,
    Generic,
}

static ELEMENT_KINDS: Map<&'static str, ElementKind> = phf_map! {
    "marker" => ElementKind::Marker,
    "source" => ElementKind::Source,
    "drift" => ElementKind::Drift,
    "sbend" => ElementKind::SBend,
    "edipole" => ElementKind::EDipole,
    "quadrupole" => ElementKind::Quadrupole,
    "equad" => ElementKind::EQuad,
    "solenoid" => ElementKind::Solenoid,
    "sextupole" => ElementKind::Sextupole,
    "rfcavity" => ElementKind::RfCavity,
    "stripper" => ElementKind::Stripper,
    "orbtrim" => ElementKind::OrbTrim,
    "generic" => ElementKind::Generic,
};

impl ElementKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        ELEMENT_KINDS.get(tag.trim()).copied()
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ElementKind::Marker => "marker",
            ElementKind::Source => "source",
            ElementKind::Drift => "drift",
            ElementKind::SBend => "sbend",
            ElementKind::EDipole => "edipole",
            ElementKind::Quadrupole => "quadrupole",
            ElementKind::EQuad => "equad",
            ElementKind::Solenoid => "solenoid",
            ElementKind::Sextupole => "sextupole",
            ElementKind::RfCavity => "rfcavity",
            ElementKind::Stripper => "stripper",
            ElementKind::OrbTrim => "orbtrim",
            ElementKind::Generic => "generic",
        }
    }

    pub fn all_tags() -> impl Iterator<Item = &'static str> {
        ELEMENT_KINDS.keys().copied()
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_tag_recognizes_every_registered_tag() {
        for tag in ElementKind::all_tags() {
            let kind = ElementKind::from_tag(tag).unwrap();
            assert_eq!(kind.tag(), tag);
        }
        assert_eq!(ElementKind::all_tags().count(), 13);
    }

    #[test]
    fn from_tag_trims_whitespace_and_is_case_sensitive() {
        assert_eq!(ElementKind::from_tag(" drift "), Some(ElementKind::Drift));
        assert_eq!(ElementKind::from_tag("Drift"), None);
        assert_eq!(ElementKind::from_tag("wiggler"), None);
    }

    #[test]
    fn display_prints_the_tag() {
        assert_eq!(ElementKind::RfCavity.to_string(), "rfcavity");
    }
}
