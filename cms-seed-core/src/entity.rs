/// Entity kinds handled by the loader.
///
/// This enum centralizes dataset identity (short names, default REST
/// endpoints, display names and aliases) so the rest of the workspace never
/// matches on raw strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    MacroArea,
    Area,
    Colectivo,
    Sede,
    Organizacion,
}

/// All entity kinds in load order. Each stage may depend on the id maps of
/// the stages before it.
const LOAD_ORDER: &[EntityKind] = &[
    EntityKind::MacroArea,
    EntityKind::Area,
    EntityKind::Colectivo,
    EntityKind::Sede,
    EntityKind::Organizacion,
];

impl EntityKind {
    /// Canonical short name used for CLI arguments and config keys.
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::MacroArea => "macroareas",
            Self::Area => "areas",
            Self::Colectivo => "colectivos",
            Self::Sede => "sedes",
            Self::Organizacion => "organizaciones",
        }
    }

    /// Default REST collection name on the CMS (`/api/<endpoint>`).
    pub fn default_endpoint(&self) -> &'static str {
        self.short_name()
    }

    /// Default export file name inside the data directory.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            Self::MacroArea => "macroareas.json",
            Self::Area => "areas.json",
            Self::Colectivo => "colectivos.json",
            Self::Sede => "sedes.json",
            Self::Organizacion => "organizaciones.json",
        }
    }

    /// Human-readable name for log output.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MacroArea => "Macro-areas",
            Self::Area => "Areas",
            Self::Colectivo => "Colectivos",
            Self::Sede => "Sedes",
            Self::Organizacion => "Organizaciones",
        }
    }

    /// All accepted names for this kind (case-insensitive matching).
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::MacroArea => &["macroareas", "macroarea", "macro-areas", "macro-area"],
            Self::Area => &["areas", "area"],
            Self::Colectivo => &["colectivos", "colectivo", "collectives"],
            Self::Sede => &["sedes", "sede", "venues", "venue"],
            Self::Organizacion => &[
                "organizaciones",
                "organizacion",
                "organizations",
                "organization",
                "orgs",
            ],
        }
    }

    /// All kinds, in the order they must be loaded.
    pub fn load_order() -> &'static [EntityKind] {
        LOAD_ORDER
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Error returned when a string cannot be parsed into an `EntityKind`.
#[derive(Debug, Clone)]
pub struct EntityKindParseError(pub String);

impl std::fmt::Display for EntityKindParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown entity kind: '{}'", self.0)
    }
}

impl std::error::Error for EntityKindParseError {}

impl std::str::FromStr for EntityKind {
    type Err = EntityKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        LOAD_ORDER
            .iter()
            .copied()
            .find(|kind| kind.aliases().contains(&lower.as_str()))
            .ok_or_else(|| EntityKindParseError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_order_puts_dependencies_first() {
        let order = EntityKind::load_order();
        let pos = |k: EntityKind| order.iter().position(|&o| o == k).unwrap();
        assert!(pos(EntityKind::MacroArea) < pos(EntityKind::Area));
        assert!(pos(EntityKind::Area) < pos(EntityKind::Sede));
        assert!(pos(EntityKind::Colectivo) < pos(EntityKind::Sede));
        assert!(pos(EntityKind::Sede) < pos(EntityKind::Organizacion));
    }

    #[test]
    fn test_short_names_round_trip() {
        for &kind in EntityKind::load_order() {
            let parsed: EntityKind = kind.short_name().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_aliases_are_case_insensitive() {
        assert_eq!("Venues".parse::<EntityKind>().unwrap(), EntityKind::Sede);
        assert_eq!("ORGS".parse::<EntityKind>().unwrap(), EntityKind::Organizacion);
        assert!("planets".parse::<EntityKind>().is_err());
    }
}
