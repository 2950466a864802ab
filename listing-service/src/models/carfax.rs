use crate::config::is_truthy;

/// Vehicle-history status advertised ahead of the generated copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarfaxSignal {
    OneOwner,
    Clean,
}

const ONE_OWNER_PHRASES: [&str; 3] = ["carfax 1 owner", "carfax 1-owner", "carfax one owner"];
const CLEAN_PHRASE: &str = "clean carfax";

impl CarfaxSignal {
    pub fn label(self) -> &'static str {
        match self {
            CarfaxSignal::OneOwner => "Carfax 1 Owner. ",
            CarfaxSignal::Clean => "Clean Carfax. ",
        }
    }

    /// Explicit flags win over phrases found in the options text. Within each
    /// source one-owner is checked before clean.
    pub fn detect(
        options: &str,
        one_owner_flag: Option<&str>,
        clean_flag: Option<&str>,
    ) -> Option<Self> {
        Self::from_flags(one_owner_flag, clean_flag).or_else(|| Self::from_options(options))
    }

    pub fn from_flags(one_owner_flag: Option<&str>, clean_flag: Option<&str>) -> Option<Self> {
        if one_owner_flag.is_some_and(is_truthy) {
            Some(CarfaxSignal::OneOwner)
        } else if clean_flag.is_some_and(is_truthy) {
            Some(CarfaxSignal::Clean)
        } else {
            None
        }
    }

    pub fn from_options(options: &str) -> Option<Self> {
        let lowered = options.to_lowercase();
        if ONE_OWNER_PHRASES.iter().any(|p| lowered.contains(p)) {
            Some(CarfaxSignal::OneOwner)
        } else if lowered.contains(CLEAN_PHRASE) {
            Some(CarfaxSignal::Clean)
        } else {
            None
        }
    }
}
