use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::TesseraError;

/// A tag naming each concrete record type held in an event.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordKind {
    /// Truth-level generator particle.
    GenParticle,
    /// Reconstructed photon.
    Photon,
    /// Reconstructed electron.
    Electron,
    /// Reconstructed muon.
    Muon,
    /// Isolated track.
    IsoTrack,
    /// Reconstructed jet.
    Jet,
    /// Charged-particle track.
    Track,
    /// Calorimeter tower.
    Tower,
    /// The generic working record of the reconstruction pipeline.
    Candidate,
}

impl RecordKind {
    /// Every record kind, in declaration order.
    pub const ALL: [RecordKind; 9] = [
        RecordKind::GenParticle,
        RecordKind::Photon,
        RecordKind::Electron,
        RecordKind::Muon,
        RecordKind::IsoTrack,
        RecordKind::Jet,
        RecordKind::Track,
        RecordKind::Tower,
        RecordKind::Candidate,
    ];
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::GenParticle => write!(f, "GenParticle"),
            RecordKind::Photon => write!(f, "Photon"),
            RecordKind::Electron => write!(f, "Electron"),
            RecordKind::Muon => write!(f, "Muon"),
            RecordKind::IsoTrack => write!(f, "IsoTrack"),
            RecordKind::Jet => write!(f, "Jet"),
            RecordKind::Track => write!(f, "Track"),
            RecordKind::Tower => write!(f, "Tower"),
            RecordKind::Candidate => write!(f, "Candidate"),
        }
    }
}

impl FromStr for RecordKind {
    type Err = TesseraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "genparticle" | "gen particle" | "gen" | "particle" => Ok(Self::GenParticle),
            "photon" | "gamma" => Ok(Self::Photon),
            "electron" | "e" => Ok(Self::Electron),
            "muon" | "mu" => Ok(Self::Muon),
            "isotrack" | "iso track" | "iso-track" => Ok(Self::IsoTrack),
            "jet" => Ok(Self::Jet),
            "track" => Ok(Self::Track),
            "tower" => Ok(Self::Tower),
            "candidate" => Ok(Self::Candidate),
            _ => Err(TesseraError::ParseError {
                name: s.to_string(),
                object: "RecordKind".to_string(),
            }),
        }
    }
}

/// The input format an event header was read from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventFormat {
    /// No format-specific header information.
    Plain,
    /// The LHC Olympics text format.
    Lhco,
    /// The Les Houches Event File format.
    Lhef,
    /// The HepMC format.
    HepMc,
}

impl Display for EventFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventFormat::Plain => write!(f, "Plain"),
            EventFormat::Lhco => write!(f, "LHCO"),
            EventFormat::Lhef => write!(f, "LHEF"),
            EventFormat::HepMc => write!(f, "HepMC"),
        }
    }
}

impl FromStr for EventFormat {
    type Err = TesseraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" | "none" => Ok(Self::Plain),
            "lhco" => Ok(Self::Lhco),
            "lhef" | "lhe" => Ok(Self::Lhef),
            "hepmc" | "hepmc2" | "hepmc3" => Ok(Self::HepMc),
            _ => Err(TesseraError::ParseError {
                name: s.to_string(),
                object: "EventFormat".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_kind_round_trip_through_display() {
        for kind in RecordKind::ALL {
            assert_eq!(kind.to_string().parse::<RecordKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_record_kind_aliases() {
        assert_eq!("mu".parse::<RecordKind>().unwrap(), RecordKind::Muon);
        assert_eq!("Iso-Track".parse::<RecordKind>().unwrap(), RecordKind::IsoTrack);
        assert!(matches!(
            "muons".parse::<RecordKind>(),
            Err(TesseraError::ParseError { .. })
        ));
    }

    #[test]
    fn test_event_format_parse() {
        assert_eq!("HepMC".parse::<EventFormat>().unwrap(), EventFormat::HepMc);
        assert_eq!("lhe".parse::<EventFormat>().unwrap(), EventFormat::Lhef);
        assert_eq!(EventFormat::Lhco.to_string(), "LHCO");
        assert!("root".parse::<EventFormat>().is_err());
    }
}
