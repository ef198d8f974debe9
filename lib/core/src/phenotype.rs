use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Trim and case-fold a label or identifier before it touches any index
#[inline]
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// A phenotype term from the controlled vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhenotypeTerm {
    pub id: String,
    pub label: String,
}

impl PhenotypeTerm {
    #[inline]
    #[must_use]
    pub fn new(id: &str, label: &str) -> Self {
        Self {
            id: id.trim().to_string(),
            label: normalize(label),
        }
    }
}

/// How often a phenotype is observed in the known cases of a disease
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FrequencyBand {
    Obligate,
    VeryFrequent,
    Frequent,
    Occasional,
    VeryRare,
    Excluded,
    Unknown,
}

impl FrequencyBand {
    pub const ALL: [FrequencyBand; 7] = [
        FrequencyBand::Obligate,
        FrequencyBand::VeryFrequent,
        FrequencyBand::Frequent,
        FrequencyBand::Occasional,
        FrequencyBand::VeryRare,
        FrequencyBand::Excluded,
        FrequencyBand::Unknown,
    ];

    /// Display label as used by the annotation table
    pub fn label(&self) -> &'static str {
        match self {
            FrequencyBand::Obligate => "Obligate (100%)",
            FrequencyBand::VeryFrequent => "Very frequent (99-80%)",
            FrequencyBand::Frequent => "Frequent (79-30%)",
            FrequencyBand::Occasional => "Occasional (29-5%)",
            FrequencyBand::VeryRare => "Very rare (<4-1%)",
            FrequencyBand::Excluded => "Excluded (0%)",
            FrequencyBand::Unknown => "Unknown",
        }
    }

    /// HPO frequency subontology term for this band
    pub fn hpo_id(&self) -> Option<&'static str> {
        match self {
            FrequencyBand::Obligate => Some("HP:0040280"),
            FrequencyBand::VeryFrequent => Some("HP:0040281"),
            FrequencyBand::Frequent => Some("HP:0040282"),
            FrequencyBand::Occasional => Some("HP:0040283"),
            FrequencyBand::VeryRare => Some("HP:0040284"),
            FrequencyBand::Excluded => Some("HP:0040285"),
            FrequencyBand::Unknown => None,
        }
    }

    /// Map a percentage onto the HPO band ranges
    pub fn from_percentage(pct: f64) -> Self {
        if pct >= 100.0 {
            FrequencyBand::Obligate
        } else if pct >= 80.0 {
            FrequencyBand::VeryFrequent
        } else if pct >= 30.0 {
            FrequencyBand::Frequent
        } else if pct >= 5.0 {
            FrequencyBand::Occasional
        } else if pct > 0.0 {
            FrequencyBand::VeryRare
        } else {
            FrequencyBand::Excluded
        }
    }

    /// Lenient parse for dataset rows: anything unrecognised is `Unknown`
    pub fn from_cell(cell: &str) -> Self {
        cell.parse().unwrap_or(FrequencyBand::Unknown)
    }

    fn parse_numeric(s: &str) -> Option<f64> {
        if let Some((num, den)) = s.split_once('/') {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den <= 0.0 {
                return None;
            }
            return Some(num / den * 100.0);
        }
        let pct = s.strip_suffix('%')?;
        pct.trim().parse().ok()
    }
}

impl fmt::Display for FrequencyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FrequencyBand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if let Some(band) = FrequencyBand::ALL
            .iter()
            .find(|b| b.hpo_id().is_some_and(|id| id.eq_ignore_ascii_case(raw)))
        {
            return Ok(*band);
        }
        if let Some(pct) = Self::parse_numeric(raw) {
            return Ok(Self::from_percentage(pct));
        }

        // "Very frequent (99-80%)" -> "very frequent"
        let name = normalize(raw.split('(').next().unwrap_or(raw)).replace(['_', '-'], " ");
        match name.trim() {
            "obligate" => Ok(FrequencyBand::Obligate),
            "very frequent" => Ok(FrequencyBand::VeryFrequent),
            "frequent" => Ok(FrequencyBand::Frequent),
            "occasional" => Ok(FrequencyBand::Occasional),
            "very rare" => Ok(FrequencyBand::VeryRare),
            "excluded" => Ok(FrequencyBand::Excluded),
            "unknown" => Ok(FrequencyBand::Unknown),
            _ => Err(Error::InvalidRequest(format!("unknown frequency band '{}'", raw))),
        }
    }
}

/// One phenotype-to-disease annotation row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub phenotype_id: String,
    /// Normalized label the row was ingested with
    pub phenotype_label: String,
    pub disease_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disease_name: Option<String>,
    pub frequency_band: FrequencyBand,
}

impl AnnotationRecord {
    #[inline]
    #[must_use]
    pub fn new(phenotype_id: &str, label: &str, disease_id: &str, band: FrequencyBand) -> Self {
        Self {
            phenotype_id: phenotype_id.trim().to_string(),
            phenotype_label: normalize(label),
            disease_id: disease_id.trim().to_string(),
            disease_name: None,
            frequency_band: band,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_disease_name(mut self, name: &str) -> Self {
        let name = name.trim();
        if !name.is_empty() {
            self.disease_name = Some(name.to_string());
        }
        self
    }
}

/// A disease with its canonical display title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseEntry {
    pub mim_id: String,
    pub preferred_title: String,
}

impl DiseaseEntry {
    pub const UNKNOWN_TITLE: &'static str = "Unknown Disease";

    #[inline]
    #[must_use]
    pub fn new(mim_id: &str, preferred_title: &str) -> Self {
        Self {
            mim_id: mim_id.trim().to_string(),
            preferred_title: preferred_title.trim().to_string(),
        }
    }
}
