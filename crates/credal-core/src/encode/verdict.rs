//! Raw rater verdicts

use serde::{Deserialize, Serialize};

use crate::error::BeliefError;

/// One rater's response: a set of stages, or an abstention.
///
/// On the wire a verdict is a list of stage identifiers, `true`, or the
/// string `"abstain"`. An empty list carries no substantive judgment and is
/// read as an abstention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawVerdict", into = "RawVerdict")]
pub enum Verdict {
    Abstain,
    Stages(Vec<u32>),
}

impl Verdict {
    pub fn stages(stages: impl Into<Vec<u32>>) -> Self {
        let stages = stages.into();
        if stages.is_empty() {
            Self::Abstain
        } else {
            Self::Stages(stages)
        }
    }

    pub fn is_abstain(&self) -> bool {
        match self {
            Self::Abstain => true,
            Self::Stages(stages) => stages.is_empty(),
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Abstain => write!(f, "ABSTAIN"),
            Self::Stages(stages) => {
                let mut sorted = stages.clone();
                sorted.sort_unstable();
                sorted.dedup();
                write!(f, "{:?}", sorted)
            }
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawVerdict {
    Stages(Vec<u32>),
    Flag(bool),
    Label(String),
}

impl TryFrom<RawVerdict> for Verdict {
    type Error = BeliefError;

    fn try_from(raw: RawVerdict) -> Result<Self, Self::Error> {
        match raw {
            RawVerdict::Stages(stages) => Ok(Self::stages(stages)),
            RawVerdict::Flag(true) => Ok(Self::Abstain),
            RawVerdict::Flag(false) => Err(BeliefError::InvalidJudgment(
                "verdict `false` names neither stages nor an abstention".into(),
            )),
            RawVerdict::Label(label) if label.eq_ignore_ascii_case("abstain") => Ok(Self::Abstain),
            RawVerdict::Label(label) => Err(BeliefError::InvalidJudgment(format!(
                "unrecognized verdict label {:?}",
                label
            ))),
        }
    }
}

impl From<Verdict> for RawVerdict {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Abstain => Self::Label("abstain".into()),
            Verdict::Stages(stages) => Self::Stages(stages),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stage_lists() {
        let v: Verdict = serde_json::from_str("[3, 2]").unwrap();
        assert_eq!(v, Verdict::Stages(vec![3, 2]));
        assert_eq!(v.to_string(), "[2, 3]");
    }

    #[test]
    fn parses_abstain_forms() {
        for input in ["true", "\"abstain\"", "\"ABSTAIN\"", "[]"] {
            let v: Verdict = serde_json::from_str(input).unwrap();
            assert!(v.is_abstain(), "{} should be an abstention", input);
        }
    }

    #[test]
    fn rejects_malformed() {
        assert!(serde_json::from_str::<Verdict>("false").is_err());
        assert!(serde_json::from_str::<Verdict>("\"maybe\"").is_err());
        assert!(serde_json::from_str::<Verdict>("[-1]").is_err());
    }

    #[test]
    fn serializes_abstain_as_label() {
        assert_eq!(serde_json::to_string(&Verdict::Abstain).unwrap(), "\"abstain\"");
        assert_eq!(serde_json::to_string(&Verdict::Stages(vec![1, 2])).unwrap(), "[1,2]");
    }
}
