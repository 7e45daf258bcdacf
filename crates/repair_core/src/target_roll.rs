//! Accumulating target number for a skill check.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Outcome-fixing values that override the numeric total. Ordered by
/// precedence: a later variant replaces an earlier one, never the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sentinel {
    AutomaticSuccess,
    CheckFalse,
    AutomaticFail,
    Impossible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RollValue {
    Value(i32),
    Fixed(Sentinel),
}

impl RollValue {
    /// True when no roll can succeed.
    pub fn is_blocked(self) -> bool {
        matches!(
            self,
            RollValue::Fixed(Sentinel::Impossible | Sentinel::AutomaticFail | Sentinel::CheckFalse)
        )
    }
}

impl std::fmt::Display for RollValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RollValue::Value(v) if *v > -1 => write!(f, "+{v}"),
            RollValue::Value(v) => write!(f, "{v}"),
            RollValue::Fixed(Sentinel::Impossible) => f.write_str("Impossible"),
            RollValue::Fixed(Sentinel::AutomaticFail) => f.write_str("Automatic Failure"),
            RollValue::Fixed(Sentinel::CheckFalse) => f.write_str("Check False"),
            RollValue::Fixed(Sentinel::AutomaticSuccess) => f.write_str("Automatic Success"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modifier {
    pub value: i32,
    pub desc: String,
}

/// Base number plus ordered modifiers. Once a sentinel is applied the
/// numeric modifiers stop mattering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetRoll {
    modifiers: SmallVec<[Modifier; 4]>,
    sentinel: Option<(Sentinel, String)>,
}

impl TargetRoll {
    pub fn new(value: i32, desc: impl Into<String>) -> Self {
        let mut roll = Self::default();
        roll.add_modifier(value, desc);
        roll
    }

    pub fn fixed(sentinel: Sentinel, reason: impl Into<String>) -> Self {
        let mut roll = Self::default();
        roll.set_sentinel(sentinel, reason);
        roll
    }

    pub fn impossible(reason: impl Into<String>) -> Self {
        Self::fixed(Sentinel::Impossible, reason)
    }

    pub fn add_modifier(&mut self, value: i32, desc: impl Into<String>) {
        self.modifiers.push(Modifier {
            value,
            desc: desc.into(),
        });
    }

    pub fn set_sentinel(&mut self, sentinel: Sentinel, reason: impl Into<String>) {
        let replaces = match &self.sentinel {
            Some((current, _)) => sentinel > *current,
            None => true,
        };
        if replaces {
            self.sentinel = Some((sentinel, reason.into()));
        }
    }

    /// Append every modifier and the sentinel (if any) of `other`.
    pub fn append(&mut self, other: &TargetRoll) {
        self.modifiers.extend(other.modifiers.iter().cloned());
        if let Some((sentinel, reason)) = &other.sentinel {
            self.set_sentinel(*sentinel, reason.clone());
        }
    }

    pub fn value(&self) -> RollValue {
        match &self.sentinel {
            Some((sentinel, _)) => RollValue::Fixed(*sentinel),
            None => RollValue::Value(self.modifiers.iter().map(|m| m.value).sum()),
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.value().is_blocked()
    }

    pub fn is_impossible(&self) -> bool {
        matches!(self.sentinel, Some((Sentinel::Impossible, _)))
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    /// Human-facing explanation: the sentinel reason, or the modifiers
    /// joined with " + ".
    pub fn desc(&self) -> String {
        if let Some((_, reason)) = &self.sentinel {
            return reason.clone();
        }
        self.modifiers
            .iter()
            .map(|m| format!("{} ({})", m.value, m.desc))
            .collect::<Vec<_>>()
            .join(" + ")
    }
}
