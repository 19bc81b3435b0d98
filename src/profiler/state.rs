use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Upper bound on the number of spans a recorder keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaxEventCount {
    Bounded(u64),
    #[default]
    Unbounded,
}

impl MaxEventCount {
    pub fn allows(&self, count: u64) -> bool {
        match self {
            MaxEventCount::Bounded(max) => count < *max,
            MaxEventCount::Unbounded => true,
        }
    }
}

impl From<Option<u64>> for MaxEventCount {
    fn from(value: Option<u64>) -> Self {
        value.map_or(MaxEventCount::Unbounded, MaxEventCount::Bounded)
    }
}

impl From<u64> for MaxEventCount {
    fn from(value: u64) -> Self {
        MaxEventCount::Bounded(value)
    }
}

/// Unbounded is written as `null`.
impl Serialize for MaxEventCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MaxEventCount::Bounded(max) => serializer.serialize_some(max),
            MaxEventCount::Unbounded => serializer.serialize_none(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMaxEventCount {
    Count(u64),
    Float(f64),
    Sentinel(String),
}

/// Also accepts `"inf"`/`"Infinity"` and whole floats from older checkpoints.
impl<'de> Deserialize<'de> for MaxEventCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        match Option::<RawMaxEventCount>::deserialize(deserializer)? {
            None => Ok(MaxEventCount::Unbounded),
            Some(RawMaxEventCount::Count(max)) => Ok(MaxEventCount::Bounded(max)),
            Some(RawMaxEventCount::Float(max)) if max.is_infinite() && max > 0.0 => {
                Ok(MaxEventCount::Unbounded)
            }
            Some(RawMaxEventCount::Float(max)) if max >= 0.0 && max.fract() == 0.0 => {
                Ok(MaxEventCount::Bounded(max as u64))
            }
            Some(RawMaxEventCount::Float(max)) => Err(D::Error::custom(format!(
                "max event count must be a non-negative integer, got {max}"
            ))),
            Some(RawMaxEventCount::Sentinel(text)) => match text.to_ascii_lowercase().as_str() {
                "inf" | "infinity" => Ok(MaxEventCount::Unbounded),
                _ => Err(D::Error::custom(format!(
                    "unknown max event count sentinel {text:?}"
                ))),
            },
        }
    }
}

/// Restartable snapshot of a `ChromeTracer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecorderState {
    #[serde(rename = "_enable")]
    pub enable: bool,
    /// JSON text of the event array.
    #[serde(rename = "_event_list")]
    pub event_list: String,
    #[serde(rename = "_max_event_count")]
    pub max_event_count: MaxEventCount,
    #[serde(rename = "_event_count")]
    pub event_count: u64,
}

impl RecorderState {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
