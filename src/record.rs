//! Persisted run record.
//!
//! JSON has no representation for infinities or NaN, and an objective may
//! legitimately be infinite (the best objective is `+inf` before the first
//! evaluation). Non-finite objective values are therefore written as the
//! strings `"inf"`, `"-inf"` and `"NaN"`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Accepted/rejected history and best point of an annealing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnealRecord {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub param_names: Vec<String>,
    pub param_hist_accepted: Vec<Vec<f64>>,
    #[serde(with = "float_seq")]
    pub f_param_hist_accepted: Vec<f64>,
    pub param_hist_rejected: Vec<Vec<f64>>,
    #[serde(with = "float_seq")]
    pub f_param_hist_rejected: Vec<f64>,
    pub x_best: Vec<f64>,
    #[serde(with = "float")]
    pub f_x_best: f64,
}

impl AnnealRecord {
    /// Writes the record to `path`, truncating any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum FloatRepr {
    Number(f64),
    Text(String),
}

impl FloatRepr {
    fn from_f64(v: f64) -> Self {
        if v.is_finite() {
            FloatRepr::Number(v)
        } else {
            // Display gives "inf", "-inf" and "NaN", all of which parse back.
            FloatRepr::Text(v.to_string())
        }
    }

    fn into_f64<E: serde::de::Error>(self) -> std::result::Result<f64, E> {
        match self {
            FloatRepr::Number(v) => Ok(v),
            FloatRepr::Text(s) => s
                .parse()
                .map_err(|_| E::custom(format!("invalid float {s:?}"))),
        }
    }
}

mod float {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::FloatRepr;

    pub fn serialize<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
        FloatRepr::from_f64(*v).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        FloatRepr::deserialize(d)?.into_f64()
    }
}

mod float_seq {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::FloatRepr;

    pub fn serialize<S: Serializer>(v: &[f64], s: S) -> Result<S::Ok, S::Error> {
        let mut seq = s.serialize_seq(Some(v.len()))?;
        for &x in v {
            seq.serialize_element(&FloatRepr::from_f64(x))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<f64>, D::Error> {
        Vec::<FloatRepr>::deserialize(d)?
            .into_iter()
            .map(FloatRepr::into_f64)
            .collect()
    }
}
