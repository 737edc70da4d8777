// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! JSON export of simulation traces
//!
//! Arrays are stored as a shape plus row-major data so that any reader can
//! rebuild them without ndarray. JSON has no NaN or infinity, so those samples
//! (a diverged BOLD trace, for one) are written as the strings `"NaN"`, `"inf"`
//! and `"-inf"`.

use std::path::Path;

use meanfield_engine::{ParameterCombination, SimulationOutput, SweepResult};
use ndarray::{ArrayBase, Data, Dimension};
use serde::{Deserialize, Serialize};

/// A dense array as shape and row-major values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayRecord {
    pub shape: Vec<usize>,
    #[serde(with = "samples")]
    pub data: Vec<f32>,
}

/// Sample encoding that keeps non-finite values
mod samples {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum Sample {
        Number(f32),
        Text(String),
    }

    impl From<f32> for Sample {
        fn from(value: f32) -> Self {
            if value.is_finite() {
                Sample::Number(value)
            } else {
                Sample::Text(value.to_string())
            }
        }
    }

    pub fn serialize<S: Serializer>(values: &[f32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|&value| Sample::from(value)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f32>, D::Error> {
        Vec::<Sample>::deserialize(deserializer)?
            .into_iter()
            .map(|sample| match sample {
                Sample::Number(value) => Ok(value),
                Sample::Text(text) => text
                    .parse::<f32>()
                    .map_err(|_| D::Error::custom(format!("invalid sample: {text:?}"))),
            })
            .collect()
    }
}

impl ArrayRecord {
    pub fn from_array<S, D>(array: &ArrayBase<S, D>) -> Self
    where
        S: Data<Elem = f32>,
        D: Dimension,
    {
        Self {
            shape: array.shape().to_vec(),
            data: array.iter().copied().collect(),
        }
    }
}

/// Traces of one simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Sweep values of this run, empty for a single simulation
    pub parameters: Vec<(String, f64)>,
    pub tavg: ArrayRecord,
    pub bold: ArrayRecord,
}

impl RunRecord {
    pub fn from_output(output: &SimulationOutput) -> Self {
        Self {
            parameters: Vec::new(),
            tavg: ArrayRecord::from_array(&output.tavg),
            bold: ArrayRecord::from_array(&output.bold),
        }
    }

    pub fn from_combination(combination: &ParameterCombination, output: &SimulationOutput) -> Self {
        Self {
            parameters: combination
                .values
                .iter()
                .map(|(parameter, value)| (parameter.name().to_string(), *value))
                .collect(),
            ..Self::from_output(output)
        }
    }
}

/// Everything written by one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFile {
    pub version: String,
    pub runs: Vec<RunRecord>,
}

impl OutputFile {
    pub fn single(output: &SimulationOutput) -> Self {
        Self {
            version: crate::VERSION.to_string(),
            runs: vec![RunRecord::from_output(output)],
        }
    }

    pub fn sweep(result: &SweepResult) -> Self {
        Self {
            version: crate::VERSION.to_string(),
            runs: result
                .combinations
                .iter()
                .zip(&result.results)
                .map(|(combination, output)| RunRecord::from_combination(combination, output))
                .collect(),
        }
    }

    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        use anyhow::Context;

        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        serde_json::to_writer(std::io::BufWriter::new(file), self)
            .with_context(|| format!("Failed to write output file: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    fn output() -> SimulationOutput {
        SimulationOutput {
            tavg: Array3::from_shape_fn((2, 2, 3), |(t, v, n)| (t * 6 + v * 3 + n) as f32),
            bold: array![[0.5, 0.25, 0.125]],
        }
    }

    #[test]
    fn test_array_record_is_row_major() {
        let record = ArrayRecord::from_array(&output().tavg);
        assert_eq!(record.shape, vec![2, 2, 3]);
        assert_eq!(record.data, (0..12).map(|x| x as f32).collect::<Vec<_>>());
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let file = OutputFile::single(&output());
        file.write(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: OutputFile = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed, file);
        assert!(parsed.runs[0].parameters.is_empty());
        assert_eq!(parsed.runs[0].bold.shape, vec![1, 3]);
    }

    #[test]
    fn test_non_finite_samples_survive_a_file_round_trip() {
        let mut diverged = output();
        diverged.bold = array![[f32::NAN, f32::INFINITY, f32::NEG_INFINITY]];
        diverged.tavg[[1, 0, 2]] = -0.0;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diverged.json");
        let file = OutputFile::single(&diverged);
        file.write(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains(r#"["NaN","inf","-inf"]"#), "{}", contents);
        let parsed: OutputFile = serde_json::from_str(&contents).unwrap();

        let bits = |record: &ArrayRecord| record.data.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&parsed.runs[0].bold), bits(&file.runs[0].bold));
        assert_eq!(bits(&parsed.runs[0].tavg), bits(&file.runs[0].tavg));
    }

    #[test]
    fn test_unknown_sample_text_is_rejected() {
        let json = r#"{"shape":[2],"data":[1.0,"lots"]}"#;
        assert!(serde_json::from_str::<ArrayRecord>(json).is_err());
    }
}
