// SPDX-FileCopyrightText: 2026 roqa contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Conformance checker.
//!
//! Drives every test vector through a protocol session and compares each
//! sample readback against the vector's expected value. A mismatch is
//! recorded, never fatal: the whole sequence runs so the report can show
//! how many vectors failed and where the first failure sits.

use roqa_common::Sample;
use roqa_link::LinkBus;
use roqa_session::Session;

use crate::vectors::TestVector;

/// Outcome of one vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionResult {
    pub vector: TestVector,
    /// Readback value for sample vectors; loads have no response path.
    pub observed: Option<Sample>,
    pub matched: bool,
}

/// Aggregated outcome of a vector run.
#[derive(Debug)]
pub struct Report {
    results: Vec<TransactionResult>,
}

impl Report {
    pub fn results(&self) -> &[TransactionResult] {
        &self.results
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| !r.matched).count()
    }

    /// Index of the first failing vector, if any failed.
    pub fn first_failure(&self) -> Option<usize> {
        self.results.iter().position(|r| !r.matched)
    }

    pub fn passed(&self) -> bool {
        self.results.iter().all(|r| r.matched)
    }
}

/// Run every vector through the session and collect a report.
///
/// Progress is logged every `progress_interval` sample vectors; load
/// vectors do not count toward the interval.
pub fn run_vectors<B: LinkBus>(
    session: &mut Session<B>,
    vectors: &[TestVector],
    progress_interval: u64,
) -> Report {
    let mut results = Vec::with_capacity(vectors.len());
    let mut sample_count: u64 = 0;

    for &vector in vectors {
        let result = match vector {
            TestVector::Load {
                target,
                index,
                value,
            } => {
                session.load(target, index, value);
                TransactionResult {
                    vector,
                    observed: None,
                    matched: true,
                }
            }
            TestVector::Sample {
                scale_factor,
                residual,
                expected,
            } => {
                let observed = session.sample(scale_factor, residual);
                if sample_count % progress_interval.max(1) == 0 {
                    log::info!("Completed sample {}", sample_count);
                }
                sample_count += 1;

                let matched = observed == expected;
                if !matched {
                    log::warn!(
                        "sample mismatch: sf={} qr={}: expected {}, observed {}",
                        scale_factor,
                        residual,
                        expected,
                        observed
                    );
                }
                TransactionResult {
                    vector,
                    observed: Some(observed),
                    matched,
                }
            }
        };
        results.push(result);
    }

    Report { results }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roqa_common::dequant;
    use roqa_common::LinkTiming;
    use roqa_session::LoadTarget;
    use roqa_sim::DeviceModel;

    fn open_session() -> Session<DeviceModel> {
        let mut session = Session::new(DeviceModel::new(), LinkTiming::default());
        session.open();
        session
    }

    #[test]
    fn test_single_sample_vector() {
        let mut session = open_session();
        let vectors = [TestVector::Sample {
            scale_factor: 5,
            residual: 2,
            expected: 345,
        }];
        let report = run_vectors(&mut session, &vectors, 1000);
        assert!(report.passed());
        assert_eq!(report.results()[0].observed, Some(345));
    }

    #[test]
    fn test_vector_text_end_to_end() {
        // The comparison target is the literal expected field from the
        // file, never a recomputed value: "5 2 104" only passes because
        // the preceding loads make the device return exactly 104
        // (345 + (-241 * 8192 >> 13)).
        let text = "h0 -241\nw0 8192\n5 2 104\n";
        let vectors = crate::vectors::parse_vectors(std::io::Cursor::new(text)).unwrap();
        let mut session = open_session();
        let report = run_vectors(&mut session, &vectors, 1000);
        assert!(report.passed());
        assert_eq!(report.results()[2].observed, Some(104));
    }

    #[test]
    fn test_full_table_sweep_matches() {
        // all 128 combinations against a reset device: pure lookup
        let mut vectors = Vec::new();
        for scale_factor in 0..16u8 {
            for residual in 0..8u8 {
                vectors.push(TestVector::Sample {
                    scale_factor,
                    residual,
                    expected: dequant::lookup(scale_factor, residual),
                });
            }
        }
        let mut session = open_session();
        let report = run_vectors(&mut session, &vectors, 1000);
        assert_eq!(report.total(), 128);
        assert_eq!(report.failures(), 0);
        assert!(report.passed());
    }

    #[test]
    fn test_mismatch_recorded_not_fatal() {
        let mut session = open_session();
        let vectors = [
            TestVector::Sample {
                scale_factor: 5,
                residual: 2,
                expected: 999, // wrong on purpose
            },
            TestVector::Sample {
                scale_factor: 5,
                residual: 2,
                expected: 345,
            },
        ];
        let report = run_vectors(&mut session, &vectors, 1000);
        assert!(!report.passed());
        assert_eq!(report.failures(), 1);
        assert_eq!(report.first_failure(), Some(0));
        // the run continued past the failure
        assert!(report.results()[1].matched);
    }

    #[test]
    fn test_loads_then_predicted_sample() {
        // the expected value comes from the vector, and the device's
        // decode combines the loaded state with the table entry
        let mut session = open_session();
        let expected = 345 + ((1234_i64 * 8192) >> 13) as Sample;
        let vectors = [
            TestVector::Load {
                target: LoadTarget::History,
                index: 0,
                value: 1234,
            },
            TestVector::Load {
                target: LoadTarget::Weight,
                index: 0,
                value: 8192,
            },
            TestVector::Sample {
                scale_factor: 5,
                residual: 2,
                expected,
            },
        ];
        let report = run_vectors(&mut session, &vectors, 1000);
        assert!(report.passed());
        assert_eq!(report.results()[2].observed, Some(expected));
    }

    #[test]
    fn test_load_results_have_no_observation() {
        let mut session = open_session();
        let vectors = [TestVector::Load {
            target: LoadTarget::Weight,
            index: 1,
            value: -42,
        }];
        let report = run_vectors(&mut session, &vectors, 1000);
        assert!(report.passed());
        assert_eq!(report.results()[0].observed, None);
    }

    #[test]
    fn test_independent_samples_do_not_interfere() {
        let mut session = open_session();
        let mut vectors = Vec::new();
        for _ in 0..3 {
            vectors.push(TestVector::Sample {
                scale_factor: 9,
                residual: 4,
                expected: 2529,
            });
            vectors.push(TestVector::Sample {
                scale_factor: 2,
                residual: 1,
                expected: -16,
            });
        }
        let report = run_vectors(&mut session, &vectors, 1000);
        assert!(report.passed());
    }
}
