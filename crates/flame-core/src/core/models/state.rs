use super::charge_state::{ChargeState, rms_of};
use super::particle::Particle;
use crate::core::math::matrix::outer;
use crate::core::math::{PS_DIM, PhaseMatrix, PhaseVector};
use std::fmt;

/// Weighted first and second moments of all charge states taken together.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub moment0: PhaseVector,
    pub moment1: PhaseMatrix,
    pub rms: PhaseVector,
}

/// Names accepted by [`State::scalar`].
pub const SCALAR_NAMES: &[&str] = &[
    "pos",
    "ref_IonZ",
    "ref_IonQ",
    "ref_IonEs",
    "ref_IonEk",
    "ref_IonW",
    "ref_gamma",
    "ref_beta",
    "ref_bg",
    "ref_SampleIonK",
    "ref_phis",
    "real_IonZ",
    "real_IonQ",
    "real_IonEs",
    "real_IonEk",
    "real_IonW",
    "real_gamma",
    "real_beta",
    "real_bg",
    "real_SampleIonK",
    "real_phis",
];

/// Names accepted by [`State::array`].
pub const ARRAY_NAMES: &[&str] = &[
    "moment0",
    "moment1",
    "moment0_rms",
    "moment0_env",
    "moment1_env",
    "moment0_rms_env",
];

/// The beam at one point of the lattice.
///
/// Holds the design reference particle and one [`ChargeState`] per ion charge
/// state (never empty). All contents are owned, so `clone` yields an
/// independent snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    reference: Particle,
    charge_states: Vec<ChargeState>,
    pos: f64,
}

impl State {
    /// Returns `None` when `charge_states` is empty.
    pub fn new(reference: Particle, charge_states: Vec<ChargeState>) -> Option<Self> {
        if charge_states.is_empty() {
            return None;
        }
        Some(Self {
            pos: reference.pos,
            reference,
            charge_states,
        })
    }

    pub fn reference(&self) -> &Particle {
        &self.reference
    }

    pub fn charge_states(&self) -> &[ChargeState] {
        &self.charge_states
    }

    pub fn charge_state(&self, index: usize) -> Option<&ChargeState> {
        self.charge_states.get(index)
    }

    pub fn charge_state_mut(&mut self, index: usize) -> Option<&mut ChargeState> {
        self.charge_states.get_mut(index)
    }

    pub fn ncharge(&self) -> usize {
        self.charge_states.len()
    }

    pub fn pos(&self) -> f64 {
        self.pos
    }

    /// Replaces reference and charge states in one step. An empty list is ignored
    /// and reported as `false`.
    pub(crate) fn commit(&mut self, reference: Particle, charge_states: Vec<ChargeState>) -> bool {
        if charge_states.is_empty() {
            return false;
        }
        self.pos = reference.pos;
        self.reference = reference;
        self.charge_states = charge_states;
        true
    }

    /// Weight-averaged centroid and covariance over all charge states, the
    /// latter including the spread of the individual centroids. Equal weights are
    /// used if the populations sum to zero.
    pub fn envelope(&self) -> Envelope {
        let total: f64 = self.charge_states.iter().map(|cs| cs.weight).sum();
        let uniform = total == 0.0;
        let n = self.charge_states.len() as f64;
        let weight = |cs: &ChargeState| if uniform { 1.0 / n } else { cs.weight / total };

        let moment0 = self
            .charge_states
            .iter()
            .fold(PhaseVector::zeros(), |acc, cs| acc + cs.moment0 * weight(cs));

        let moment1 = self
            .charge_states
            .iter()
            .fold(PhaseMatrix::zeros(), |acc, cs| {
                let offset = cs.moment0 - moment0;
                acc + (cs.moment1 + outer(&offset, &offset)) * weight(cs)
            });

        Envelope {
            rms: rms_of(&moment1),
            moment0,
            moment1,
        }
    }

    /// Named scalar read access. `real_*` refers to the first charge state.
    pub fn scalar(&self, name: &str) -> Option<f64> {
        if name == "pos" {
            return Some(self.pos);
        }
        let (particle, field) = if let Some(field) = name.strip_prefix("ref_") {
            (&self.reference, field)
        } else if let Some(field) = name.strip_prefix("real_") {
            (&self.charge_states.first()?.real, field)
        } else {
            return None;
        };
        let value = match field {
            "IonZ" => particle.ion_z,
            "IonQ" => particle.ion_q(),
            "IonEs" => particle.ion_es,
            "IonEk" => particle.ion_ek,
            "IonW" => particle.ion_w(),
            "gamma" => particle.gamma(),
            "beta" => particle.beta(),
            "bg" => particle.bg(),
            "SampleIonK" => particle.sample_ion_k(),
            "phis" => particle.phis,
            _ => return None,
        };
        Some(value)
    }

    /// Named array read access. Per-charge-state arrays refer to the first
    /// charge state; matrices are flattened row-major.
    pub fn array(&self, name: &str) -> Option<Vec<f64>> {
        let first = self.charge_states.first()?;
        let values = match name {
            "moment0" => first.moment0.iter().copied().collect(),
            "moment1" => row_major(&first.moment1),
            "moment0_rms" => first.moment0_rms().iter().copied().collect(),
            "moment0_env" => self.envelope().moment0.iter().copied().collect(),
            "moment1_env" => row_major(&self.envelope().moment1),
            "moment0_rms_env" => self.envelope().rms.iter().copied().collect(),
            _ => return None,
        };
        Some(values)
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        SCALAR_NAMES.iter().chain(ARRAY_NAMES.iter()).copied()
    }
}

fn row_major(m: &PhaseMatrix) -> Vec<f64> {
    (0..PS_DIM)
        .flat_map(|i| (0..PS_DIM).map(move |j| m[(i, j)]))
        .collect()
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "State: pos = {:.6e} m, ref IonEk = {:.6e} eV/u, ref IonZ = {:.6e}, ncharge = {}",
            self.pos,
            self.reference.ion_ek,
            self.reference.ion_z,
            self.charge_states.len()
        )?;
        for (i, cs) in self.charge_states.iter().enumerate() {
            writeln!(
                f,
                "  [{i}] IonZ = {:.6e}, NCharge = {:.6e}, IonEk = {:.6e} eV/u",
                cs.real.ion_z, cs.weight, cs.real.ion_ek
            )?;
            write!(f, "    moment0:")?;
            for x in cs.moment0.iter() {
                write!(f, " {x:13.6e}")?;
            }
            writeln!(f)?;
            writeln!(f, "    moment1:")?;
            for row in cs.moment1.row_iter() {
                write!(f, "     ")?;
                for x in row.iter() {
                    write!(f, " {x:13.6e}")?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::matrix::origin;
    use crate::core::math::{PS_1, PS_PX, PS_X};

    const TOLERANCE: f64 = 1e-12;

    fn diag_state(weights: &[f64], offsets: &[f64]) -> State {
        let reference = Particle::new(931.494e6, 1.0e6, 0.25);
        let charge_states = weights
            .iter()
            .zip(offsets)
            .map(|(w, dx)| {
                let mut m0 = origin();
                m0[PS_X] = *dx;
                let mut m1 = PhaseMatrix::zeros();
                m1[(PS_X, PS_X)] = 1.0;
                m1[(PS_PX, PS_PX)] = 1e-6;
                ChargeState::new(reference, *w, m0, m1)
            })
            .collect();
        State::new(reference, charge_states).unwrap()
    }

    #[test]
    fn new_rejects_empty_charge_state_list() {
        assert!(State::new(Particle::default(), Vec::new()).is_none());
    }

    #[test]
    fn envelope_of_single_state_is_that_state() {
        let state = diag_state(&[1.0], &[0.5]);
        let env = state.envelope();
        assert_eq!(env.moment0, state.charge_states()[0].moment0);
        assert_eq!(env.moment1, state.charge_states()[0].moment1);
    }

    #[test]
    fn envelope_includes_centroid_spread() {
        let state = diag_state(&[1.0, 1.0], &[-1.0, 1.0]);
        let env = state.envelope();
        assert!(env.moment0[PS_X].abs() < TOLERANCE);
        assert_eq!(env.moment0[PS_1], 1.0);
        assert!((env.moment1[(PS_X, PS_X)] - 2.0).abs() < TOLERANCE);
        assert_eq!(env.moment1[(PS_1, PS_1)], 0.0);
        assert!((env.rms[PS_X] - 2.0_f64.sqrt()).abs() < TOLERANCE);
    }

    #[test]
    fn envelope_weights_by_population() {
        let state = diag_state(&[3.0, 1.0], &[0.0, 4.0]);
        assert!((state.envelope().moment0[PS_X] - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn zero_total_weight_falls_back_to_uniform() {
        let state = diag_state(&[0.0, 0.0], &[0.0, 2.0]);
        assert!((state.envelope().moment0[PS_X] - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn scalar_lookup_covers_reference_and_first_charge_state() {
        let state = diag_state(&[1.0], &[0.0]);
        let r = state.reference();
        assert_eq!(state.scalar("ref_IonW"), Some(r.ion_w()));
        assert_eq!(state.scalar("real_IonEk"), Some(1.0e6));
        assert_eq!(state.scalar("pos"), Some(0.0));
        assert_eq!(state.scalar("ref_bogus"), None);
        assert_eq!(state.scalar("bogus"), None);
    }

    #[test]
    fn array_lookup_flattens_row_major() {
        let state = diag_state(&[1.0], &[0.5]);
        let m1 = state.array("moment1").unwrap();
        assert_eq!(m1.len(), PS_DIM * PS_DIM);
        assert_eq!(m1[PS_PX * PS_DIM + PS_PX], 1e-6);
        assert_eq!(state.array("moment0").unwrap()[PS_X], 0.5);
        assert!(state.array("unknown").is_none());
    }

    #[test]
    fn every_listed_name_resolves() {
        let state = diag_state(&[1.0], &[0.0]);
        for name in SCALAR_NAMES {
            assert!(state.scalar(name).is_some(), "{name}");
        }
        for name in ARRAY_NAMES {
            assert!(state.array(name).is_some(), "{name}");
        }
        assert_eq!(State::names().count(), SCALAR_NAMES.len() + ARRAY_NAMES.len());
    }

    #[test]
    fn clone_is_independent_of_original() {
        let mut state = diag_state(&[1.0], &[0.0]);
        let snapshot = state.clone();
        state.charge_state_mut(0).unwrap().moment0[PS_X] = 9.0;
        assert_eq!(snapshot.charge_states()[0].moment0[PS_X], 0.0);
    }

    #[test]
    fn display_mentions_each_charge_state() {
        let state = diag_state(&[1.0, 2.0], &[0.0, 0.0]);
        let text = state.to_string();
        assert!(text.contains("ncharge = 2"));
        assert!(text.contains("[1]"));
        assert!(text.contains("moment1:"));
    }
}
