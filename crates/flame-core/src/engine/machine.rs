use super::cache::{TransferCache, TransferKey};
use super::error::EngineError;
use super::observer::Observer;
use crate::core::config::lattice::GLOBAL_SCOPE;
use crate::core::config::{ConfigError, LatticeConfig, ParamMap, Params};
use crate::core::elements::{
    Element, ElementError, ElementKind, ElementModel, TransferContext, initial_state,
};
use crate::core::math::constants::MEV_TO_EV;
use crate::core::math::matrix::{apply, check_matrix, check_vector, transform_covariance};
use crate::core::math::{PS_PS, PS_S};
use crate::core::models::{ChargeState, Particle, State};
use tracing::{debug, info, trace, warn};

/// Selects lattice elements for [`Machine::find`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementQuery<'a> {
    Name(&'a str),
    Type(&'a str),
    Index(usize),
}

impl<'a> From<&'a str> for ElementQuery<'a> {
    fn from(name: &'a str) -> Self {
        ElementQuery::Name(name)
    }
}

impl From<usize> for ElementQuery<'_> {
    fn from(index: usize) -> Self {
        ElementQuery::Index(index)
    }
}

/// A configured lattice that advances beam states through its elements.
#[derive(Debug, Clone)]
pub struct Machine {
    config: LatticeConfig,
    elements: Vec<Element>,
    caches: Vec<TransferCache>,
}

impl Machine {
    pub fn new(config: LatticeConfig) -> Result<Self, EngineError> {
        validate_globals(&config.global_params())?;
        let elements = config
            .elements
            .iter()
            .map(|ec| Element::build(ec, Some(&config.globals)))
            .collect::<Result<Vec<_>, _>>()?;
        let caches = vec![TransferCache::new(); elements.len()];

        let machine = Self {
            config,
            elements,
            caches,
        };
        info!(
            elements = machine.len(),
            length_m = machine.total_length(),
            "Machine configured"
        );
        Ok(machine)
    }

    /// The lattice description, including applied reconfigurations.
    pub fn conf(&self) -> &LatticeConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn element(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Sum of all element lengths [m].
    pub fn total_length(&self) -> f64 {
        self.elements.iter().map(Element::length).sum()
    }

    /// Indices of the elements matching `query`, in lattice order.
    pub fn find<'a>(&self, query: impl Into<ElementQuery<'a>>) -> Vec<usize> {
        let query = query.into();
        self.elements
            .iter()
            .enumerate()
            .filter(|(i, e)| match query {
                ElementQuery::Name(name) => e.name() == name,
                ElementQuery::Type(tag) => {
                    ElementKind::from_tag(tag).is_some_and(|kind| e.kind() == kind)
                }
                ElementQuery::Index(index) => *i == index,
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Merges `overrides` into element `index` and rebuilds it. On failure the
    /// element and its description are left unchanged.
    pub fn reconfigure(&mut self, index: usize, overrides: &ParamMap) -> Result<(), EngineError> {
        let len = self.len();
        let current = self
            .config
            .elements
            .get(index)
            .ok_or(EngineError::ElementIndexOutOfRange { index, len })?;
        let merged = current.merged(overrides);
        let element = Element::build(&merged, Some(&self.config.globals))?;

        debug!(
            index,
            name = element.name(),
            keys = overrides.len(),
            "Element reconfigured"
        );
        self.config.elements[index] = merged;
        self.elements[index] = element;
        self.caches[index].clear();
        Ok(())
    }

    /// Builds a beam state from the lattice-wide parameters with `overrides` applied.
    pub fn alloc_state(&self, overrides: &ParamMap) -> Result<State, EngineError> {
        let mut merged = self.config.globals.clone();
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }
        let state = initial_state(&Params::new(GLOBAL_SCOPE, &merged, None))?;
        Ok(state)
    }

    /// Applies elements `[start, start + max)` (clamped to the lattice) to `state`
    /// and returns how many were applied. Each element is committed only after
    /// every charge state has been computed, so on error `state` holds the result
    /// of the previous element.
    pub fn propagate(
        &self,
        state: &mut State,
        start: usize,
        max: usize,
        mut observer: Option<&mut dyn Observer>,
    ) -> Result<usize, EngineError> {
        let len = self.len();
        if start > len {
            warn!(start, len, "Propagation starts beyond the end of the lattice");
        }
        let end = start.saturating_add(max).min(len);
        if start >= end {
            return Ok(0);
        }

        for index in start..end {
            let element = &self.elements[index];
            let (reference, charge_states) =
                self.step(index, state)
                    .map_err(|source| EngineError::Element {
                        index,
                        name: element.name().to_string(),
                        source,
                    })?;
            if !state.commit(reference, charge_states) {
                return Err(EngineError::EmptyChargeStates);
            }
            trace!(index, name = element.name(), pos = state.pos(), "Element applied");
            if let Some(observer) = observer.as_deref_mut() {
                observer.observe(index, state);
            }
        }
        Ok(end - start)
    }

    fn step(
        &self,
        index: usize,
        state: &State,
    ) -> Result<(Particle, Vec<ChargeState>), ElementError> {
        let element = &self.elements[index];
        match element.model() {
            ElementModel::Source(source) => Ok(restart(&source.initial, state.pos())),
            ElementModel::Stripper(stripper) => stripper.strip(state),
            _ => self.transport(index, state),
        }
    }

    fn transport(
        &self,
        index: usize,
        state: &State,
    ) -> Result<(Particle, Vec<ChargeState>), ElementError> {
        let element = &self.elements[index];
        let cache = &self.caches[index];
        let design_in = state.reference();
        let design_out = cache.advance(design_in, || element.advance(design_in))?;
        let rederive_longitudinal = element.kind() == ElementKind::RfCavity;

        let mut charge_states = Vec::with_capacity(state.ncharge());
        for cs in state.charge_states() {
            let ctx = TransferContext {
                design: design_in,
                actual: &cs.real,
                centroid: &cs.moment0,
                drive_phase: rederive_longitudinal.then_some(design_out.last_caviphi0),
            };
            let key = TransferKey::new(&ctx, element.depends_on_centroid());
            let transfer = cache.transfer(key, || element.transfer(&ctx))?;

            let mut moment0 = apply(&transfer.matrix, &cs.moment0)?;
            let moment1 = transform_covariance(&transfer.matrix, &cs.moment1)?;
            if rederive_longitudinal {
                moment0[PS_S] = transfer.particle.phis - design_out.phis;
                moment0[PS_PS] = (transfer.particle.ion_ek - design_out.ion_ek) / MEV_TO_EV;
            }
            let next = ChargeState::new(transfer.particle, cs.weight, moment0, moment1);
            check_vector(&next.moment0, "propagated centroid")?;
            check_matrix(&next.moment1, "propagated covariance")?;
            charge_states.push(next);
        }
        Ok((design_out, charge_states))
    }
}

/// The source's initial beam, placed at the current lattice position.
fn restart(initial: &State, pos: f64) -> (Particle, Vec<ChargeState>) {
    let reference = Particle {
        pos,
        ..*initial.reference()
    };
    let charge_states = initial
        .charge_states()
        .iter()
        .map(|cs| ChargeState {
            real: Particle { pos, ..cs.real },
            ..cs.clone()
        })
        .collect();
    (reference, charge_states)
}

/// Checks the beam species given at lattice scope, when present.
fn validate_globals(params: &Params) -> Result<(), ConfigError> {
    if let Some(ion_es) = params.number_opt("IonEs")? {
        if ion_es <= 0.0 {
            return Err(params.invalid("IonEs", "rest energy must be positive"));
        }
    }
    if let Some(ion_z) = params.number_opt("IonZ")? {
        if ion_z == 0.0 {
            return Err(params.invalid("IonZ", "charge-to-mass ratio must be non-zero"));
        }
    }
    if let Some(charges) = params.vector_opt("IonChargeStates")? {
        if charges.is_empty() {
            return Err(params.invalid("IonChargeStates", "at least one charge state is required"));
        }
        if charges.iter().any(|z| *z == 0.0) {
            return Err(params.invalid("IonChargeStates", "charge-to-mass ratio must be non-zero"));
        }
    }
    Ok(())
}
