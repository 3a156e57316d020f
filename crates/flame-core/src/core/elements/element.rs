use super::alignment::Alignment;
use super::bend::{EDipole, SBend};
use super::cavity::RfCavity;
use super::drift::{Drift, Marker};
use super::error::ElementError;
use super::generic::Generic;
use super::kind::ElementKind;
use super::orbtrim::OrbTrim;
use super::physics::{ElementPhysics, Transfer, TransferContext};
use super::quadrupole::{EQuad, Quadrupole};
use super::sextupole::Sextupole;
use super::solenoid::Solenoid;
use super::source::Source;
use super::stripper::Stripper;
use crate::core::config::{ConfigError, ElementConfig, ParamMap};
use crate::core::math::PhaseMatrix;
use crate::core::math::matrix::{apply, check_matrix};
use crate::core::models::Particle;

/// Physics model of an element, one variant per type tag.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementModel {
    Marker(Marker),
    Source(Source),
    Drift(Drift),
    SBend(SBend),
    EDipole(EDipole),
    Quadrupole(Quadrupole),
    EQuad(EQuad),
    Solenoid(Solenoid),
    Sextupole(Sextupole),
    RfCavity(RfCavity),
    Stripper(Stripper),
    OrbTrim(OrbTrim),
    Generic(Generic),
}

impl ElementModel {
    fn physics(&self) -> &dyn ElementPhysics {
        match self {
            ElementModel::Marker(m) => m,
            ElementModel::Source(m) => m,
            ElementModel::Drift(m) => m,
            ElementModel::SBend(m) => m,
            ElementModel::EDipole(m) => m,
            ElementModel::Quadrupole(m) => m,
            ElementModel::EQuad(m) => m,
            ElementModel::Solenoid(m) => m,
            ElementModel::Sextupole(m) => m,
            ElementModel::RfCavity(m) => m,
            ElementModel::Stripper(m) => m,
            ElementModel::OrbTrim(m) => m,
            ElementModel::Generic(m) => m,
        }
    }
}

/// A configured lattice element.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: String,
    kind: ElementKind,
    alignment: Alignment,
    model: ElementModel,
}

impl Element {
    /// Builds the model for `config`, reading missing parameters from `globals`.
    pub fn build(config: &ElementConfig, globals: Option<&ParamMap>) -> Result<Self, ConfigError> {
        let kind = ElementKind::from_tag(&config.type_name).ok_or_else(|| {
            ConfigError::UnknownElementType {
                element: config.name.clone(),
                type_name: config.type_name.clone(),
            }
        })?;
        let params = config.params(globals);

        let model = match kind {
            ElementKind::Marker => ElementModel::Marker(Marker),
            ElementKind::Source => ElementModel::Source(Source::from_params(&params)?),
            ElementKind::Drift => ElementModel::Drift(Drift::from_params(&params)?),
            ElementKind::SBend => ElementModel::SBend(SBend::from_params(&params)?),
            ElementKind::EDipole => ElementModel::EDipole(EDipole::from_params(&params)?),
            ElementKind::Quadrupole => ElementModel::Quadrupole(Quadrupole::from_params(&params)?),
            ElementKind::EQuad => ElementModel::EQuad(EQuad::from_params(&params)?),
            ElementKind::Solenoid => ElementModel::Solenoid(Solenoid::from_params(&params)?),
            ElementKind::Sextupole => ElementModel::Sextupole(Sextupole::from_params(&params)?),
            ElementKind::RfCavity => ElementModel::RfCavity(RfCavity::from_params(&params)?),
            ElementKind::Stripper => ElementModel::Stripper(Stripper::from_params(&params)?),
            ElementKind::OrbTrim => ElementModel::OrbTrim(OrbTrim::from_params(&params)?),
            ElementKind::Generic => ElementModel::Generic(Generic::from_params(&params)?),
        };

        Ok(Self {
            name: config.name.clone(),
            kind,
            alignment: Alignment::from_params(&params)?,
            model,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn alignment(&self) -> &Alignment {
        &self.alignment
    }

    pub fn model(&self) -> &ElementModel {
        &self.model
    }

    pub fn length(&self) -> f64 {
        self.model.physics().length()
    }

    /// Whether the transfer matrix depends on the centroid it is applied to.
    pub fn depends_on_centroid(&self) -> bool {
        matches!(self.model, ElementModel::Sextupole(_))
    }

    /// Advances the design reference through the element.
    pub fn advance(&self, design_in: &Particle) -> Result<Particle, ElementError> {
        self.model.physics().advance(design_in, design_in)
    }

    /// Transfer matrix in beamline coordinates and the exit actual particle for
    /// one charge state. `ctx.centroid` is given in beamline coordinates.
    pub fn transfer(&self, ctx: &TransferContext<'_>) -> Result<Transfer, ElementError> {
        let transfer = if self.alignment.is_ideal() {
            self.model.physics().transfer(ctx)?
        } else {
            let local = apply(&self.alignment.entrance_map(), ctx.centroid)?;
            let inner = self.model.physics().transfer(&TransferContext {
                centroid: &local,
                ..*ctx
            })?;
            Transfer {
                matrix: self.alignment.wrap(&inner.matrix)?,
                particle: inner.particle,
            }
        };
        check_matrix(&transfer.matrix, "element transfer matrix")?;
        Ok(transfer)
    }

    /// Transfer matrix only; see [`Element::transfer`].
    pub fn transfer_matrix(&self, ctx: &TransferContext<'_>) -> Result<PhaseMatrix, ElementError> {
        Ok(self.transfer(ctx)?.matrix)
    }
}
