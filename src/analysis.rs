//! Complete analysis of one grasp: force closure and quality, computed independently.

use tracing::warn;
use crate::contact::Contact;
use crate::force_closure::{ForceClosureResult, ForceClosureSolver, LoadCase};
use crate::grasp_error::GraspError;
use crate::grasp_matrix::GraspMatrix;
use crate::parameters::AnalysisConfig;
use crate::quality::{GraspQualityEngine, QualityMetric, Strategy};
use crate::wrench_traits::Dimensionality;

/// Everything needed to analyze a grasp.
#[derive(Debug, Clone)]
pub struct GraspAnalysis {
    pub dimensionality: Dimensionality,
    pub contacts: Vec<Contact>,
    pub load: LoadCase,
    /// Objective weights, one per grasp matrix column. Uniform if not given.
    pub weights: Option<Vec<f64>>,
    pub strategy: Strategy,
    pub config: AnalysisConfig,
}

/// Results of [GraspAnalysis::run]. A failed quality query does not affect the closure verdict.
#[derive(Debug)]
pub struct GraspReport {
    pub grasp: GraspMatrix,
    pub closure: ForceClosureResult,
    pub quality: Result<QualityMetric, GraspError>,
}

impl GraspReport {
    /// Quality metric if it could be computed and the polytope encloses the origin.
    pub fn valid_quality(&self) -> Option<&QualityMetric> {
        self.quality.as_ref().ok().filter(|m| m.encloses_origin)
    }
}

impl GraspAnalysis {
    /// Internal force analysis with uniform weights and the default configuration.
    pub fn new(dimensionality: Dimensionality, contacts: Vec<Contact>) -> Self {
        GraspAnalysis {
            dimensionality,
            contacts,
            load: LoadCase::Internal,
            weights: None,
            strategy: Strategy::Union,
            config: AnalysisConfig::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_load(mut self, load: LoadCase) -> Self {
        self.load = load;
        self
    }

    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    /// Contacts without their own cone side count get the configured one.
    fn configured_contacts(&self) -> Vec<Contact> {
        self.contacts.iter().map(|c| c.clone().with_default_cone_sides(self.config.cone_sides)).collect()
    }

    /// Assemble the grasp matrix, then run the force closure solver and the quality engine.
    /// Fails only on invalid input. Geometry problems of the quality query are kept in the report.
    pub fn run(&self) -> Result<GraspReport, GraspError> {
        self.config.validate()?;
        let contacts = self.configured_contacts();
        let grasp = GraspMatrix::assemble(&contacts, self.dimensionality)?;

        let weights = match &self.weights {
            Some(w) => w.clone(),
            None => ForceClosureSolver::uniform_weights(&grasp),
        };
        let closure = ForceClosureSolver::new(&self.config).analyze_load(&grasp, &weights, &self.load)?;

        let quality = GraspQualityEngine::new(&self.config)
            .polytope_of(&grasp, self.strategy)
            .map(|p| p.metric());
        if let Err(err) = &quality {
            warn!("quality not available: {}", err);
        }
        Ok(GraspReport { grasp, closure, quality })
    }
}
