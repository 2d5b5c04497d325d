//! Supports loading grasp scenarios from YAML files (optional)

use std::path::Path;
use nalgebra::DVector;
use serde::Deserialize;
use serde_saphyr::Options;

use crate::analysis::GraspAnalysis;
use crate::contact::{Contact, ContactModel};
use crate::force_closure::LoadCase;
use crate::frame::ContactPose;
use crate::grasp_error::GraspError;
use crate::parameters::AnalysisConfig;
use crate::quality::Strategy;
use crate::utils::deg;
use crate::wrench_traits::Dimensionality;

#[derive(Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum FileDimensionality {
    Planar,
    Spatial,
}

#[derive(Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum FileModel {
    Frictionless,
    PointWithFriction,
    Tangential,
}

#[derive(Deserialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum FileStrategy {
    Union,
    Minkowski,
}

fn default_model() -> FileModel { FileModel::PointWithFriction }

#[derive(Deserialize)]
struct FileContact {
    pub position: Vec<f64>,
    /// One angle in the plane, three (X, Y, Z sequence) in space
    pub rotation: Vec<f64>,
    #[serde(default)]
    pub friction: f64,
    #[serde(default = "default_model")]
    pub model: FileModel,
    /// Spatial friction cone sides of this contact, `config.cone_sides` if not given
    #[serde(default)]
    pub cone_sides: Option<usize>,
}

/// Overrides for [AnalysisConfig], all optional.
#[derive(Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    pub tolerance: Option<f64>,
    #[serde(default)]
    pub min_coefficient: Option<f64>,
    #[serde(default)]
    pub max_coefficient: Option<f64>,
    #[serde(default)]
    pub cone_sides: Option<usize>,
    #[serde(default)]
    pub torque_scale: Option<f64>,
    #[serde(default)]
    pub minkowski_limit: Option<usize>,
    #[serde(default)]
    pub prune_threshold: Option<usize>,
}

#[derive(Deserialize)]
struct Root {
    pub dimensionality: FileDimensionality,
    pub contacts: Vec<FileContact>,
    #[serde(default)]
    pub load: Option<Vec<f64>>,
    #[serde(default)]
    pub weights: Option<Vec<f64>>,
    #[serde(default)]
    pub strategy: Option<FileStrategy>,
    #[serde(default)]
    pub config: Option<FileConfig>,
}

impl FileConfig {
    fn apply(&self, mut config: AnalysisConfig) -> AnalysisConfig {
        if let Some(v) = self.tolerance { config.tolerance = v; }
        if let Some(v) = self.min_coefficient { config.min_coefficient = v; }
        if self.max_coefficient.is_some() { config.max_coefficient = self.max_coefficient; }
        if let Some(v) = self.cone_sides { config.cone_sides = v; }
        if let Some(v) = self.torque_scale { config.torque_scale = v; }
        if let Some(v) = self.minkowski_limit { config.minkowski_limit = v; }
        if let Some(v) = self.prune_threshold { config.prune_threshold = v; }
        config
    }
}

fn check_length(what: &str, index: usize, expected: usize, found: usize) -> Result<(), GraspError> {
    if expected != found {
        return Err(GraspError::ParseError(format!(
            "contact {}: {} needs {} values (found {})", index, what, expected, found
        )));
    }
    Ok(())
}

fn to_contact(index: usize, fc: &FileContact, dimensionality: Dimensionality) -> Result<Contact, GraspError> {
    let pose = match dimensionality {
        Dimensionality::Planar => {
            check_length("position", index, 2, fc.position.len())?;
            check_length("rotation", index, 1, fc.rotation.len())?;
            ContactPose::planar(fc.position[0], fc.position[1], fc.rotation[0])
        }
        Dimensionality::Spatial => {
            check_length("position", index, 3, fc.position.len())?;
            check_length("rotation", index, 3, fc.rotation.len())?;
            ContactPose::spatial(
                [fc.position[0], fc.position[1], fc.position[2]],
                [fc.rotation[0], fc.rotation[1], fc.rotation[2]],
            )
        }
    };
    let mut contact = match fc.model {
        FileModel::Frictionless => Contact::frictionless(pose),
        FileModel::PointWithFriction => Contact::with_friction(pose, fc.friction),
        FileModel::Tangential => Contact::tangential(pose, fc.friction),
    };
    contact.cone_sides = fc.cone_sides;
    contact.validate()?;
    Ok(contact)
}

impl GraspAnalysis {
    /// Read the grasp scenario from YAML file. YAML file like this is supported:
    /// ```yaml
    /// # Block with three fingers
    /// dimensionality: planar
    /// contacts:
    ///   - position: [0.0, -1.0]
    ///     rotation: [deg(-90)]
    ///     friction: 0.5
    ///     model: point_with_friction
    ///   - position: [-1.0, 1.0]
    ///     rotation: [deg(90)]
    ///     friction: 0.5
    ///   - position: [1.0, 1.0]
    ///     rotation: [deg(90)]
    ///     model: frictionless
    /// load: [0.0, 0.0, 0.0]
    /// strategy: union
    /// config:
    ///   cone_sides: 12
    /// ```
    /// `model` is `frictionless`, `point_with_friction` (default) or `tangential`.
    /// `load`, `weights`, `strategy` and `config` (any subset of [AnalysisConfig] fields) are
    /// optional. Without `load` the internal force case is analyzed.
    ///
    /// YAML extension to parse the deg(angle) function is supported (serde_saphyr).
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, GraspError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, GraspError> {
        let root: Root = serde_saphyr::from_str_with_options(
            contents,
            Options { angle_conversions: true, ..Default::default() }
        ).map_err(|e| GraspError::ParseError(format!("{}", e)))?;

        let dimensionality = match root.dimensionality {
            FileDimensionality::Planar => Dimensionality::Planar,
            FileDimensionality::Spatial => Dimensionality::Spatial,
        };
        if root.contacts.is_empty() {
            return Err(GraspError::ParseError("scenario has no contacts".to_string()));
        }
        let contacts = root.contacts.iter().enumerate()
            .map(|(i, fc)| to_contact(i, fc, dimensionality))
            .collect::<Result<Vec<_>, _>>()?;

        let load = match root.load {
            None => LoadCase::Internal,
            Some(values) => {
                if values.len() != dimensionality.wrench_dim() {
                    return Err(GraspError::ParseError(format!(
                        "load needs {} values (found {})", dimensionality.wrench_dim(), values.len()
                    )));
                }
                LoadCase::External(DVector::from_vec(values))
            }
        };

        let strategy = match root.strategy {
            None | Some(FileStrategy::Union) => Strategy::Union,
            Some(FileStrategy::Minkowski) => Strategy::Minkowski,
        };

        let config = root.config.unwrap_or_default().apply(AnalysisConfig::default());
        config.validate()?;

        Ok(GraspAnalysis { dimensionality, contacts, load, weights: root.weights, strategy, config })
    }

    /// Convert to string yaml representation, readable by [Self::from_yaml_str].
    pub fn to_yaml(&self) -> String {
        let dimensionality = match self.dimensionality {
            Dimensionality::Planar => "planar",
            Dimensionality::Spatial => "spatial",
        };
        let mut yaml = format!("dimensionality: {}\ncontacts:\n", dimensionality);
        for contact in &self.contacts {
            let position = contact.pose.position();
            let position: Vec<String> = match self.dimensionality {
                Dimensionality::Planar => vec![position.x.to_string(), position.y.to_string()],
                Dimensionality::Spatial => position.iter().map(|v| v.to_string()).collect(),
            };
            let rotation: Vec<String> = contact.pose.angles().iter().map(deg).collect();
            let model = match contact.model {
                ContactModel::Frictionless => "frictionless",
                ContactModel::PointWithFriction => "point_with_friction",
                ContactModel::TangentialFriction => "tangential",
            };
            yaml.push_str(&format!(
                "  - position: [{}]\n    rotation: [{}]\n    friction: {}\n    model: {}\n",
                position.join(", "), rotation.join(", "), contact.friction, model
            ));
            if let Some(sides) = contact.cone_sides {
                yaml.push_str(&format!("    cone_sides: {}\n", sides));
            }
        }
        if let LoadCase::External(w) = &self.load {
            let values: Vec<String> = w.iter().map(|v| v.to_string()).collect();
            yaml.push_str(&format!("load: [{}]\n", values.join(", ")));
        }
        if let Some(weights) = &self.weights {
            let values: Vec<String> = weights.iter().map(|v| v.to_string()).collect();
            yaml.push_str(&format!("weights: [{}]\n", values.join(", ")));
        }
        let strategy = match self.strategy {
            Strategy::Union => "union",
            Strategy::Minkowski => "minkowski",
        };
        yaml.push_str(&format!("strategy: {}\n", strategy));
        yaml.push_str(&self.config.to_yaml());
        yaml
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const BLOCK_SPATIAL: &str = "\
dimensionality: spatial
contacts:
  - position: [0.0, -1.0, 0.0]
    rotation: [0, 0, deg(-90)]
    friction: 0.5
    cone_sides: 4
  - position: [-1.0, 1.0, 0.0]
    rotation: [0, 0, deg(90)]
    friction: 0.5
  - position: [1.0, 1.0, 0.0]
    rotation: [0, 0, deg(90)]
    friction: 0.5
config:
  cone_sides: 6
";

    #[test]
    fn test_deg_rotation() {
        for angle in ["deg(-90)", "deg(-90.0)", "deg(-90.0000)"] {
            let yaml = format!(
                "dimensionality: planar\ncontacts:\n  - position: [0.0, -1.0]\n    rotation: [{}]\n    friction: 0.5\n",
                angle
            );
            let analysis = GraspAnalysis::from_yaml_str(&yaml).unwrap();
            let theta = analysis.contacts[0].pose.angles()[0];
            assert!((theta + FRAC_PI_2).abs() < 1e-12, "{}: {}", angle, theta);
        }
    }

    #[test]
    fn test_contact_cone_sides() {
        let analysis = GraspAnalysis::from_yaml_str(BLOCK_SPATIAL).unwrap();
        assert_eq!(analysis.contacts[0].cone_sides, Some(4));
        assert_eq!(analysis.contacts[1].cone_sides, None);
        assert_eq!(analysis.config.cone_sides, 6);
        assert_eq!(analysis.run().unwrap().grasp.ncols(), 4 + 6 + 6);

        let reloaded = GraspAnalysis::from_yaml_str(&analysis.to_yaml()).unwrap();
        let sides: Vec<Option<usize>> = reloaded.contacts.iter().map(|c| c.cone_sides).collect();
        assert_eq!(sides, vec![Some(4), None, None]);
    }
}
