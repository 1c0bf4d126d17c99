//! Check definitions (TOML) and datasets (JSON).
//!
//! A dataset lists feature classes with their geometry kind and features:
//!
//! ```json
//! { "classes": [
//!     { "name": "roads_a", "kind": "polyline",
//!       "features": [ { "id": 1, "wkt": "LINESTRING (0 0, 0 10)",
//!                       "attributes": { "STATE": "A" } } ] } ] }
//! ```
//!
//! A check definition names its kind, maps classes to roles by name and
//! carries the [`EdgeMatchConfig`] table.

use crate::cli::CheckKind;
use crate::error::{CliError, CliResult};
use qa_edgematch::{
    parse_wkt, ClassSchema, EdgeMatchConfig, EdgeMatchLayout, Envelope, GeometryKind,
    MemorySource, Value,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Dataset {
    pub classes: Vec<DatasetClass>,
}

#[derive(Debug, Deserialize)]
pub struct DatasetClass {
    pub name: String,
    pub kind: GeometryKind,
    #[serde(default)]
    pub features: Vec<DatasetFeature>,
}

#[derive(Debug, Deserialize)]
pub struct DatasetFeature {
    pub id: u64,
    pub wkt: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

/// Feature classes loaded into memory, with their names by class index.
pub struct LoadedDataset {
    pub source: MemorySource,
    pub names: Vec<String>,
}

impl LoadedDataset {
    pub fn class_index(&self, name: &str) -> CliResult<usize> {
        self.names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name))
            .ok_or_else(|| CliError::Config(format!("unknown class '{name}'")))
    }

    fn class_indexes(&self, names: &[String]) -> CliResult<Vec<usize>> {
        names.iter().map(|n| self.class_index(n)).collect()
    }
}

pub fn load_dataset(path: &Path) -> CliResult<LoadedDataset> {
    let text = read_file(path)?;
    let dataset: Dataset = serde_json::from_str(&text)?;

    let mut source = MemorySource::new();
    let mut names = Vec::with_capacity(dataset.classes.len());
    for class in dataset.classes {
        let index = source.add_class(ClassSchema::new(class.name.clone(), class.kind));
        for feature in class.features {
            let shape = parse_wkt(&feature.wkt).map_err(|e| {
                CliError::Input(format!("{} row {}: {e}", class.name, feature.id))
            })?;
            source.insert(index, feature.id, shape, feature.attributes)?;
        }
        names.push(class.name);
    }
    tracing::info!(classes = names.len(), path = %path.display(), "dataset loaded");
    Ok(LoadedDataset { source, names })
}

/// Class roles by class name.
#[derive(Debug, Deserialize)]
pub struct ClassRoles {
    pub features1: Vec<String>,
    pub border1: String,
    pub features2: Vec<String>,
    pub border2: String,
    #[serde(default)]
    pub bounding1: Vec<String>,
    #[serde(default)]
    pub bounding2: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckDefinition {
    pub check: CheckKind,
    pub tile_size: Option<f64>,
    pub classes: ClassRoles,
    #[serde(default)]
    pub config: EdgeMatchConfig,
    /// XY tolerance by class name.
    #[serde(default)]
    pub xy_tolerance: BTreeMap<String, f64>,
}

impl CheckDefinition {
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = read_file(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Resolve class names against a dataset.
    pub fn resolve(
        &self,
        dataset: &LoadedDataset,
    ) -> CliResult<(EdgeMatchLayout, EdgeMatchConfig)> {
        let roles = &self.classes;
        let layout = EdgeMatchLayout {
            classes1: dataset.class_indexes(&roles.features1)?,
            border1: dataset.class_index(&roles.border1)?,
            classes2: dataset.class_indexes(&roles.features2)?,
            border2: dataset.class_index(&roles.border2)?,
            bounding1: dataset.class_indexes(&roles.bounding1)?,
            bounding2: dataset.class_indexes(&roles.bounding2)?,
        };

        let mut config = self.config.clone();
        for (name, tolerance) in &self.xy_tolerance {
            config = config.with_xy_tolerance(dataset.class_index(name)?, *tolerance);
        }
        Ok((layout, config))
    }
}

/// Parse `xmin,ymin,xmax,ymax`.
pub fn parse_extent(text: &str) -> CliResult<Envelope> {
    let values = text
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| CliError::Usage(format!("invalid extent '{text}': {e}")))?;
    match values[..] {
        [xmin, ymin, xmax, ymax] if xmin <= xmax && ymin <= ymax => {
            Ok(Envelope::new(xmin, ymin, xmax, ymax))
        }
        _ => Err(CliError::Usage(format!(
            "invalid extent '{text}': expected xmin,ymin,xmax,ymax"
        ))),
    }
}

fn read_file(path: &Path) -> CliResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| CliError::Input(format!("failed to read {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extent() {
        let extent = parse_extent("0, 1,10,11").unwrap();
        assert_eq!(extent, Envelope::new(0.0, 1.0, 10.0, 11.0));
        assert!(parse_extent("0,1,10").is_err());
        assert!(parse_extent("10,0,0,10").is_err());
        assert!(parse_extent("a,b,c,d").is_err());
    }

    #[test]
    fn test_check_definition() {
        let definition: CheckDefinition = toml::from_str(
            r#"
            check = "bordering-lines"
            tile_size = 50.0

            [classes]
            features1 = ["roads_a"]
            border1 = "border_a"
            features2 = ["roads_b"]
            border2 = "border_b"

            [config]
            search_distance = 2.5
            attribute_constraint = "LINE1.STATE = LINE2.STATE"
            allow_non_coincident_end_points_on_border = true
            "#,
        )
        .unwrap();
        assert_eq!(definition.check, CheckKind::BorderingLines);
        assert_eq!(definition.tile_size, Some(50.0));
        assert_eq!(definition.config.search_distance, 2.5);
        assert!(definition.config.allow_non_coincident_end_points_on_border);
        assert!(definition.classes.bounding1.is_empty());
    }
}
