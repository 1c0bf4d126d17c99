//! Feature data source contract and an in-memory implementation.

use crate::error::{EdgeMatchError, Result};
use crate::feature::{Feature, FeatureKey, Value};
use crate::geometry::{Envelope, GeometryKind};
use geo_types::Geometry;
use std::sync::Arc;

/// Row filter pushed down into a search.
pub type RowFilter<'a> = &'a dyn Fn(&Feature) -> bool;

/// Description of one feature class.
#[derive(Debug, Clone)]
pub struct ClassSchema {
    pub name: String,
    pub kind: GeometryKind,
}

impl ClassSchema {
    pub fn new(name: impl Into<String>, kind: GeometryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Spatial range queries over indexed feature classes.
pub trait FeatureSource {
    /// Number of classes. Class indexes are `0..class_count()`.
    fn class_count(&self) -> usize;

    /// Schema of a class.
    fn schema(&self, class_index: usize) -> Result<&ClassSchema>;

    /// Features of a class whose envelope intersects `envelope`, passing
    /// `filter`, ordered by row id.
    fn search(
        &self,
        class_index: usize,
        envelope: &Envelope,
        filter: Option<RowFilter<'_>>,
    ) -> Result<Vec<Arc<Feature>>>;
}

#[derive(Debug)]
struct MemoryClass {
    schema: ClassSchema,
    features: Vec<Arc<Feature>>,
}

/// Feature classes held in memory; searches scan by envelope.
#[derive(Debug, Default)]
pub struct MemorySource {
    classes: Vec<MemoryClass>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty class and return its index.
    pub fn add_class(&mut self, schema: ClassSchema) -> usize {
        self.classes.push(MemoryClass {
            schema,
            features: Vec::new(),
        });
        self.classes.len() - 1
    }

    /// Add a feature with the given row id and shape.
    ///
    /// Fails if the shape does not match the class geometry kind or the row
    /// id is taken.
    pub fn insert(
        &mut self,
        class_index: usize,
        row_id: u64,
        shape: Geometry<f64>,
        attributes: impl IntoIterator<Item = (String, Value)>,
    ) -> Result<FeatureKey> {
        let class = self
            .classes
            .get_mut(class_index)
            .ok_or(EdgeMatchError::UnknownClass(class_index))?;

        if GeometryKind::from_geometry(&shape) != Some(class.schema.kind) {
            return Err(EdgeMatchError::InvalidGeometry(format!(
                "row {row_id} of class '{}' is not a {:?} shape",
                class.schema.name, class.schema.kind
            )));
        }

        let pos = match class
            .features
            .binary_search_by_key(&row_id, |f| f.key.row_id)
        {
            Ok(_) => {
                return Err(EdgeMatchError::Source(format!(
                    "duplicate row id {row_id} in class '{}'",
                    class.schema.name
                )))
            }
            Err(pos) => pos,
        };

        let key = FeatureKey::new(class_index, row_id);
        let mut feature = Feature::new(key, shape);
        for (field, value) in attributes {
            feature.set_attribute(&field, value);
        }
        class.features.insert(pos, Arc::new(feature));
        Ok(key)
    }

    /// Envelope of all features. `None` when the source is empty.
    pub fn extent(&self) -> Option<Envelope> {
        self.classes
            .iter()
            .flat_map(|c| c.features.iter())
            .filter_map(|f| f.envelope())
            .reduce(|a, b| a.union(&b))
    }

    fn class(&self, class_index: usize) -> Result<&MemoryClass> {
        self.classes
            .get(class_index)
            .ok_or(EdgeMatchError::UnknownClass(class_index))
    }
}

impl FeatureSource for MemorySource {
    fn class_count(&self) -> usize {
        self.classes.len()
    }

    fn schema(&self, class_index: usize) -> Result<&ClassSchema> {
        Ok(&self.class(class_index)?.schema)
    }

    fn search(
        &self,
        class_index: usize,
        envelope: &Envelope,
        filter: Option<RowFilter<'_>>,
    ) -> Result<Vec<Arc<Feature>>> {
        let class = self.class(class_index)?;
        Ok(class
            .features
            .iter()
            .filter(|f| f.envelope().is_some_and(|e| e.intersects(envelope)))
            .filter(|f| filter.is_none_or(|accept| accept(f)))
            .cloned()
            .collect())
    }
}
