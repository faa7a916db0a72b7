use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::entity::CityEntity;

/// One contiguous run of same-category entities in the ordered roster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictRun {
    pub category: String,
    pub total_primary: f64,
    /// Index of the first entity of this district in the ordered sequence.
    pub start: usize,
    pub len: usize,
    /// Blocks this district occupies. Filled in by the generator.
    pub blocks: usize,
}

/// Roster reordered so that the heaviest category sits at the spiral centre.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistrictOrder {
    pub entities: Vec<CityEntity>,
    pub districts: Vec<DistrictRun>,
}

impl DistrictOrder {
    /// District index for the entity at `position` in [`Self::entities`].
    pub fn district_of(&self, position: usize) -> Option<usize> {
        self.districts
            .iter()
            .position(|d| position >= d.start && position < d.start + d.len)
    }
}

pub(crate) fn by_primary_desc(a: &CityEntity, b: &CityEntity) -> Ordering {
    b.metrics
        .primary
        .total_cmp(&a.metrics.primary)
        .then_with(|| a.identity.cmp(&b.identity))
}

/// Bucket by category, order categories by summed primary metric (descending),
/// and order each category's entities by primary metric (descending).
///
/// Ties break on name so the output never depends on input order.
pub fn group_by_district(entities: &[CityEntity]) -> DistrictOrder {
    let mut buckets: HashMap<&str, Vec<&CityEntity>> = HashMap::new();
    for entity in entities {
        buckets.entry(entity.category.as_str()).or_default().push(entity);
    }

    let mut groups: Vec<(&str, f64, Vec<&CityEntity>)> = buckets
        .into_iter()
        .map(|(category, members)| {
            let total: f64 = members.iter().map(|e| e.metrics.primary).sum();
            (category, total, members)
        })
        .collect();
    groups.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut order = DistrictOrder {
        entities: Vec::with_capacity(entities.len()),
        districts: Vec::with_capacity(groups.len()),
    };
    for (category, total, mut members) in groups {
        members.sort_by(|a, b| by_primary_desc(a, b));
        order.districts.push(DistrictRun {
            category: category.to_string(),
            total_primary: total,
            start: order.entities.len(),
            len: members.len(),
            blocks: 0,
        });
        order.entities.extend(members.into_iter().cloned());
    }
    order
}
