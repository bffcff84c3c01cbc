//! Attendance aggregates computed over a set of punches.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use utoipa::ToSchema;

use crate::model::punch::{Punch, PunchType};
use crate::model::store::Store;

pub const DEFAULT_RANKING_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "storeId": "store-1",
    "storeName": "Tienda Centro",
    "totalPunches": 12,
    "uniqueEmployees": 4,
    "punchesIn": 4,
    "punchesOut": 3
}))]
pub struct StoreStats {
    pub store_id: String,
    pub store_name: String,
    pub total_punches: usize,
    pub unique_employees: usize,
    pub punches_in: usize,
    pub punches_out: usize,
}

impl StoreStats {
    fn empty(store: &Store) -> Self {
        Self {
            store_id: store.id.clone(),
            store_name: store.name.clone(),
            total_punches: 0,
            unique_employees: 0,
            punches_in: 0,
            punches_out: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BathroomTally {
    pub employee_id: String,
    /// Store of the first counted punch
    pub store_id: String,
    pub count: usize,
}

/// One entry per store, in store order, including stores without punches.
/// Punches of unknown stores are ignored.
pub fn store_stats(stores: &[Store], punches: &[Punch]) -> Vec<StoreStats> {
    let mut by_store: HashMap<&str, (StoreStats, HashSet<&str>)> = stores
        .iter()
        .map(|s| (s.id.as_str(), (StoreStats::empty(s), HashSet::new())))
        .collect();

    for punch in punches {
        let Some((stats, employees)) = by_store.get_mut(punch.store_id.as_str()) else {
            continue;
        };
        stats.total_punches += 1;
        employees.insert(punch.employee_id.as_str());
        match punch.kind {
            PunchType::In => stats.punches_in += 1,
            PunchType::Out => stats.punches_out += 1,
            _ => {}
        }
    }

    stores
        .iter()
        .filter_map(|s| by_store.remove(s.id.as_str()))
        .map(|(mut stats, employees)| {
            stats.unique_employees = employees.len();
            stats
        })
        .collect()
}

/// Employees ranked by number of `bathroom-out` punches, highest first.
/// Ties keep the order in which employees were first seen.
pub fn rank_bathroom_breaks(punches: &[Punch], limit: usize) -> Vec<BathroomTally> {
    let mut tallies: Vec<BathroomTally> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for punch in punches.iter().filter(|p| p.kind == PunchType::BathroomOut) {
        match index.get(punch.employee_id.as_str()) {
            Some(&i) => tallies[i].count += 1,
            None => {
                index.insert(punch.employee_id.as_str(), tallies.len());
                tallies.push(BathroomTally {
                    employee_id: punch.employee_id.clone(),
                    store_id: punch.store_id.clone(),
                    count: 1,
                });
            }
        }
    }

    // sort_by is stable
    tallies.sort_by(|a, b| b.count.cmp(&a.count));
    tallies.truncate(limit);
    tallies
}
