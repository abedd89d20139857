//! The subsetting entry point: candidate tables in, tiered metadata out.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
  metadata::{MetadataAssembler, SubsetResult},
  schema::Candidate,
  store::SchemaGraphStore,
};

/// Group candidates by database into sets of qualified table names.
/// Duplicates collapse; ranking order does not affect the result.
pub fn group_candidates(candidates: &[Candidate]) -> BTreeMap<String, BTreeSet<String>> {
  let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
  for candidate in candidates {
    groups
      .entry(candidate.db_id.clone())
      .or_default()
      .insert(candidate.qualified());
  }
  groups
}

/// Compute the connecting subgraph and tiered metadata for every database
/// named in `candidates`.
///
/// Databases are processed one after another. Any store failure aborts the
/// whole call; missing databases or tables only produce empty entries.
pub async fn run<S: SchemaGraphStore>(
  store: &S,
  candidates: &[Candidate],
) -> Result<SubsetResult, S::Error> {
  let assembler = MetadataAssembler::new(store);
  let mut result = SubsetResult::new();

  for (db_id, tables) in group_candidates(candidates) {
    tracing::debug!(db_id, tables = tables.len(), "subsetting database");
    let metadata = assembler.assemble(&db_id, &tables).await?;
    result.insert(db_id, metadata);
  }

  Ok(result)
}
