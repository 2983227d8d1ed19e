use indexmap::IndexMap;
use plano_ids::NodeId;

/// Per-evaluation partitioning of the current collision set.
///
/// After `perform_collision_analysis` completes, every collided node is
/// in exactly one partition. The set is reused by position search and
/// auto-placement within the same pass.
#[derive(Clone, Debug, Default)]
pub struct MatchSet {
    /// Ordinary-node matches, bucketed by the classification tag that
    /// claimed them (first matching descriptor tag wins)
    pub objects: IndexMap<String, Vec<NodeId>>,
    pub floors: Vec<NodeId>,
    pub walls: Vec<NodeId>,
    pub model_zones: Vec<NodeId>,
    pub zones: Vec<NodeId>,
    /// Overlaps matching the candidate's replace classification; they
    /// are superseded by the candidate, not rejected
    pub replace: Vec<NodeId>,
    /// Unexplained overlaps
    pub illegal: Vec<NodeId>,
}

impl MatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.objects.clear();
        self.floors.clear();
        self.walls.clear();
        self.model_zones.clear();
        self.zones.clear();
        self.replace.clear();
        self.illegal.clear();
    }

    pub fn add_object(&mut self, tag: &str, id: NodeId) {
        self.objects.entry(tag.to_string()).or_default().push(id);
    }

    /// Count of ordinary matches claimed by `tag`.
    pub fn object_count(&self, tag: &str) -> usize {
        self.objects.get(tag).map_or(0, Vec::len)
    }

    /// Everything that was explained by some partition (not illegal,
    /// not replace).
    pub fn classified_count(&self) -> usize {
        self.objects.values().map(Vec::len).sum::<usize>()
            + self.floors.len()
            + self.walls.len()
            + self.model_zones.len()
            + self.zones.len()
    }

    pub fn classified_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.objects
            .values()
            .flatten()
            .chain(self.floors.iter())
            .chain(self.walls.iter())
            .chain(self.model_zones.iter())
            .chain(self.zones.iter())
            .copied()
    }

    /// Total overlaps outside the replace partition. Zero means a
    /// `Relationship::None` descriptor is satisfied.
    pub fn non_replace_count(&self) -> usize {
        self.classified_count() + self.illegal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.non_replace_count() == 0 && self.replace.is_empty()
    }
}
