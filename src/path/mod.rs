//! The path graph: append-only arenas of [`Origin`] and [`Segment`] nodes
//! joined by parent/branch edges.
//!
//! Nodes are id-based (newtypes over an index into a `Vec` arena) and
//! addressed by their position in the owning `Path`'s arena; they are never
//! removed, only detached.

mod segment;

#[cfg(test)]
mod tests;

pub use segment::{GridRef, Origin, Segment, SmoothDelta, TraceParams};

/// Identifier for an [`Origin`] within one [`Path`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OriginId(pub usize);

/// Identifier for a [`Segment`] within one [`Path`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(pub usize);

/// A segment's parent is either an [`Origin`] (the segment is a root) or
/// another [`Segment`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParentRef {
    Origin(OriginId),
    Segment(SegmentId),
}

/// Append-only arena of origins and segments with symmetric parent/branch
/// edges.
#[derive(Clone, Default)]
pub struct Path {
    origins: Vec<Origin>,
    segments: Vec<Segment>,
    /// `true` for the shared [`Path::EMPTY`]-style sentinel; mutation
    /// through a sentinel panics.
    sentinel: bool,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// A discarded, read-only sentinel path. Mutating it is a programmer
    /// error.
    pub fn empty_sentinel() -> Self {
        Self {
            origins: Vec::new(),
            segments: Vec::new(),
            sentinel: true,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.sentinel
    }

    fn assert_mutable(&self) {
        if self.sentinel {
            panic!("mutation attempted through Path::empty_sentinel()");
        }
    }

    pub fn add_origin(&mut self, origin: Origin) -> OriginId {
        self.assert_mutable();
        let id = OriginId(self.origins.len());
        self.origins.push(origin);
        id
    }

    pub fn add_segment(&mut self, segment: Segment) -> SegmentId {
        self.assert_mutable();
        let id = SegmentId(self.segments.len());
        self.segments.push(segment);
        id
    }

    pub fn origin(&self, id: OriginId) -> &Origin {
        &self.origins[id.0]
    }

    pub fn origin_mut(&mut self, id: OriginId) -> &mut Origin {
        self.assert_mutable();
        &mut self.origins[id.0]
    }

    pub fn segment(&self, id: SegmentId) -> &Segment {
        &self.segments[id.0]
    }

    pub fn segment_mut(&mut self, id: SegmentId) -> &mut Segment {
        self.assert_mutable();
        &mut self.segments[id.0]
    }

    pub fn origin_ids(&self) -> impl Iterator<Item = OriginId> {
        (0..self.origins.len()).map(OriginId)
    }

    pub fn segment_ids(&self) -> impl Iterator<Item = SegmentId> {
        (0..self.segments.len()).map(SegmentId)
    }

    pub fn origin_count(&self) -> usize {
        self.origins.len()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Attach `child` as a branch of `parent`. No-op if already attached.
    /// Idempotent and order-preserving (an "ordered set": insertion order is
    /// kept, duplicates are rejected).
    pub fn attach(&mut self, parent: ParentRef, child: SegmentId) {
        self.assert_mutable();
        let branches_has_child = match parent {
            ParentRef::Origin(oid) => self.origins[oid.0].branches.contains(&child),
            ParentRef::Segment(sid) => self.segments[sid.0].branches.contains(&child),
        };
        if !branches_has_child {
            match parent {
                ParentRef::Origin(oid) => self.origins[oid.0].branches.push(child),
                ParentRef::Segment(sid) => self.segments[sid.0].branches.push(child),
            }
        }
        let parents_has_parent = self.segments[child.0].parents.contains(&parent);
        if !parents_has_parent {
            self.segments[child.0].parents.push(parent);
        }
    }

    /// Detach `child` from `parent`. No-op if not attached.
    pub fn detach(&mut self, parent: ParentRef, child: SegmentId) {
        self.assert_mutable();
        match parent {
            ParentRef::Origin(oid) => self.origins[oid.0].branches.retain(|&b| b != child),
            ParentRef::Segment(sid) => self.segments[sid.0].branches.retain(|&b| b != child),
        }
        self.segments[child.0].parents.retain(|&p| p != parent);
    }

    /// Detach every branch of `segment` (used by stub/merge recovery).
    pub fn detach_all_branches(&mut self, segment: SegmentId) {
        self.assert_mutable();
        let branches = self.segments[segment.0].branches.clone();
        for b in branches {
            self.detach(ParentRef::Segment(segment), b);
        }
    }

    /// Detach every parent edge of `segment`.
    pub fn detach_all_parents(&mut self, segment: SegmentId) {
        self.assert_mutable();
        let parents = self.segments[segment.0].parents.clone();
        for p in parents {
            self.detach(p, segment);
        }
    }

    /// All segment ids reachable from `start` by following `branches[]`,
    /// including `start` itself.
    pub fn subtree(&self, start: SegmentId) -> Vec<SegmentId> {
        let mut seen = vec![false; self.segments.len()];
        let mut stack = vec![start];
        let mut out = Vec::new();
        while let Some(id) = stack.pop() {
            if seen[id.0] {
                continue;
            }
            seen[id.0] = true;
            out.push(id);
            for &b in self.segments[id.0].branches() {
                if !seen[b.0] {
                    stack.push(b);
                }
            }
        }
        out
    }

    /// Whether `descendant` is reachable from `ancestor` via `branches[]`,
    /// inclusive of `ancestor == descendant`.
    pub fn in_subtree(&self, ancestor: SegmentId, descendant: SegmentId) -> bool {
        if ancestor == descendant {
            return true;
        }
        let mut seen = vec![false; self.segments.len()];
        let mut stack = vec![ancestor];
        while let Some(id) = stack.pop() {
            if seen[id.0] {
                continue;
            }
            seen[id.0] = true;
            for &b in self.segments[id.0].branches() {
                if b == descendant {
                    return true;
                }
                if !seen[b.0] {
                    stack.push(b);
                }
            }
        }
        false
    }

    /// Whether `ancestor` is a (non-strict) ancestor of `descendant` by
    /// walking `parents[]` back from `descendant`.
    pub fn is_ancestor(&self, ancestor: SegmentId, descendant: SegmentId) -> bool {
        if ancestor == descendant {
            return true;
        }
        let mut seen = vec![false; self.segments.len()];
        let mut stack = vec![descendant];
        while let Some(id) = stack.pop() {
            if seen[id.0] {
                continue;
            }
            seen[id.0] = true;
            for &p in self.segments[id.0].parents() {
                if let ParentRef::Segment(sid) = p {
                    if sid == ancestor {
                        return true;
                    }
                    if !seen[sid.0] {
                        stack.push(sid);
                    }
                }
            }
        }
        false
    }

    /// The full connected component of `start` (both directions, across
    /// both origins and segments) as segment ids — used by merge recovery
    /// to detect when two merging branches are interconnected.
    pub fn connected_segments(&self, start: SegmentId) -> Vec<SegmentId> {
        let mut seen = vec![false; self.segments.len()];
        let mut stack = vec![start];
        let mut out = Vec::new();
        while let Some(id) = stack.pop() {
            if seen[id.0] {
                continue;
            }
            seen[id.0] = true;
            out.push(id);
            for &b in self.segments[id.0].branches() {
                if !seen[b.0] {
                    stack.push(b);
                }
            }
            for &p in self.segments[id.0].parents() {
                if let ParentRef::Segment(sid) = p {
                    if !seen[sid.0] {
                        stack.push(sid);
                    }
                }
            }
        }
        out
    }

    /// Asserts the duality invariant `s in p.branches <=> p in s.parents`.
    /// Intended for tests and debug builds.
    pub fn check_edge_duality(&self) -> bool {
        for (oid, origin) in self.origins.iter().enumerate() {
            for &b in &origin.branches {
                if !self.segments[b.0]
                    .parents
                    .contains(&ParentRef::Origin(OriginId(oid)))
                {
                    return false;
                }
            }
        }
        for (sid, seg) in self.segments.iter().enumerate() {
            for &b in &seg.branches {
                if !self.segments[b.0]
                    .parents
                    .contains(&ParentRef::Segment(SegmentId(sid)))
                {
                    return false;
                }
            }
            for &p in &seg.parents {
                let has_child = match p {
                    ParentRef::Origin(oid) => self.origins[oid.0].branches.contains(&SegmentId(sid)),
                    ParentRef::Segment(psid) => {
                        self.segments[psid.0].branches.contains(&SegmentId(sid))
                    }
                };
                if !has_child {
                    return false;
                }
            }
        }
        true
    }
}
