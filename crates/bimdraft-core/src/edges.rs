use std::collections::HashSet;

/// Undirected edge key, stored with the smaller vertex index first.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct EdgeKey {
    pub lo: usize,
    pub hi: usize,
}

impl EdgeKey {
    /// `None` for a degenerate edge (`a == b`).
    pub fn new(a: usize, b: usize) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { lo: a, hi: b }),
            std::cmp::Ordering::Greater => Some(Self { lo: b, hi: a }),
            std::cmp::Ordering::Equal => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueEdge {
    pub key: EdgeKey,
    /// Position (in the caller's face sequence) of the face that first produced this edge.
    pub first_face: usize,
}

#[derive(Debug, Clone, Default)]
pub struct EdgeSet {
    pub edges: Vec<UniqueEdge>,
    pub duplicates: usize,
}

/// Collects the undirected edges of `faces`, keeping only the first
/// occurrence of each. Output order follows face order, then the face's own
/// vertex order, so the result is deterministic.
pub fn unique_edges<'f, I>(faces: I) -> EdgeSet
where
    I: IntoIterator<Item = &'f [usize]>,
{
    let mut seen = HashSet::new();
    let mut set = EdgeSet::default();

    for (face_pos, face) in faces.into_iter().enumerate() {
        let n = face.len();
        if n < 2 {
            continue;
        }
        for k in 0..n {
            let Some(key) = EdgeKey::new(face[k], face[(k + 1) % n]) else {
                continue;
            };
            if seen.insert(key) {
                set.edges.push(UniqueEdge {
                    key,
                    first_face: face_pos,
                });
            } else {
                set.duplicates += 1;
            }
        }
    }

    set
}
