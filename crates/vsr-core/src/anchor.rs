//! Anchor/link protocol over the [`BodyRegistry`].
//!
//! Links are stored on both anchors: if `a` holds `a -> b`, then `b` holds
//! `b -> a`. Every mutation here keeps that pair symmetric, and an anchor never
//! holds two links to the same destination.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Anchor, AnchorId, BodyId, BodyRegistry, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LinkType {
    Rigid,
    Soft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Link {
    pub source: AnchorId,
    pub destination: AnchorId,
    pub link_type: LinkType,
}

impl Link {
    pub fn new(source: AnchorId, destination: AnchorId, link_type: LinkType) -> Self {
        Self {
            source,
            destination,
            link_type,
        }
    }

    pub fn reversed(self) -> Link {
        Link::new(self.destination, self.source, self.link_type)
    }
}

impl BodyRegistry {
    pub fn anchor(&self, id: AnchorId) -> Option<&Anchor> {
        self.get(id.body)?.anchors.get(id.index as usize)
    }

    fn anchor_mut(&mut self, id: AnchorId) -> Option<&mut Anchor> {
        self.get_mut(id.body)?.anchors.get_mut(id.index as usize)
    }

    pub fn anchor_point(&self, id: AnchorId) -> Option<Point> {
        self.get(id.body)?.poly.vertices.get(id.index as usize).copied()
    }

    pub fn anchor_ids(&self, body: BodyId) -> Vec<AnchorId> {
        self.get(body)
            .map(|b| b.anchor_ids().collect())
            .unwrap_or_default()
    }

    pub fn is_anchored_to(&self, source: AnchorId, destination: AnchorId) -> bool {
        self.anchor(source)
            .map(|a| a.links.iter().any(|l| l.destination == destination))
            .unwrap_or(false)
    }

    pub fn is_anchored_to_body(&self, source: AnchorId, body: BodyId) -> bool {
        self.anchor(source)
            .map(|a| a.links.iter().any(|l| l.destination.body == body))
            .unwrap_or(false)
    }

    /// Bodies `source` is linked to, in link order, without duplicates.
    pub fn attached_bodies(&self, source: AnchorId) -> Vec<BodyId> {
        let mut out: Vec<BodyId> = Vec::new();
        if let Some(anchor) = self.anchor(source) {
            for link in &anchor.links {
                if !out.contains(&link.destination.body) {
                    out.push(link.destination.body);
                }
            }
        }
        out
    }

    /// Create the symmetric pair `source <-> destination`.
    ///
    /// Returns `None` when either anchor does not exist, when both are the same
    /// anchor, or when they are already linked.
    pub fn link(
        &mut self,
        source: AnchorId,
        destination: AnchorId,
        link_type: LinkType,
    ) -> Option<Link> {
        if source == destination
            || self.anchor(source).is_none()
            || self.anchor(destination).is_none()
            || self.is_anchored_to(source, destination)
        {
            return None;
        }
        let link = Link::new(source, destination, link_type);
        self.anchor_mut(source)?.links.push(link);
        self.anchor_mut(destination)?.links.push(link.reversed());
        Some(link)
    }

    /// Remove the symmetric pair `source <-> destination`, if present.
    pub fn unlink(&mut self, source: AnchorId, destination: AnchorId) -> Option<Link> {
        let src = self.anchor_mut(source)?;
        let pos = src.links.iter().position(|l| l.destination == destination)?;
        let link = src.links.remove(pos);
        if let Some(dst) = self.anchor_mut(destination) {
            dst.links.retain(|l| l.destination != source);
        }
        Some(link)
    }

    /// Every link once, seen from the lower-ordered anchor.
    pub fn links(&self) -> Vec<Link> {
        self.iter()
            .flat_map(|b| b.anchors.iter())
            .flat_map(|a| a.links.iter().copied())
            .filter(|l| l.source < l.destination)
            .collect()
    }

    /// The anchor of `target` nearest to `source` that `source` is not
    /// already linked to. Ties go to the lowest anchor index.
    pub fn nearest_eligible_anchor(&self, source: AnchorId, target: BodyId) -> Option<AnchorId> {
        let origin = self.anchor_point(source)?;
        let body = self.get(target)?;
        body.anchor_ids()
            .filter(|dst| *dst != source && !self.is_anchored_to(source, *dst))
            .filter_map(|dst| self.anchor_point(dst).map(|p| (dst, p.distance(origin))))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(dst, _)| dst)
    }

    /// Greedy nearest-neighbour matching without replacement.
    ///
    /// Sources are visited in the given order. Each takes the still-unmatched
    /// anchor of `target` closest to it. The result depends only on that order
    /// and on geometry.
    pub fn match_nearest(&self, sources: &[AnchorId], target: BodyId) -> Vec<(AnchorId, AnchorId)> {
        let mut pool: Vec<(AnchorId, Point)> = self
            .anchor_ids(target)
            .into_iter()
            .filter_map(|a| self.anchor_point(a).map(|p| (a, p)))
            .collect();
        let mut pairs = Vec::with_capacity(sources.len().min(pool.len()));
        for &src in sources {
            let Some(origin) = self.anchor_point(src) else {
                continue;
            };
            let best = pool
                .iter()
                .enumerate()
                .filter(|(_, (dst, _))| *dst != src)
                .min_by(|a, b| a.1 .1.distance(origin).total_cmp(&b.1 .1.distance(origin)))
                .map(|(i, _)| i);
            if let Some(i) = best {
                let (dst, _) = pool.remove(i);
                pairs.push((src, dst));
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Body, Poly};

    fn two_squares() -> (BodyRegistry, BodyId, BodyId) {
        let mut registry = BodyRegistry::new();
        let a = registry.insert(Body::rigid(Poly::square(1.0), 1.0));
        let b = registry.insert(Body::rigid(
            Poly::square(1.0).translated(Point::new(1.5, 0.0)),
            1.0,
        ));
        (registry, a, b)
    }

    #[test]
    fn link_is_symmetric_and_unique() {
        let (mut registry, a, b) = two_squares();
        let src = AnchorId::new(a, 1);
        let dst = AnchorId::new(b, 0);
        assert!(registry.link(src, dst, LinkType::Rigid).is_some());
        assert!(registry.link(src, dst, LinkType::Soft).is_none());
        assert!(registry.link(dst, src, LinkType::Soft).is_none());
        assert!(registry.is_anchored_to(src, dst));
        assert!(registry.is_anchored_to(dst, src));
        assert_eq!(registry.links().len(), 1);

        assert!(registry.unlink(dst, src).is_some());
        assert!(!registry.is_anchored_to(src, dst));
        assert!(!registry.is_anchored_to(dst, src));
        assert!(registry.unlink(src, dst).is_none());
    }

    #[test]
    fn nearest_skips_already_linked() {
        let (mut registry, a, b) = two_squares();
        let src = AnchorId::new(a, 1);
        assert_eq!(registry.nearest_eligible_anchor(src, b), Some(AnchorId::new(b, 0)));
        registry.link(src, AnchorId::new(b, 0), LinkType::Rigid);
        assert_eq!(registry.nearest_eligible_anchor(src, b), Some(AnchorId::new(b, 3)));
    }

    #[test]
    fn matching_is_without_replacement() {
        let (registry, a, b) = two_squares();
        let sources: Vec<AnchorId> = registry.anchor_ids(a);
        let pairs = registry.match_nearest(&sources, b);
        assert_eq!(pairs.len(), 4);
        let mut dsts: Vec<AnchorId> = pairs.iter().map(|p| p.1).collect();
        dsts.sort();
        dsts.dedup();
        assert_eq!(dsts.len(), 4);
        // Source 1 (bottom-right) is visited second but bottom-left of `b` was
        // already taken by source 0.
        assert_eq!(pairs[0], (AnchorId::new(a, 0), AnchorId::new(b, 0)));
        assert_eq!(pairs[1], (AnchorId::new(a, 1), AnchorId::new(b, 3)));
    }
}
