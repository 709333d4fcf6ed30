use crate::model::Marker;

/// A record that can be clustered by position.
pub trait Positioned {
    fn record_id(&self) -> i64;
    fn position(&self) -> f64;
}

impl Positioned for Marker {
    fn record_id(&self) -> i64 {
        self.id
    }

    fn position(&self) -> f64 {
        self.seconds
    }
}

/// Cluster records whose positions lie within `tolerance` of a cluster anchor.
///
/// 1. Sort ascending by position
/// 2. Each record not yet assigned becomes an anchor and absorbs the following
///    records while they stay within `tolerance` of the anchor itself (not of
///    the previous member), stopping at the first one that doesn't
/// 3. Drop single-member clusters and order each cluster by ascending id
///
/// The early stop relies on the sort order and on always measuring against the
/// anchor; a rolling window would produce different clusters.
pub fn group_by_proximity<T>(records: &[T], tolerance: f64) -> Vec<Vec<T>>
where
    T: Positioned + Clone,
{
    let tolerance = if tolerance.is_finite() {
        tolerance.max(0.0)
    } else {
        0.0
    };

    let mut sorted: Vec<&T> = records.iter().collect();
    sorted.sort_by(|a, b| a.position().total_cmp(&b.position()));

    let mut clusters = Vec::new();
    let mut start = 0;

    while start < sorted.len() {
        let anchor = sorted[start].position();
        let mut end = start + 1;
        while end < sorted.len() && (sorted[end].position() - anchor).abs() <= tolerance {
            end += 1;
        }

        if end - start > 1 {
            let mut cluster: Vec<T> = sorted[start..end].iter().map(|r| (*r).clone()).collect();
            cluster.sort_by_key(|r| r.record_id());
            clusters.push(cluster);
        }

        start = end;
    }

    clusters
}
