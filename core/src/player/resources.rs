//! Widget bookkeeping for a run
//!
//! Every widget a fragment creates is owned by the run and released at the
//! start of the next run (or after each step with `step_cleanup`). Retained
//! widgets survive that and are only released when the run ends.

use std::collections::BTreeSet;

use crate::host::Host;
use crate::widgets::WidgetId;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResourceTracker {
    owned: BTreeSet<WidgetId>,
    retained: BTreeSet<WidgetId>,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, id: WidgetId) {
        if !self.retained.contains(&id) {
            self.owned.insert(id);
        }
    }

    /// Move `id` from owned to retained
    pub fn retain(&mut self, id: WidgetId) {
        self.owned.remove(&id);
        self.retained.insert(id);
    }

    pub fn is_retained(&self, id: WidgetId) -> bool {
        self.retained.contains(&id)
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.owned.contains(&id) || self.retained.contains(&id)
    }

    pub fn owned(&self) -> impl Iterator<Item = WidgetId> + '_ {
        self.owned.iter().copied()
    }

    pub fn retained(&self) -> impl Iterator<Item = WidgetId> + '_ {
        self.retained.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.owned.is_empty() && self.retained.is_empty()
    }

    /// Release every non-retained widget; returns how many were released
    pub fn release_owned(&mut self, host: &mut dyn Host) -> usize {
        let owned = std::mem::take(&mut self.owned);
        for id in &owned {
            host.release_widget(*id);
        }
        owned.len()
    }

    pub fn release_retained(&mut self, host: &mut dyn Host) -> usize {
        let retained = std::mem::take(&mut self.retained);
        for id in &retained {
            host.release_widget(*id);
        }
        retained.len()
    }

    pub fn release_all(&mut self, host: &mut dyn Host) -> usize {
        self.release_retained(host) + self.release_owned(host)
    }

    /// Release one widget wherever it is tracked; untracked ids are
    /// released anyway
    pub fn release_one(&mut self, host: &mut dyn Host, id: WidgetId) {
        self.owned.remove(&id);
        self.retained.remove(&id);
        host.release_widget(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HeadlessHost, HostEvent};
    use crate::outline::Outline;
    use crate::widgets::{WidgetOptions, WidgetSpec};

    fn released(host: &HeadlessHost) -> Vec<WidgetId> {
        host.events()
            .iter()
            .filter_map(|e| match e {
                HostEvent::WidgetReleased { id } => Some(*id),
                _ => None,
            })
            .collect()
    }

    fn widgets(host: &mut HeadlessHost, n: usize) -> Vec<WidgetId> {
        let spec = WidgetSpec::label("w", WidgetOptions::default());
        (0..n).map(|_| host.create_widget(&spec).unwrap()).collect()
    }

    #[test]
    fn test_retain_moves_out_of_owned() {
        let mut host = HeadlessHost::new(Outline::new());
        let ids = widgets(&mut host, 2);
        let mut tracker = ResourceTracker::new();
        ids.iter().for_each(|id| tracker.track(*id));

        tracker.retain(ids[0]);
        tracker.retain(ids[0]);
        assert_eq!(tracker.retained().collect::<Vec<_>>(), vec![ids[0]]);
        assert_eq!(tracker.owned().collect::<Vec<_>>(), vec![ids[1]]);

        // Tracking again doesn't pull it back into owned
        tracker.track(ids[0]);
        assert!(tracker.is_retained(ids[0]));
        assert_eq!(tracker.owned().count(), 1);
    }

    #[test]
    fn test_release_owned_keeps_retained() {
        let mut host = HeadlessHost::new(Outline::new());
        let ids = widgets(&mut host, 3);
        let mut tracker = ResourceTracker::new();
        ids.iter().for_each(|id| tracker.track(*id));
        tracker.retain(ids[1]);

        assert_eq!(tracker.release_owned(&mut host), 2);
        assert_eq!(released(&host), vec![ids[0], ids[2]]);
        assert!(host.is_live(ids[1]));
        assert!(tracker.contains(ids[1]));
    }

    #[test]
    fn test_release_all_releases_each_once() {
        let mut host = HeadlessHost::new(Outline::new());
        let ids = widgets(&mut host, 2);
        let mut tracker = ResourceTracker::new();
        ids.iter().for_each(|id| tracker.track(*id));
        tracker.retain(ids[0]);

        assert_eq!(tracker.release_all(&mut host), 2);
        assert_eq!(tracker.release_all(&mut host), 0);
        assert!(tracker.is_empty());

        let mut all = released(&host);
        all.sort();
        assert_eq!(all, ids);
    }

    #[test]
    fn test_release_one() {
        let mut host = HeadlessHost::new(Outline::new());
        let ids = widgets(&mut host, 2);
        let mut tracker = ResourceTracker::new();
        tracker.track(ids[0]);
        tracker.retain(ids[1]);

        tracker.release_one(&mut host, ids[1]);
        tracker.release_one(&mut host, ids[1]);
        assert!(!tracker.contains(ids[1]));
        assert_eq!(released(&host), vec![ids[1]]);
        assert!(tracker.contains(ids[0]));
    }
}
